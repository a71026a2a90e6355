use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::finance::{project_cash_flow, CashFlowOptions, CashFlowProjection};
use crate::model::GapAnalysis;
use crate::optimizer::{
    compare_configurations, optimize_with, Constraint, DecisionVector, IdealGoals,
    OptimalConfigurationResult, WhatIfComparison,
};
use crate::params::{OperationalParameters, ParameterField, SimulationParameters};
use crate::simulation::sensitivity::{sensitivity_analysis, SensitivityResult};
use crate::simulation::{simulate, simulate_seeded, SimulationResult};

#[derive(Clone)]
struct ApiState {
    config: Config,
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

/// Fields left out fall back to the server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
struct SimulateRequest {
    operation: Option<OperationalParameters>,
    trials: Option<u32>,
    horizon_months: Option<u32>,
    seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OptimizeRequest {
    initial: Option<DecisionVector>,
    goals: Option<IdealGoals>,
    constraints: Option<Vec<Constraint>>,
    use_solver: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CompareRequest {
    #[serde(default)]
    simulation: SimulateRequest,
    #[serde(default)]
    optimization: OptimizeRequest,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CashFlowRequest {
    operation: Option<OperationalParameters>,
    options: Option<CashFlowOptions>,
}

#[derive(Debug, Clone, Deserialize)]
struct WhatIfRequest {
    before: Option<DecisionVector>,
    after: DecisionVector,
    goals: Option<IdealGoals>,
}

#[derive(Debug, Clone, Deserialize)]
struct SensitivityRequest {
    #[serde(flatten)]
    simulation: SimulateRequest,
    field: String,
    min: f64,
    max: f64,
    #[serde(default = "default_steps")]
    steps: usize,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// `result` is `None` when no configuration satisfies the constraints.
#[derive(Debug, Serialize)]
struct OptimizeResponse {
    feasible: bool,
    result: Option<OptimalConfigurationResult>,
}

pub async fn run_server(config: Config, bind: SocketAddr) -> Result<()> {
    let app = router(ApiState { config });
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("REST API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/v1/config", get(show_config))
        .route("/v1/simulate", post(simulate_handler))
        .route("/v1/optimize", post(optimize_handler))
        .route("/v1/compare", post(compare))
        .route("/v1/cashflow", post(cashflow))
        .route("/v1/whatif", post(whatif))
        .route("/v1/sensitivity", post(sensitivity))
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn show_config(State(state): State<ApiState>) -> Json<ApiResponse<Config>> {
    ok(state.config)
}

async fn simulate_handler(
    State(state): State<ApiState>,
    Json(request): Json<SimulateRequest>,
) -> ApiResult<SimulationResult> {
    let (operation, parameters, seed) = resolve_simulation(&state, request)?;
    let result = blocking(move || run_simulation(&operation, &parameters, seed)).await?;
    Ok(ok(result))
}

async fn optimize_handler(
    State(state): State<ApiState>,
    Json(request): Json<OptimizeRequest>,
) -> ApiResult<OptimizeResponse> {
    let result = run_optimization(&state, request).await?;
    Ok(ok(OptimizeResponse {
        feasible: result.is_some(),
        result,
    }))
}

async fn compare(
    State(state): State<ApiState>,
    Json(request): Json<CompareRequest>,
) -> ApiResult<GapAnalysis> {
    let (operation, parameters, seed) = resolve_simulation(&state, request.simulation)?;
    let simulation = blocking(move || run_simulation(&operation, &parameters, seed)).await?;
    let optimal = run_optimization(&state, request.optimization).await?;
    if optimal.is_none() {
        warn!("no feasible ideal configuration, gap matrix is empty");
    }
    Ok(ok(GapAnalysis::from_results(
        Some(&simulation),
        optimal.as_ref(),
    )))
}

async fn cashflow(
    State(state): State<ApiState>,
    Json(request): Json<CashFlowRequest>,
) -> ApiResult<CashFlowProjection> {
    let operation = request
        .operation
        .unwrap_or_else(|| state.config.operation.clone());
    let options = request.options.unwrap_or(state.config.finance);
    Ok(ok(project_cash_flow(&operation, &options)))
}

async fn whatif(
    State(state): State<ApiState>,
    Json(request): Json<WhatIfRequest>,
) -> ApiResult<WhatIfComparison> {
    let before = request.before.unwrap_or(state.config.optimizer.initial);
    if !before.is_finite() || !request.after.is_finite() {
        return Err(ApiError::bad_request("decision vectors must be finite"));
    }
    let goals = request.goals.unwrap_or_else(|| state.config.goals.clone());
    Ok(ok(compare_configurations(&before, &request.after, &goals)))
}

async fn sensitivity(
    State(state): State<ApiState>,
    Json(request): Json<SensitivityRequest>,
) -> ApiResult<SensitivityResult> {
    let field = ParameterField::from_str(&request.field)
        .map_err(|error| ApiError::bad_request(error.to_string()))?;
    if !(request.min.is_finite() && request.max.is_finite()) {
        return Err(ApiError::bad_request("sensitivity range must be finite"));
    }
    let steps = request.steps.clamp(1, MAX_SENSITIVITY_STEPS);
    let range = (request.min, request.max);
    let (operation, parameters, seed) = resolve_simulation(&state, request.simulation)?;
    let result = blocking(move || match seed {
        Some(seed) => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            sensitivity_analysis(&operation, &parameters, field, range, steps, &mut rng)
        }
        None => sensitivity_analysis(
            &operation,
            &parameters,
            field,
            range,
            steps,
            &mut rand::thread_rng(),
        ),
    })
    .await?;
    Ok(ok(result))
}

const MAX_SENSITIVITY_STEPS: usize = 200;

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}

fn default_steps() -> usize {
    10
}

async fn blocking<T, F>(work: F) -> std::result::Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(ApiError::internal)
}

fn resolve_simulation(
    state: &ApiState,
    request: SimulateRequest,
) -> std::result::Result<(OperationalParameters, SimulationParameters, Option<u64>), ApiError> {
    let operation = request
        .operation
        .unwrap_or_else(|| state.config.operation.clone());
    let parameters = SimulationParameters::new(
        request.trials.unwrap_or(state.config.simulation.trials),
        request
            .horizon_months
            .unwrap_or(state.config.simulation.horizon_months),
    )
    .map_err(|error| ApiError::bad_request(error.to_string()))?;
    let seed = request.seed.or(state.config.simulation.seed);
    Ok((operation, parameters, seed))
}

fn run_simulation(
    operation: &OperationalParameters,
    parameters: &SimulationParameters,
    seed: Option<u64>,
) -> SimulationResult {
    match seed {
        Some(seed) => simulate_seeded(operation, parameters, seed),
        None => simulate(operation, parameters, &mut rand::thread_rng()),
    }
}

async fn run_optimization(
    state: &ApiState,
    request: OptimizeRequest,
) -> std::result::Result<Option<OptimalConfigurationResult>, ApiError> {
    let mut normative = state.config.normative();
    if let Some(initial) = request.initial {
        normative.initial = initial;
    }
    if let Some(goals) = request.goals {
        normative.goals = goals;
    }
    if let Some(constraints) = request.constraints {
        normative.constraints = constraints;
    }
    if let Some(use_solver) = request.use_solver {
        normative.use_solver = use_solver;
    }
    blocking(move || {
        optimize_with(
            &normative.initial,
            &normative.goals,
            &normative.constraints,
            normative.use_solver,
            &normative.solver,
        )
    })
    .await
}
