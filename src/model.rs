//! Stateful wrappers over the engine calls.
//!
//! Each model moves through `Unconfigured -> Configured -> Computed`; results
//! are only reachable in the computed state and any parameter change drops
//! them. A model owns its state exclusively and is not meant to be shared
//! across threads without external synchronization.

use std::mem;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::gaps::{build_recommendations, compare_models, GapMatrix, Recommendation};
use crate::optimizer::{
    optimize_with, Constraint, DecisionVector, IdealGoals, OptimalConfigurationResult,
    SolverOptions,
};
use crate::params::{OperationalParameters, ParameterField, ServiceType, SimulationParameters};
use crate::simulation::{simulate, simulate_seeded, SimulationResult};

#[derive(Debug, Clone, PartialEq)]
pub enum ModelState<C, R> {
    Unconfigured,
    Configured(C),
    Computed { config: C, results: R },
}

impl<C, R> Default for ModelState<C, R> {
    fn default() -> Self {
        Self::Unconfigured
    }
}

impl<C, R> ModelState<C, R> {
    pub fn config(&self) -> Option<&C> {
        match self {
            Self::Unconfigured => None,
            Self::Configured(config) | Self::Computed { config, .. } => Some(config),
        }
    }

    pub fn results(&self) -> Option<&R> {
        match self {
            Self::Computed { results, .. } => Some(results),
            _ => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed { .. })
    }

    /// Drops any results, keeping the configuration.
    fn into_config(self) -> Option<C> {
        match self {
            Self::Unconfigured => None,
            Self::Configured(config) | Self::Computed { config, .. } => Some(config),
        }
    }

    fn take(&mut self) -> Self {
        mem::replace(self, Self::Unconfigured)
    }

    fn edit(&mut self, f: impl FnOnce(&mut C)) -> bool {
        match self.take().into_config() {
            Some(mut config) => {
                f(&mut config);
                *self = Self::Configured(config);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmpiricalConfig {
    pub operation: OperationalParameters,
    pub simulation: SimulationParameters,
}

/// Monte Carlo model of real-world operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmpiricalModel {
    state: ModelState<EmpiricalConfig, SimulationResult>,
}

impl EmpiricalModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configured(operation: OperationalParameters, simulation: SimulationParameters) -> Self {
        let mut model = Self::new();
        model.configure(operation, simulation);
        model
    }

    pub fn configure(&mut self, operation: OperationalParameters, simulation: SimulationParameters) {
        for warning in operation.warnings() {
            warn!(%warning, "degenerate operational parameter");
        }
        self.state = ModelState::Configured(EmpiricalConfig {
            operation,
            simulation,
        });
    }

    pub fn state(&self) -> &ModelState<EmpiricalConfig, SimulationResult> {
        &self.state
    }

    pub fn config(&self) -> Option<&EmpiricalConfig> {
        self.state.config()
    }

    pub fn results(&self) -> Option<&SimulationResult> {
        self.state.results()
    }

    /// Sets one operational parameter. Returns `false` when unconfigured.
    pub fn set_parameter(&mut self, field: ParameterField, value: f64) -> bool {
        self.state.edit(|config| config.operation.set(field, value))
    }

    /// Sets one service share and rescales the others to keep a unit sum.
    pub fn set_service_share(&mut self, service: ServiceType, share: f64) -> bool {
        self.state
            .edit(|config| config.operation.services.set_share(service, share))
    }

    pub fn set_simulation(&mut self, simulation: SimulationParameters) -> bool {
        self.state.edit(|config| config.simulation = simulation)
    }

    /// Runs the simulation with `rng`. `None` when unconfigured.
    pub fn run<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&SimulationResult> {
        let config = self.state.take().into_config()?;
        let results = simulate(&config.operation, &config.simulation, rng);
        self.state = ModelState::Computed { config, results };
        self.results()
    }

    pub fn run_seeded(&mut self, seed: u64) -> Option<&SimulationResult> {
        let config = self.state.take().into_config()?;
        let results = simulate_seeded(&config.operation, &config.simulation, seed);
        self.state = ModelState::Computed { config, results };
        self.results()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormativeConfig {
    pub initial: DecisionVector,
    pub goals: IdealGoals,
    pub constraints: Vec<Constraint>,
    pub use_solver: bool,
    pub solver: SolverOptions,
}

impl Default for NormativeConfig {
    fn default() -> Self {
        Self {
            initial: DecisionVector::default(),
            goals: IdealGoals::default(),
            constraints: Constraint::defaults(),
            use_solver: true,
            solver: SolverOptions::default(),
        }
    }
}

/// Optimization model of ideal operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormativeModel {
    state: ModelState<NormativeConfig, OptimalConfigurationResult>,
}

impl NormativeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configured(config: NormativeConfig) -> Self {
        Self {
            state: ModelState::Configured(config),
        }
    }

    pub fn configure(&mut self, config: NormativeConfig) {
        self.state = ModelState::Configured(config);
    }

    pub fn state(&self) -> &ModelState<NormativeConfig, OptimalConfigurationResult> {
        &self.state
    }

    pub fn config(&self) -> Option<&NormativeConfig> {
        self.state.config()
    }

    pub fn results(&self) -> Option<&OptimalConfigurationResult> {
        self.state.results()
    }

    pub fn set_goals(&mut self, goals: IdealGoals) -> bool {
        self.state.edit(|config| config.goals = goals)
    }

    pub fn set_constraints(&mut self, constraints: Vec<Constraint>) -> bool {
        self.state.edit(|config| config.constraints = constraints)
    }

    pub fn set_initial(&mut self, initial: DecisionVector) -> bool {
        self.state.edit(|config| config.initial = initial)
    }

    /// Resolves the ideal configuration. An EMPTY optimization leaves the
    /// model configured without results.
    pub fn run(&mut self) -> Option<&OptimalConfigurationResult> {
        let config = self.state.take().into_config()?;
        match optimize_with(
            &config.initial,
            &config.goals,
            &config.constraints,
            config.use_solver,
            &config.solver,
        ) {
            Some(results) => {
                self.state = ModelState::Computed { config, results };
                self.results()
            }
            None => {
                self.state = ModelState::Configured(config);
                None
            }
        }
    }
}

/// Gap matrix and recommendations of one empirical/normative pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysis {
    pub matrix: GapMatrix,
    pub recommendations: Vec<Recommendation>,
}

impl GapAnalysis {
    /// Empty when either model has no results.
    pub fn from_models(empirical: &EmpiricalModel, normative: &NormativeModel) -> Self {
        Self::from_results(empirical.results(), normative.results())
    }

    pub fn from_results(
        simulation: Option<&SimulationResult>,
        optimal: Option<&OptimalConfigurationResult>,
    ) -> Self {
        let matrix = compare_models(simulation, optimal);
        let recommendations = build_recommendations(&matrix);
        Self {
            matrix,
            recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::ConstraintKind;

    fn empirical() -> EmpiricalModel {
        EmpiricalModel::configured(
            OperationalParameters::default(),
            SimulationParameters::new(20, 6).expect("valid parameters"),
        )
    }

    #[test]
    fn unconfigured_models_have_no_results() {
        let mut empirical = EmpiricalModel::new();
        assert!(empirical.results().is_none());
        assert!(empirical.run_seeded(1).is_none());
        assert!(!empirical.set_parameter(ParameterField::Efficiency, 0.5));
        assert_eq!(empirical.state(), &ModelState::Unconfigured);

        let mut normative = NormativeModel::new();
        assert!(normative.run().is_none());
    }

    #[test]
    fn running_moves_to_computed_and_setters_reset() {
        let mut model = empirical();
        assert!(model.results().is_none());
        assert!(model.run_seeded(5).is_some());
        assert!(model.state().is_computed());

        assert!(model.set_parameter(ParameterField::Efficiency, 0.5));
        assert!(model.results().is_none());
        let config = model.config().expect("still configured");
        assert_eq!(config.operation.capacity.efficiency, 0.5);
    }

    #[test]
    fn service_share_edits_renormalize() {
        let mut model = empirical();
        assert!(model.set_service_share(ServiceType::Vaccination, 0.5));
        let services = &model.config().expect("configured").operation.services;
        assert!((services.total() - 1.0).abs() < 1e-12);
        assert!((services.share(ServiceType::Vaccination) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_optimization_keeps_model_configured() {
        let mut model = NormativeModel::configured(NormativeConfig {
            constraints: vec![Constraint::new(ConstraintKind::MinCoverage, 2.0)],
            ..NormativeConfig::default()
        });
        assert!(model.run().is_none());
        assert!(model.config().is_some());
        assert!(!model.state().is_computed());
    }

    #[test]
    fn gap_analysis_requires_both_results() {
        let mut empirical = empirical();
        let mut normative = NormativeModel::configured(NormativeConfig {
            use_solver: false,
            ..NormativeConfig::default()
        });
        assert!(GapAnalysis::from_models(&empirical, &normative)
            .matrix
            .is_empty());

        empirical.run_seeded(9);
        normative.run();
        let analysis = GapAnalysis::from_models(&empirical, &normative);
        assert_eq!(analysis.matrix.len(), 4);
        assert!(analysis.recommendations.len() <= 4);
    }
}
