use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use ums_viability::config::{Config, ConfigOverrides};
use ums_viability::finance::{cost_breakdown, project_cash_flow, CashFlowProjection, CostBreakdown};
use ums_viability::gaps::{GapMatrix, Recommendation};
use ums_viability::indicators::{
    effective_coverage, equity_index, performance_indicators, project_health_impact,
    regions_from_columns, HealthBaseline, HealthImpact, PerformanceIndicators,
};
use ums_viability::model::{EmpiricalModel, GapAnalysis, NormativeModel};
use ums_viability::optimizer::{compare_configurations, OptimalConfigurationResult, WhatIfComparison};
use ums_viability::output::csv::{cashflow_to_csv, gaps_to_csv, samples_to_csv, sensitivity_to_csv};
use ums_viability::output::json::render_json;
use ums_viability::output::table::{
    render_breakdown_table, render_cashflow_table, render_gap_table, render_indicators_table,
    render_optimization_table, render_recommendations_table, render_scenarios_table,
    render_sensitivity_table, render_simulation_table, render_whatif_table,
};
use ums_viability::params::ParameterField;
use ums_viability::server::run_server;
use ums_viability::simulation::sensitivity::{
    analyze_scenarios, sensitivity_analysis, Scenario, ScenarioOutcome, SensitivityResult,
};
use ums_viability::simulation::{Metric, SimulationResult};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "ums-viability",
    about = "Viability engine for rural mobile health units"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(short = 'n', long)]
    trials: Option<u32>,
    #[arg(long = "horizon")]
    horizon_months: Option<u32>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Monte Carlo simulation of the configured operation
    Simulate,
    /// Ideal configuration under the configured goals and constraints
    Optimize {
        #[arg(long)]
        direct: bool,
    },
    /// Gap matrix between the simulated and the ideal operation
    Compare {
        #[arg(long)]
        direct: bool,
    },
    /// Gap matrix plus prioritized recommendations
    Recommend {
        #[arg(long)]
        direct: bool,
    },
    /// Discounted cash-flow projection with NPV, IRR and payback
    Cashflow {
        #[arg(long)]
        months: Option<u32>,
    },
    /// Monthly cost breakdown at the simulated mean demand
    Breakdown,
    /// Sweep one operational parameter over a range
    Sensitivity {
        #[arg(long)]
        field: String,
        #[arg(long)]
        min: f64,
        #[arg(long)]
        max: f64,
        #[arg(long, default_value_t = 10)]
        steps: usize,
    },
    /// Simulate the predefined variation scenarios
    Scenarios,
    /// Expected indicators of the ideal configuration and projected health impact
    Indicators {
        #[arg(long)]
        direct: bool,
    },
    /// Compare the configured initial decision vector with a modified one
    Whatif {
        #[arg(long)]
        capacity: Option<f64>,
        #[arg(long)]
        efficiency: Option<f64>,
        #[arg(long)]
        coverage: Option<f64>,
        #[arg(long = "unit-cost")]
        unit_cost: Option<f64>,
    },
    /// Equity index across regions, from comma-separated columns
    Equity {
        #[arg(long)]
        population: String,
        #[arg(long)]
        coverage: Option<String>,
        #[arg(long)]
        capacity: Option<String>,
        #[arg(long)]
        distance: Option<String>,
    },
    /// Run the REST API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Write or show the configuration file
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[derive(Debug, Serialize)]
struct IndicatorsReport<'a> {
    configuration: &'a OptimalConfigurationResult,
    indicators: PerformanceIndicators,
    health_impact: HealthImpact,
}

#[derive(Debug, Serialize)]
struct EquityReport {
    coverage: Vec<f64>,
    equity_index: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        seed: cli.seed,
        trials: cli.trials,
        horizon_months: cli.horizon_months,
    });

    if matches!(cli.command, Commands::Config { .. }) {
        return handle_config_command(&cli.command, &config, &config_path);
    }
    if let Commands::Serve { host, port } = &cli.command {
        let host = host.clone().unwrap_or_else(|| config.server.host.clone());
        let port = port.unwrap_or(config.server.port);
        let bind = format!("{host}:{port}");
        let addr: SocketAddr = bind
            .parse()
            .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
        return run_server(config, addr).await;
    }

    match &cli.command {
        Commands::Simulate => {
            let result = run_simulation(&config)?;
            print_simulation(&result, cli.output)?;
        }
        Commands::Optimize { direct } => {
            let result = run_optimization(&config, *direct);
            print_optimization(result.as_ref(), cli.output)?;
        }
        Commands::Compare { direct } => {
            let analysis = run_comparison(&config, *direct)?;
            print_gaps(&analysis.matrix, cli.output)?;
        }
        Commands::Recommend { direct } => {
            let analysis = run_comparison(&config, *direct)?;
            print_recommendations(&analysis, cli.output)?;
        }
        Commands::Cashflow { months } => {
            let mut options = config.finance;
            if let Some(months) = months {
                options.horizon_months = *months;
            }
            let projection = project_cash_flow(&config.operation, &options);
            print_cashflow(&projection, cli.output)?;
        }
        Commands::Breakdown => {
            let result = run_simulation(&config)?;
            let breakdown = cost_breakdown(&config.operation, result.stats(Metric::Demand).mean);
            print_breakdown(&breakdown, cli.output)?;
        }
        Commands::Sensitivity {
            field,
            min,
            max,
            steps,
        } => {
            let field = ParameterField::from_str(field)?;
            let parameters = config.simulation.parameters()?;
            let mut rng = seeded_rng(config.simulation.seed);
            let result = sensitivity_analysis(
                &config.operation,
                &parameters,
                field,
                (*min, *max),
                *steps,
                &mut rng,
            );
            print_sensitivity(&result, cli.output)?;
        }
        Commands::Scenarios => {
            let parameters = config.simulation.parameters()?;
            let mut rng = seeded_rng(config.simulation.seed);
            let outcomes = analyze_scenarios(
                &config.operation,
                &parameters,
                &Scenario::defaults(),
                &mut rng,
            );
            print_scenarios(&outcomes, cli.output)?;
        }
        Commands::Indicators { direct } => {
            let simulation = run_simulation(&config)?;
            let Some(optimal) = run_optimization(&config, *direct) else {
                return print_optimization(None, cli.output);
            };
            let indicators = performance_indicators(&optimal.configuration, &optimal.goals);
            let health_impact = project_health_impact(
                simulation.stats(Metric::Coverage).mean,
                optimal.configuration.coverage_target,
                &HealthBaseline::default(),
            );
            print_indicators(
                &IndicatorsReport {
                    configuration: &optimal,
                    indicators,
                    health_impact,
                },
                cli.output,
            )?;
        }
        Commands::Whatif {
            capacity,
            efficiency,
            coverage,
            unit_cost,
        } => {
            let before = config.optimizer.initial;
            let mut after = before;
            if let Some(v) = capacity {
                after.capacity_daily = *v;
            }
            if let Some(v) = efficiency {
                after.efficiency = *v;
            }
            if let Some(v) = coverage {
                after.coverage_target = *v;
            }
            if let Some(v) = unit_cost {
                after.unit_cost = *v;
            }
            if after == before {
                return Err(anyhow!(
                    "at least one of --capacity, --efficiency, --coverage, --unit-cost is required"
                ));
            }
            let comparison = compare_configurations(&before, &after, &config.goals);
            print_whatif(&comparison, cli.output)?;
        }
        Commands::Equity {
            population,
            coverage,
            capacity,
            distance,
        } => {
            let report = run_equity(
                population,
                coverage.as_deref(),
                capacity.as_deref(),
                distance.as_deref(),
            )?;
            print_equity(&report, cli.output)?;
        }
        Commands::Config { .. } => {}
        Commands::Serve { .. } => unreachable!("serve command handled before dispatch"),
    }

    Ok(())
}

fn handle_config_command(command: &Commands, config: &Config, config_path: &Path) -> Result<()> {
    let Commands::Config { init, show } = command else {
        return Ok(());
    };
    if *init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if *show || !*init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn run_simulation(config: &Config) -> Result<SimulationResult> {
    let parameters = config
        .simulation
        .parameters()
        .context("invalid simulation settings")?;
    let mut model = EmpiricalModel::configured(config.operation.clone(), parameters);
    let result = match config.simulation.seed {
        Some(seed) => model.run_seeded(seed),
        None => model.run(&mut rand::thread_rng()),
    };
    result
        .cloned()
        .ok_or_else(|| anyhow!("simulation model was not configured"))
}

fn run_optimization(config: &Config, direct: bool) -> Option<OptimalConfigurationResult> {
    let mut normative = config.normative();
    if direct {
        normative.use_solver = false;
    }
    let mut model = NormativeModel::configured(normative);
    let result = model.run().cloned();
    if result.is_none() {
        warn!("no configuration satisfies the constraints");
    }
    result
}

fn run_comparison(config: &Config, direct: bool) -> Result<GapAnalysis> {
    let simulation = run_simulation(config)?;
    let optimal = run_optimization(config, direct);
    let analysis = GapAnalysis::from_results(Some(&simulation), optimal.as_ref());
    info!(
        gaps = analysis.matrix.len(),
        recommendations = analysis.recommendations.len(),
        "comparison complete"
    );
    Ok(analysis)
}

fn parse_column(name: &str, raw: &str) -> Result<Vec<f64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<f64>()
                .with_context(|| format!("invalid {name} value: {value}"))
        })
        .collect()
}

fn run_equity(
    population: &str,
    coverage: Option<&str>,
    capacity: Option<&str>,
    distance: Option<&str>,
) -> Result<EquityReport> {
    let population = parse_column("population", population)?;
    let coverage = match (coverage, capacity) {
        (Some(raw), _) => parse_column("coverage", raw)?,
        (None, Some(raw)) => {
            let capacity = parse_column("capacity", raw)?;
            let distance = match distance {
                Some(raw) => parse_column("distance", raw)?,
                None => vec![0.0; population.len()],
            };
            effective_coverage(&regions_from_columns(&population, &capacity, &distance)?)
        }
        (None, None) => return Err(anyhow!("either --coverage or --capacity is required")),
    };
    let equity_index = equity_index(&population, &coverage)?;
    Ok(EquityReport {
        coverage,
        equity_index,
    })
}

fn print_simulation(result: &SimulationResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_simulation_table(result)),
        OutputFormat::Json => println!("{}", render_json(result)?),
        OutputFormat::Csv => print!("{}", samples_to_csv(result)?),
    }
    Ok(())
}

fn print_optimization(
    result: Option<&OptimalConfigurationResult>,
    format: OutputFormat,
) -> Result<()> {
    match (format, result) {
        (OutputFormat::Table, Some(result)) => println!("{}", render_optimization_table(result)),
        (OutputFormat::Table, None) => {
            println!("No feasible configuration satisfies the constraints.")
        }
        (OutputFormat::Json, _) => println!("{}", render_json(&result)?),
        (OutputFormat::Csv, _) => {
            warn!("CSV output for optimize not implemented, using JSON");
            println!("{}", render_json(&result)?);
        }
    }
    Ok(())
}

fn print_gaps(matrix: &GapMatrix, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_gap_table(matrix)),
        OutputFormat::Json => println!("{}", render_json(matrix)?),
        OutputFormat::Csv => print!("{}", gaps_to_csv(matrix)?),
    }
    Ok(())
}

fn print_recommendations(analysis: &GapAnalysis, format: OutputFormat) -> Result<()> {
    let recommendations: &[Recommendation] = &analysis.recommendations;
    match format {
        OutputFormat::Table => {
            println!("{}", render_gap_table(&analysis.matrix));
            println!("{}", render_recommendations_table(recommendations));
        }
        OutputFormat::Json => println!("{}", render_json(analysis)?),
        OutputFormat::Csv => {
            warn!("CSV output for recommend not implemented, using JSON");
            println!("{}", render_json(analysis)?);
        }
    }
    Ok(())
}

fn print_cashflow(projection: &CashFlowProjection, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_cashflow_table(projection)),
        OutputFormat::Json => println!("{}", render_json(projection)?),
        OutputFormat::Csv => print!("{}", cashflow_to_csv(projection)?),
    }
    Ok(())
}

fn print_breakdown(breakdown: &CostBreakdown, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_breakdown_table(breakdown)),
        OutputFormat::Json => println!("{}", render_json(breakdown)?),
        OutputFormat::Csv => {
            warn!("CSV output for breakdown not implemented, using JSON");
            println!("{}", render_json(breakdown)?);
        }
    }
    Ok(())
}

fn print_sensitivity(result: &SensitivityResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_sensitivity_table(result)),
        OutputFormat::Json => println!("{}", render_json(result)?),
        OutputFormat::Csv => print!("{}", sensitivity_to_csv(result)?),
    }
    Ok(())
}

fn print_scenarios(outcomes: &[ScenarioOutcome], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_scenarios_table(outcomes)),
        OutputFormat::Json => println!("{}", render_json(outcomes)?),
        OutputFormat::Csv => {
            warn!("CSV output for scenarios not implemented, using JSON");
            println!("{}", render_json(outcomes)?);
        }
    }
    Ok(())
}

fn print_indicators(report: &IndicatorsReport<'_>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!(
            "{}",
            render_indicators_table(&report.indicators, &report.health_impact)
        ),
        OutputFormat::Json => println!("{}", render_json(report)?),
        OutputFormat::Csv => {
            warn!("CSV output for indicators not implemented, using JSON");
            println!("{}", render_json(report)?);
        }
    }
    Ok(())
}

fn print_whatif(comparison: &WhatIfComparison, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_whatif_table(comparison)),
        OutputFormat::Json => println!("{}", render_json(comparison)?),
        OutputFormat::Csv => {
            warn!("CSV output for whatif not implemented, using JSON");
            println!("{}", render_json(comparison)?);
        }
    }
    Ok(())
}

fn print_equity(report: &EquityReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            for (idx, coverage) in report.coverage.iter().enumerate() {
                println!("Region {}: coverage {:.3}", idx + 1, coverage);
            }
            println!("Equity index: {:.4}", report.equity_index);
        }
        OutputFormat::Json => println!("{}", render_json(report)?),
        OutputFormat::Csv => {
            warn!("CSV output for equity not implemented, using JSON");
            println!("{}", render_json(report)?);
        }
    }
    Ok(())
}
