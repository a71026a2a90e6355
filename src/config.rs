use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::finance::CashFlowOptions;
use crate::model::NormativeConfig;
use crate::optimizer::{Constraint, DecisionVector, IdealGoals, SolverOptions};
use crate::params::{OperationalParameters, ParamError, SimulationParameters};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub operation: OperationalParameters,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub goals: IdealGoals,
    #[serde(default = "Constraint::defaults")]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub finance: CashFlowOptions,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    #[serde(default = "default_trials")]
    pub trials: u32,
    #[serde(default = "default_horizon_months")]
    pub horizon_months: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizerConfig {
    #[serde(default)]
    pub initial: DecisionVector,
    #[serde(default = "default_true")]
    pub use_solver: bool,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub seed: Option<u64>,
    pub trials: Option<u32>,
    pub horizon_months: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

impl SimulationConfig {
    pub fn parameters(&self) -> Result<SimulationParameters, ParamError> {
        SimulationParameters::new(self.trials, self.horizon_months)
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/ums-viability/config.toml")
    }

    /// Reads `path`, or the default path, falling back to defaults when the
    /// file does not exist. `.json` files are parsed as JSON, anything else
    /// as TOML.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = match Format::of(&path) {
            Format::Json => serde_json::from_str(&data)
                .with_context(|| format!("failed parsing JSON config: {}", path.display()))?,
            Format::Toml => toml::from_str(&data)
                .with_context(|| format!("failed parsing TOML config: {}", path.display()))?,
        };
        parsed.log_warnings();
        Ok(parsed)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        let data = match Format::of(path) {
            Format::Json => serde_json::to_string_pretty(self).context("failed encoding JSON config")?,
            Format::Toml => toml::to_string_pretty(self).context("failed encoding TOML config")?,
        };
        fs::write(path, data).with_context(|| format!("failed writing config: {}", path.display()))
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(seed) = overrides.seed {
            self.simulation.seed = Some(seed);
        }
        if let Some(trials) = overrides.trials {
            self.simulation.trials = trials;
        }
        if let Some(horizon_months) = overrides.horizon_months {
            self.simulation.horizon_months = horizon_months;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template()?)
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn default_template() -> Result<String> {
        let body = toml::to_string_pretty(&Self::default()).context("failed encoding template")?;
        Ok(format!(
            "# ums-viability configuration\n# Costs are monthly unless stated otherwise.\n\n{body}"
        ))
    }

    pub fn normative(&self) -> NormativeConfig {
        NormativeConfig {
            initial: self.optimizer.initial,
            goals: self.goals.clone(),
            constraints: self.constraints.clone(),
            use_solver: self.optimizer.use_solver,
            solver: SolverOptions {
                max_iterations: self.optimizer.max_iterations,
                ..SolverOptions::default()
            },
        }
    }

    pub fn log_warnings(&self) {
        for warning in self.operation.warnings() {
            warn!(%warning, "degenerate operational parameter");
        }
        if let Err(err) = self.simulation.parameters() {
            warn!(error = %err, "invalid simulation settings");
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            operation: OperationalParameters::default(),
            simulation: SimulationConfig::default(),
            goals: IdealGoals::default(),
            constraints: Constraint::defaults(),
            optimizer: OptimizerConfig::default(),
            finance: CashFlowOptions::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            horizon_months: default_horizon_months(),
            seed: None,
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            initial: DecisionVector::default(),
            use_solver: true,
            max_iterations: default_max_iterations(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_trials() -> u32 {
    1000
}

fn default_horizon_months() -> u32 {
    60
}

fn default_max_iterations() -> usize {
    1000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::ConstraintKind;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load(Some(&dir.path().join("absent.toml"))).expect("defaults");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn template_parses_back_to_defaults() {
        let template = Config::default_template().expect("template");
        let parsed: Config = toml::from_str(&template).expect("template is valid toml");
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn toml_and_json_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = Config::default();
        config.simulation.seed = Some(7);
        config.constraints = vec![Constraint::new(ConstraintKind::MinCoverage, 0.9)];
        config.operation.capacity.patients_per_day = 30.0;

        for name in ["ums.toml", "ums.json"] {
            let path = dir.path().join("nested").join(name);
            config.save(&path).expect("save");
            let loaded = Config::load(Some(&path)).expect("load");
            assert_eq!(loaded, config, "{name}");
        }
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("partial.toml");
        fs::write(
            &path,
            r#"
[simulation]
trials = 50

[operation.capacity]
patients_per_day = 30.0
days_per_month = 22
efficiency = 0.5

[[constraints]]
kind = "min_quality"
value = 0.8
"#,
        )
        .expect("write");
        let config = Config::load(Some(&path)).expect("load");
        assert_eq!(config.simulation.trials, 50);
        assert_eq!(config.simulation.horizon_months, 60);
        assert_eq!(config.operation.capacity.days_per_month, 22);
        assert_eq!(config.operation.costs.fixed_monthly, 17_291_667.0);
        assert_eq!(
            config.constraints,
            vec![Constraint::new(ConstraintKind::MinQuality, 0.8)]
        );
    }

    #[test]
    fn overrides_replace_simulation_settings() {
        let mut config = Config::default();
        config.apply_overrides(ConfigOverrides {
            seed: Some(3),
            trials: Some(10),
            horizon_months: None,
        });
        assert_eq!(config.simulation.seed, Some(3));
        assert_eq!(config.simulation.trials, 10);
        assert_eq!(config.simulation.horizon_months, 60);
        assert!(config.simulation.parameters().is_ok());
    }

    #[test]
    fn zero_trials_are_rejected_when_resolving() {
        let config = SimulationConfig {
            trials: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(config.parameters(), Err(ParamError::ZeroTrials));
    }
}
