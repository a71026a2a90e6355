pub mod compliance;
pub mod configuration;
pub mod goals;
pub mod objective;
pub mod solver;
pub mod whatif;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use compliance::{evaluate_compliance, ComplianceIndicator, ComplianceReport, IndicatorCompliance};
pub use configuration::{optimize, optimize_with};
pub use goals::{GoalCategory, IdealGoals};
pub use solver::SolverOptions;
pub use whatif::{compare_configurations, WhatIfComparison};

/// The four continuous variables the optimizer searches over.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DecisionVector {
    /// Patients per day.
    pub capacity_daily: f64,
    pub efficiency: f64,
    /// Share of the reference population to cover.
    pub coverage_target: f64,
    /// Price charged per attention.
    pub unit_cost: f64,
}

impl Default for DecisionVector {
    fn default() -> Self {
        Self {
            capacity_daily: 30.0,
            efficiency: 0.7,
            coverage_target: 0.8,
            unit_cost: 90_000.0,
        }
    }
}

impl DecisionVector {
    pub fn to_array(self) -> [f64; 4] {
        [
            self.capacity_daily,
            self.efficiency,
            self.coverage_target,
            self.unit_cost,
        ]
    }

    pub fn from_array(x: [f64; 4]) -> Self {
        Self {
            capacity_daily: x[0],
            efficiency: x[1],
            coverage_target: x[2],
            unit_cost: x[3],
        }
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// Inclusive box bounds of the decision variables, in `DecisionVector` order.
pub const DECISION_BOUNDS: [(f64, f64); 4] = [
    (20.0, 50.0),
    (0.4, 0.95),
    (0.6, 1.0),
    (50_000.0, 120_000.0),
];

pub fn within_bounds(x: &DecisionVector, bounds: &[(f64, f64); 4]) -> bool {
    x.to_array()
        .iter()
        .zip(bounds)
        .all(|(v, (lo, hi))| *v >= *lo && *v <= *hi)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    MinCoverage,
    MinQuality,
    MinSustainability,
}

impl Display for ConstraintKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::MinCoverage => "min_coverage",
            Self::MinQuality => "min_quality",
            Self::MinSustainability => "min_sustainability",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown constraint kind: {0}")]
pub struct ConstraintParseError(pub String);

impl FromStr for ConstraintKind {
    type Err = ConstraintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "min_coverage" | "coverage" => Ok(Self::MinCoverage),
            "min_quality" | "quality" => Ok(Self::MinQuality),
            "min_sustainability" | "sustainability" => Ok(Self::MinSustainability),
            _ => Err(ConstraintParseError(s.to_string())),
        }
    }
}

/// Lower threshold on one derived quantity of the decision vector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub value: f64,
}

impl Constraint {
    pub fn new(kind: ConstraintKind, value: f64) -> Self {
        Self { kind, value }
    }

    /// Coverage 0.6, sustainability 0.6 and quality 0.7.
    pub fn defaults() -> Vec<Constraint> {
        vec![
            Constraint::new(ConstraintKind::MinCoverage, 0.6),
            Constraint::new(ConstraintKind::MinSustainability, 0.6),
            Constraint::new(ConstraintKind::MinQuality, 0.7),
        ]
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} >= {}", self.kind, self.value)
    }
}

/// `kind=value`, e.g. `min-coverage=0.9`.
impl FromStr for Constraint {
    type Err = ConstraintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, value) = s
            .split_once('=')
            .ok_or_else(|| ConstraintParseError(s.to_string()))?;
        let value = value
            .trim()
            .parse::<f64>()
            .map_err(|_| ConstraintParseError(s.to_string()))?;
        Ok(Self::new(kind.parse()?, value))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationMode {
    Direct,
    Solver,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DerivedIndicators {
    pub monthly_attendances: f64,
    pub covered_population: f64,
    /// Zero when no population is covered.
    pub units_per_100k: f64,
    /// Revenue-side cost: unit cost times attendances.
    pub total_monthly_cost: f64,
    /// Zero when no population is covered.
    pub cost_per_capita: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SolverReport {
    pub iterations: usize,
    pub converged: bool,
    pub objective: f64,
    pub restored: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimalConfigurationResult {
    pub configuration: DecisionVector,
    pub derived: DerivedIndicators,
    pub compliance: ComplianceReport,
    pub goals: IdealGoals,
    pub constraints: Vec<Constraint>,
    pub mode: OptimizationMode,
    pub solver: Option<SolverReport>,
    pub computed_at: DateTime<Utc>,
}
