pub mod draws;
pub mod runner;
pub mod sensitivity;
pub mod stats;

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::params::{OperationalParameters, SimulationParameters};

pub use runner::{simulate, simulate_seeded};
pub use stats::{summarize, SummaryStats};

/// Each person is expected to be seen once per semester, so a month can at
/// most serve a sixth of the target population.
pub const SEMESTER_REVISIT_MONTHS: f64 = 6.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Demand,
    Cost,
    Coverage,
    Sustainability,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Demand,
        Metric::Cost,
        Metric::Coverage,
        Metric::Sustainability,
    ];
}

impl Display for Metric {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Demand => "demand",
            Self::Cost => "cost",
            Self::Coverage => "coverage",
            Self::Sustainability => "sustainability",
        };
        write!(f, "{name}")
    }
}

/// Per-trial outcomes, one entry per trial in run order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricSamples {
    pub demand: Vec<f64>,
    pub cost: Vec<f64>,
    pub coverage: Vec<f64>,
    pub sustainability: Vec<f64>,
}

impl MetricSamples {
    pub fn with_capacity(trials: usize) -> Self {
        Self {
            demand: Vec::with_capacity(trials),
            cost: Vec::with_capacity(trials),
            coverage: Vec::with_capacity(trials),
            sustainability: Vec::with_capacity(trials),
        }
    }

    pub fn get(&self, metric: Metric) -> &[f64] {
        match metric {
            Metric::Demand => &self.demand,
            Metric::Cost => &self.cost,
            Metric::Coverage => &self.coverage,
            Metric::Sustainability => &self.sustainability,
        }
    }

    pub fn push(&mut self, outcome: TrialOutcome) {
        self.demand.push(outcome.demand);
        self.cost.push(outcome.cost);
        self.coverage.push(outcome.coverage);
        self.sustainability.push(outcome.sustainability);
    }

    pub fn len(&self) -> usize {
        self.demand.len()
    }

    pub fn is_empty(&self) -> bool {
        self.demand.is_empty()
    }
}

/// Monthly means of one trial over the whole horizon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrialOutcome {
    pub demand: f64,
    pub cost: f64,
    pub coverage: f64,
    pub sustainability: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricStatistics {
    pub demand: SummaryStats,
    pub cost: SummaryStats,
    pub coverage: SummaryStats,
    pub sustainability: SummaryStats,
}

impl MetricStatistics {
    pub fn from_samples(samples: &MetricSamples) -> Self {
        Self {
            demand: summarize(&samples.demand),
            cost: summarize(&samples.cost),
            coverage: summarize(&samples.coverage),
            sustainability: summarize(&samples.sustainability),
        }
    }

    pub fn get(&self, metric: Metric) -> &SummaryStats {
        match metric {
            Metric::Demand => &self.demand,
            Metric::Cost => &self.cost,
            Metric::Coverage => &self.coverage,
            Metric::Sustainability => &self.sustainability,
        }
    }
}

/// Immutable snapshot of one Monte Carlo run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationResult {
    pub inputs: OperationalParameters,
    pub parameters: SimulationParameters,
    pub seed: Option<u64>,
    pub samples: MetricSamples,
    pub statistics: MetricStatistics,
    pub computed_at: DateTime<Utc>,
}

impl SimulationResult {
    pub fn stats(&self, metric: Metric) -> &SummaryStats {
        self.statistics.get(metric)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean monthly cost divided by mean monthly demand, demand floored at 1.
    pub fn cost_per_attention(&self) -> f64 {
        self.statistics.cost.mean / self.statistics.demand.mean.max(1.0)
    }
}
