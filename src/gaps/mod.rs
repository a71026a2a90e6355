pub mod evaluator;
pub mod recommendations;

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub use evaluator::{classify_priority, compare_models, relative_gap};
pub use recommendations::{build_recommendations, RECOMMENDATION_THRESHOLD};

/// Indicators compared between the empirical and normative models, in
/// report order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Coverage,
    Efficiency,
    CostEffectiveness,
    Sustainability,
}

impl Indicator {
    pub const ALL: [Indicator; 4] = [
        Indicator::Coverage,
        Indicator::Efficiency,
        Indicator::CostEffectiveness,
        Indicator::Sustainability,
    ];

    /// Lower real values are better.
    pub fn lower_is_better(self) -> bool {
        matches!(self, Self::CostEffectiveness)
    }
}

impl Display for Indicator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Coverage => "coverage",
            Self::Efficiency => "efficiency",
            Self::CostEffectiveness => "cost_effectiveness",
            Self::Sustainability => "sustainability",
        };
        write!(f, "{name}")
    }
}

/// Ordered by severity, `Low < Medium < High`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GapEntry {
    pub real: f64,
    pub ideal: f64,
    /// Signed relative gap; positive reads as better than ideal.
    pub gap: f64,
    pub priority: Priority,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GapMatrix {
    pub entries: BTreeMap<Indicator, GapEntry>,
}

impl GapMatrix {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, indicator: Indicator) -> Option<&GapEntry> {
        self.entries.get(&indicator)
    }

    /// Entries in indicator order.
    pub fn iter(&self) -> impl Iterator<Item = (Indicator, &GapEntry)> {
        self.entries.iter().map(|(indicator, entry)| (*indicator, entry))
    }

    pub fn count_by_priority(&self, priority: Priority) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.priority == priority)
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub indicator: Indicator,
    pub priority: Priority,
    pub text: String,
}
