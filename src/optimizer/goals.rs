use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Normative targets the ideal configuration is scored against.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IdealGoals {
    #[serde(default)]
    pub coverage: CoverageGoals,
    #[serde(default)]
    pub operation: OperationGoals,
    #[serde(default)]
    pub financial: FinancialGoals,
    #[serde(default)]
    pub quality: QualityGoals,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoverageGoals {
    /// Share of the target population to reach.
    pub population_target: f64,
    pub visit_frequency: f64,
    /// Minutes.
    pub max_access_time: f64,
    pub min_satisfaction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationGoals {
    pub optimal_capacity: f64,
    pub operational_efficiency: f64,
    pub first_level_resolution: f64,
    /// Minutes.
    pub max_wait_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialGoals {
    pub max_unit_cost: f64,
    pub min_sustainability: f64,
    pub self_financing: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityGoals {
    pub care_continuity: f64,
    pub record_integration: f64,
    pub effective_referral: f64,
}

impl Default for CoverageGoals {
    fn default() -> Self {
        Self {
            population_target: 1.0,
            visit_frequency: 2.0,
            max_access_time: 60.0,
            min_satisfaction: 0.95,
        }
    }
}

impl Default for OperationGoals {
    fn default() -> Self {
        Self {
            optimal_capacity: 40.0,
            operational_efficiency: 0.8,
            first_level_resolution: 0.85,
            max_wait_time: 30.0,
        }
    }
}

impl Default for FinancialGoals {
    fn default() -> Self {
        Self {
            max_unit_cost: 70_000.0,
            min_sustainability: 1.0,
            self_financing: 0.6,
        }
    }
}

impl Default for QualityGoals {
    fn default() -> Self {
        Self {
            care_continuity: 0.85,
            record_integration: 1.0,
            effective_referral: 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum GoalCategory {
    Coverage,
    Operation,
    Financial,
    Quality,
}

impl GoalCategory {
    pub const ALL: [GoalCategory; 4] = [
        GoalCategory::Coverage,
        GoalCategory::Operation,
        GoalCategory::Financial,
        GoalCategory::Quality,
    ];

    /// Weight of the category in the global compliance score.
    pub fn weight(self) -> f64 {
        match self {
            Self::Coverage => 0.30,
            Self::Operation => 0.30,
            Self::Financial => 0.25,
            Self::Quality => 0.15,
        }
    }
}

impl Display for GoalCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Coverage => "coverage",
            Self::Operation => "operation",
            Self::Financial => "financial",
            Self::Quality => "quality",
        };
        write!(f, "{name}")
    }
}

impl IdealGoals {
    /// Named targets of one category, in declaration order.
    pub fn targets(&self, category: GoalCategory) -> Vec<(&'static str, f64)> {
        match category {
            GoalCategory::Coverage => vec![
                ("population_target", self.coverage.population_target),
                ("visit_frequency", self.coverage.visit_frequency),
                ("max_access_time", self.coverage.max_access_time),
                ("min_satisfaction", self.coverage.min_satisfaction),
            ],
            GoalCategory::Operation => vec![
                ("optimal_capacity", self.operation.optimal_capacity),
                ("operational_efficiency", self.operation.operational_efficiency),
                ("first_level_resolution", self.operation.first_level_resolution),
                ("max_wait_time", self.operation.max_wait_time),
            ],
            GoalCategory::Financial => vec![
                ("max_unit_cost", self.financial.max_unit_cost),
                ("min_sustainability", self.financial.min_sustainability),
                ("self_financing", self.financial.self_financing),
            ],
            GoalCategory::Quality => vec![
                ("care_continuity", self.quality.care_continuity),
                ("record_integration", self.quality.record_integration),
                ("effective_referral", self.quality.effective_referral),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_weights_sum_to_one() {
        let total: f64 = GoalCategory::ALL.iter().map(|c| c.weight()).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn targets_expose_named_values() {
        let goals = IdealGoals::default();
        let operation = goals.targets(GoalCategory::Operation);
        assert_eq!(operation[0], ("optimal_capacity", 40.0));
        assert_eq!(goals.targets(GoalCategory::Financial).len(), 3);
    }

    #[test]
    fn partial_goal_files_fall_back_to_defaults() {
        let goals: IdealGoals = toml::from_str(
            r#"
[operation]
optimal_capacity = 45.0
operational_efficiency = 0.85
first_level_resolution = 0.9
max_wait_time = 20.0
"#,
        )
        .expect("valid toml");
        assert_eq!(goals.operation.optimal_capacity, 45.0);
        assert_eq!(goals.financial, FinancialGoals::default());
    }
}
