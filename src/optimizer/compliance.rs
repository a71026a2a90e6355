use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::optimizer::objective::sustainability;
use crate::optimizer::{DecisionVector, GoalCategory, IdealGoals};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceIndicator {
    PopulationCoverage,
    OperationalEfficiency,
    DailyCapacity,
    UnitCost,
    Sustainability,
}

impl ComplianceIndicator {
    pub fn category(self) -> GoalCategory {
        match self {
            Self::PopulationCoverage => GoalCategory::Coverage,
            Self::OperationalEfficiency | Self::DailyCapacity => GoalCategory::Operation,
            Self::UnitCost | Self::Sustainability => GoalCategory::Financial,
        }
    }
}

impl Display for ComplianceIndicator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::PopulationCoverage => "population_coverage",
            Self::OperationalEfficiency => "operational_efficiency",
            Self::DailyCapacity => "daily_capacity",
            Self::UnitCost => "unit_cost",
            Self::Sustainability => "sustainability",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IndicatorCompliance {
    pub actual: f64,
    pub goal: f64,
    pub compliance: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComplianceReport {
    pub global: f64,
    pub categories: BTreeMap<GoalCategory, f64>,
    pub details: BTreeMap<ComplianceIndicator, IndicatorCompliance>,
}

impl ComplianceReport {
    pub fn category(&self, category: GoalCategory) -> f64 {
        self.categories.get(&category).copied().unwrap_or(0.0)
    }
}

fn unit_interval(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// `min(actual / goal, 1)`; a non-positive goal is always met.
pub fn achievement_ratio(actual: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        return 1.0;
    }
    unit_interval(actual / goal)
}

/// `min(goal / actual, 1)` for lower-is-better indicators, actual floored at 1.
pub fn cost_ratio(actual: f64, goal: f64) -> f64 {
    unit_interval(goal / actual.max(1.0))
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Scores `x` against `goals`. Quality has no model of its own and is the
/// average of the coverage and operation scores.
pub fn evaluate_compliance(x: &DecisionVector, goals: &IdealGoals) -> ComplianceReport {
    let mut details = BTreeMap::new();
    let mut record = |indicator: ComplianceIndicator, actual: f64, goal: f64, compliance: f64| {
        details.insert(
            indicator,
            IndicatorCompliance {
                actual,
                goal,
                compliance,
            },
        );
        compliance
    };

    let coverage = record(
        ComplianceIndicator::PopulationCoverage,
        x.coverage_target,
        goals.coverage.population_target,
        achievement_ratio(x.coverage_target, goals.coverage.population_target),
    );
    let efficiency = record(
        ComplianceIndicator::OperationalEfficiency,
        x.efficiency,
        goals.operation.operational_efficiency,
        achievement_ratio(x.efficiency, goals.operation.operational_efficiency),
    );
    let capacity = record(
        ComplianceIndicator::DailyCapacity,
        x.capacity_daily,
        goals.operation.optimal_capacity,
        achievement_ratio(x.capacity_daily, goals.operation.optimal_capacity),
    );
    let unit_cost = record(
        ComplianceIndicator::UnitCost,
        x.unit_cost,
        goals.financial.max_unit_cost,
        cost_ratio(x.unit_cost, goals.financial.max_unit_cost),
    );
    let ratio = sustainability(x);
    let sustained = record(
        ComplianceIndicator::Sustainability,
        ratio,
        goals.financial.min_sustainability,
        achievement_ratio(ratio, goals.financial.min_sustainability),
    );

    let operation = mean(&[efficiency, capacity]);
    let financial = mean(&[unit_cost, sustained]);
    let quality = mean(&[coverage, operation]);

    let categories: BTreeMap<GoalCategory, f64> = [
        (GoalCategory::Coverage, coverage),
        (GoalCategory::Operation, operation),
        (GoalCategory::Financial, financial),
        (GoalCategory::Quality, quality),
    ]
    .into_iter()
    .map(|(category, score)| (category, unit_interval(score)))
    .collect();

    let global = unit_interval(
        categories
            .iter()
            .map(|(category, score)| category.weight() * score)
            .sum(),
    );

    ComplianceReport {
        global,
        categories,
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratios_are_capped() {
        assert_eq!(achievement_ratio(2.0, 1.0), 1.0);
        assert!((achievement_ratio(0.5, 1.0) - 0.5).abs() < 1e-12);
        assert_eq!(achievement_ratio(-3.0, 1.0), 0.0);
        assert_eq!(achievement_ratio(0.2, 0.0), 1.0);
        assert_eq!(cost_ratio(50_000.0, 70_000.0), 1.0);
        assert!((cost_ratio(140_000.0, 70_000.0) - 0.5).abs() < 1e-12);
        assert_eq!(cost_ratio(0.0, 0.5), 0.5);
    }

    #[test]
    fn reference_vector_report() {
        let goals = IdealGoals::default();
        let report = evaluate_compliance(&DecisionVector::default(), &goals);

        assert!((report.category(GoalCategory::Coverage) - 0.8).abs() < 1e-12);
        let operation = (0.7 / 0.8 + 30.0 / 40.0) / 2.0;
        assert!((report.category(GoalCategory::Operation) - operation).abs() < 1e-12);
        let quality = (0.8 + operation) / 2.0;
        assert!((report.category(GoalCategory::Quality) - quality).abs() < 1e-12);

        let unit_cost = report.details[&ComplianceIndicator::UnitCost];
        assert!((unit_cost.compliance - 70_000.0 / 90_000.0).abs() < 1e-12);
        assert_eq!(report.details.len(), 5);
        assert!(report.global > 0.0 && report.global <= 1.0);
    }

    #[test]
    fn perfect_vector_scores_one_outside_finance() {
        let goals = IdealGoals::default();
        let x = DecisionVector {
            capacity_daily: 50.0,
            efficiency: 0.95,
            coverage_target: 1.0,
            unit_cost: 50_000.0,
        };
        let report = evaluate_compliance(&x, &goals);
        assert_eq!(report.category(GoalCategory::Coverage), 1.0);
        assert_eq!(report.category(GoalCategory::Operation), 1.0);
        assert_eq!(report.category(GoalCategory::Quality), 1.0);
        assert!(report.category(GoalCategory::Financial) < 1.0);
    }

    #[test]
    fn degenerate_vector_stays_in_unit_interval() {
        let x = DecisionVector {
            capacity_daily: -10.0,
            efficiency: f64::NAN,
            coverage_target: 5.0,
            unit_cost: -1.0,
        };
        let report = evaluate_compliance(&x, &IdealGoals::default());
        assert!((0.0..=1.0).contains(&report.global));
        for score in report.categories.values() {
            assert!((0.0..=1.0).contains(score));
        }
    }
}
