use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::optimizer::compliance::evaluate_compliance;
use crate::optimizer::objective::derive_indicators;
use crate::optimizer::{DecisionVector, DerivedIndicators, GoalCategory, IdealGoals};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct VariableChange {
    pub from: f64,
    pub to: f64,
}

impl VariableChange {
    fn new(from: f64, to: f64) -> Self {
        Self { from, to }
    }

    pub fn delta(&self) -> f64 {
        self.to - self.from
    }
}

/// Effect of moving from one decision vector to another, both taken as given.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WhatIfComparison {
    pub before: DecisionVector,
    pub after: DecisionVector,
    pub derived_before: DerivedIndicators,
    pub derived_after: DerivedIndicators,
    pub changes: BTreeMap<String, VariableChange>,
    pub global_compliance: VariableChange,
    pub category_compliance: BTreeMap<GoalCategory, VariableChange>,
}

impl WhatIfComparison {
    pub fn improves_compliance(&self) -> bool {
        self.global_compliance.delta() > 0.0
    }
}

pub fn compare_configurations(
    before: &DecisionVector,
    after: &DecisionVector,
    goals: &IdealGoals,
) -> WhatIfComparison {
    let derived_before = derive_indicators(before);
    let derived_after = derive_indicators(after);
    let compliance_before = evaluate_compliance(before, goals);
    let compliance_after = evaluate_compliance(after, goals);

    let changes = [
        (
            "monthly_attendances",
            derived_before.monthly_attendances,
            derived_after.monthly_attendances,
        ),
        (
            "covered_population",
            derived_before.covered_population,
            derived_after.covered_population,
        ),
        (
            "units_per_100k",
            derived_before.units_per_100k,
            derived_after.units_per_100k,
        ),
        (
            "total_monthly_cost",
            derived_before.total_monthly_cost,
            derived_after.total_monthly_cost,
        ),
        (
            "cost_per_capita",
            derived_before.cost_per_capita,
            derived_after.cost_per_capita,
        ),
    ]
    .into_iter()
    .map(|(name, from, to)| (name.to_string(), VariableChange::new(from, to)))
    .collect();

    let category_compliance = GoalCategory::ALL
        .into_iter()
        .map(|category| {
            (
                category,
                VariableChange::new(
                    compliance_before.category(category),
                    compliance_after.category(category),
                ),
            )
        })
        .collect();

    WhatIfComparison {
        before: *before,
        after: *after,
        derived_before,
        derived_after,
        changes,
        global_compliance: VariableChange::new(compliance_before.global, compliance_after.global),
        category_compliance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raising_coverage_improves_compliance() {
        let goals = IdealGoals::default();
        let before = DecisionVector::default();
        let after = DecisionVector {
            coverage_target: 1.0,
            ..before
        };
        let comparison = compare_configurations(&before, &after, &goals);
        assert!(comparison.improves_compliance());
        let coverage = comparison.category_compliance[&GoalCategory::Coverage];
        assert!((coverage.delta() - 0.2).abs() < 1e-12);
        let population = &comparison.changes["covered_population"];
        assert!((population.delta() - 2_000.0).abs() < 1e-9);
        assert_eq!(comparison.changes["monthly_attendances"].delta(), 0.0);
    }

    #[test]
    fn identical_vectors_have_no_change() {
        let goals = IdealGoals::default();
        let x = DecisionVector::default();
        let comparison = compare_configurations(&x, &x, &goals);
        assert!(!comparison.improves_compliance());
        assert!(comparison.changes.values().all(|c| c.delta() == 0.0));
    }
}
