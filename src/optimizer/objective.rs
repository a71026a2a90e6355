use crate::optimizer::{Constraint, ConstraintKind, DecisionVector, DerivedIndicators, IdealGoals};

/// Fixed monthly cost of the reference unit.
pub const REFERENCE_FIXED_COST: f64 = 17_291_667.0;
/// Monthly cost that normalizes the cost term of the objective.
pub const COST_NORMALIZER: f64 = 25_000_000.0;
pub const OPERATING_DAYS: f64 = 20.0;
pub const REFERENCE_POPULATION: f64 = 10_000.0;
/// Assumed margin of the charged price over cost recovery.
pub const REVENUE_MARGIN: f64 = 1.1;

pub const COST_WEIGHT: f64 = 0.4;
pub const PENALTY_WEIGHT: f64 = 0.6;
const DEVIATION_WEIGHT: f64 = 0.25;
const SHORTFALL_WEIGHT: f64 = 2.0;

pub fn attendances(x: &DecisionVector) -> f64 {
    x.capacity_daily * x.efficiency * OPERATING_DAYS
}

pub fn monthly_cost(x: &DecisionVector) -> f64 {
    REFERENCE_FIXED_COST + attendances(x) * x.unit_cost
}

/// Revenue with margin over monthly cost; zero when the cost is not positive.
pub fn sustainability(x: &DecisionVector) -> f64 {
    let cost = monthly_cost(x);
    if cost > 0.0 {
        attendances(x) * x.unit_cost * REVENUE_MARGIN / cost
    } else {
        0.0
    }
}

fn relative_deviation(value: f64, goal: f64) -> f64 {
    if goal == 0.0 {
        value.abs()
    } else {
        ((value - goal) / goal).abs()
    }
}

/// `0.4 * normalized cost + 0.6 * penalty`, to be minimized.
pub fn objective(x: &DecisionVector, goals: &IdealGoals) -> f64 {
    let penalty = DEVIATION_WEIGHT
        * relative_deviation(x.capacity_daily, goals.operation.optimal_capacity)
        + DEVIATION_WEIGHT
            * relative_deviation(x.efficiency, goals.operation.operational_efficiency)
        + DEVIATION_WEIGHT * relative_deviation(x.coverage_target, goals.coverage.population_target)
        + SHORTFALL_WEIGHT * (goals.financial.min_sustainability - sustainability(x)).max(0.0);
    COST_WEIGHT * monthly_cost(x) / COST_NORMALIZER + PENALTY_WEIGHT * penalty
}

/// Constraint slack; non-negative when satisfied.
pub fn constraint_slack(constraint: &Constraint, x: &DecisionVector) -> f64 {
    match constraint.kind {
        ConstraintKind::MinCoverage => x.coverage_target - constraint.value,
        ConstraintKind::MinQuality => x.efficiency - constraint.value,
        ConstraintKind::MinSustainability => sustainability(x) - constraint.value,
    }
}

pub fn satisfies_all(x: &DecisionVector, constraints: &[Constraint], tolerance: f64) -> bool {
    constraints
        .iter()
        .all(|c| constraint_slack(c, x) >= -tolerance)
}

pub fn derive_indicators(x: &DecisionVector) -> DerivedIndicators {
    let monthly_attendances = attendances(x);
    let covered_population = REFERENCE_POPULATION * x.coverage_target;
    let total_monthly_cost = x.unit_cost * monthly_attendances;
    let (units_per_100k, cost_per_capita) = if covered_population > 0.0 {
        (
            100_000.0 / covered_population,
            total_monthly_cost / covered_population,
        )
    } else {
        (0.0, 0.0)
    };
    DerivedIndicators {
        monthly_attendances,
        covered_population,
        units_per_100k,
        total_monthly_cost,
        cost_per_capita,
    }
}
