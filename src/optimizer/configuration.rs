use chrono::Utc;
use tracing::{debug, info, warn};

use crate::optimizer::compliance::evaluate_compliance;
use crate::optimizer::objective::{
    constraint_slack, derive_indicators, objective, satisfies_all, sustainability,
};
use crate::optimizer::solver::{minimize, Objective, Problem, SolverError, SolverOptions};
use crate::optimizer::{
    within_bounds, Constraint, ConstraintKind, DecisionVector, IdealGoals,
    OptimalConfigurationResult, OptimizationMode, SolverReport, DECISION_BOUNDS,
};

const RESTORATION_STEPS: usize = 60;

/// Resolves the ideal configuration.
///
/// With `use_solver = false` the initial vector is accepted unchanged. In
/// solver mode the objective is minimized over [`DECISION_BOUNDS`] subject
/// to `constraints`; `None` means no feasible configuration was found.
pub fn optimize(
    initial: &DecisionVector,
    goals: &IdealGoals,
    constraints: &[Constraint],
    use_solver: bool,
) -> Option<OptimalConfigurationResult> {
    optimize_with(
        initial,
        goals,
        constraints,
        use_solver,
        &SolverOptions::default(),
    )
}

pub fn optimize_with(
    initial: &DecisionVector,
    goals: &IdealGoals,
    constraints: &[Constraint],
    use_solver: bool,
    options: &SolverOptions,
) -> Option<OptimalConfigurationResult> {
    if !use_solver {
        debug!("direct mode, skipping solver");
        return Some(assemble(
            *initial,
            goals,
            constraints,
            OptimizationMode::Direct,
            None,
        ));
    }

    match solve(initial, goals, constraints, options) {
        Ok((x, report)) => {
            info!(
                capacity_daily = x.capacity_daily,
                efficiency = x.efficiency,
                coverage_target = x.coverage_target,
                unit_cost = x.unit_cost,
                iterations = report.iterations,
                converged = report.converged,
                "optimization complete"
            );
            Some(assemble(
                x,
                goals,
                constraints,
                OptimizationMode::Solver,
                Some(report),
            ))
        }
        Err(err) => {
            warn!(error = %err, "optimization produced no configuration");
            None
        }
    }
}

pub(crate) fn assemble(
    x: DecisionVector,
    goals: &IdealGoals,
    constraints: &[Constraint],
    mode: OptimizationMode,
    solver: Option<SolverReport>,
) -> OptimalConfigurationResult {
    OptimalConfigurationResult {
        configuration: x,
        derived: derive_indicators(&x),
        compliance: evaluate_compliance(&x, goals),
        goals: goals.clone(),
        constraints: constraints.to_vec(),
        mode,
        solver,
        computed_at: Utc::now(),
    }
}

/// Raises the lower bounds of coverage and efficiency to their thresholds.
fn constrained_bounds(constraints: &[Constraint]) -> Result<[(f64, f64); 4], SolverError> {
    let mut bounds = DECISION_BOUNDS;
    for constraint in constraints {
        let index = match constraint.kind {
            ConstraintKind::MinCoverage => 2,
            ConstraintKind::MinQuality => 1,
            ConstraintKind::MinSustainability => continue,
        };
        if constraint.value.is_nan() {
            return Err(SolverError::Infeasible(format!("{} is NaN", constraint.kind)));
        }
        let (lo, hi) = bounds[index];
        let lo = lo.max(constraint.value);
        if lo > hi {
            return Err(SolverError::Infeasible(format!(
                "{constraint} lies above the upper bound {hi}"
            )));
        }
        bounds[index] = (lo, hi);
    }
    Ok(bounds)
}

fn solve(
    initial: &DecisionVector,
    goals: &IdealGoals,
    constraints: &[Constraint],
    options: &SolverOptions,
) -> Result<(DecisionVector, SolverReport), SolverError> {
    let bounds = constrained_bounds(constraints)?;
    let nonlinear: Vec<Objective<'_, 4>> = constraints
        .iter()
        .filter(|c| c.kind == ConstraintKind::MinSustainability)
        .map(|c| {
            let constraint = *c;
            Box::new(move |x: &[f64; 4]| constraint_slack(&constraint, &DecisionVector::from_array(*x)))
                as Objective<'_, 4>
        })
        .collect();

    let problem = Problem {
        objective: Box::new(|x: &[f64; 4]| objective(&DecisionVector::from_array(*x), goals)),
        constraints: nonlinear,
        bounds,
    };
    debug!(
        constraints = constraints.len(),
        max_iterations = options.max_iterations,
        "starting solver"
    );
    let solution = minimize(&problem, initial.to_array(), options)?;

    let mut x = DecisionVector::from_array(solution.x);
    let mut restored = false;
    if !satisfies_all(&x, constraints, 0.0) {
        debug!(
            violation = solution.max_violation,
            "restoring sustainability feasibility"
        );
        x = restore_sustainability(x, constraints, &bounds)?;
        restored = true;
    }

    if !x.is_finite() || !within_bounds(&x, &DECISION_BOUNDS) || !satisfies_all(&x, constraints, 0.0)
    {
        return Err(SolverError::Infeasible(
            "final point violates bounds or constraints".to_string(),
        ));
    }

    Ok((
        x,
        SolverReport {
            iterations: solution.iterations,
            converged: solution.converged,
            objective: objective(&x, goals),
            restored,
        },
    ))
}

/// Moves `x` toward the corner of maximal capacity, efficiency and unit cost
/// until every sustainability threshold holds. Sustainability increases
/// monotonically along that segment, so bisection finds the nearest point.
fn restore_sustainability(
    x: DecisionVector,
    constraints: &[Constraint],
    bounds: &[(f64, f64); 4],
) -> Result<DecisionVector, SolverError> {
    let threshold = constraints
        .iter()
        .filter(|c| c.kind == ConstraintKind::MinSustainability)
        .map(|c| c.value)
        .fold(f64::NEG_INFINITY, f64::max);

    let corner = DecisionVector {
        capacity_daily: bounds[0].1,
        efficiency: bounds[1].1,
        coverage_target: x.coverage_target,
        unit_cost: bounds[3].1,
    };
    if sustainability(&corner) < threshold {
        return Err(SolverError::Infeasible(format!(
            "sustainability {threshold} exceeds the attainable {:.4}",
            sustainability(&corner)
        )));
    }

    let along = |t: f64| {
        let from = x.to_array();
        let to = corner.to_array();
        let mut point = [0.0; 4];
        for i in 0..4 {
            point[i] = (from[i] + t * (to[i] - from[i])).clamp(bounds[i].0, bounds[i].1);
        }
        DecisionVector::from_array(point)
    };

    let (mut infeasible, mut feasible) = (0.0, 1.0);
    for _ in 0..RESTORATION_STEPS {
        let mid = 0.5 * (infeasible + feasible);
        if sustainability(&along(mid)) >= threshold {
            feasible = mid;
        } else {
            infeasible = mid;
        }
    }
    Ok(along(feasible))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::objective::REVENUE_MARGIN;

    fn goals() -> IdealGoals {
        IdealGoals::default()
    }

    #[test]
    fn direct_mode_returns_initial_unchanged() {
        let initial = DecisionVector {
            capacity_daily: 75.0,
            efficiency: 1.2,
            coverage_target: 0.3,
            unit_cost: 10.0,
        };
        let result = optimize(&initial, &goals(), &Constraint::defaults(), false).expect("direct");
        assert_eq!(result.configuration, initial);
        assert_eq!(result.mode, OptimizationMode::Direct);
        assert!(result.solver.is_none());
    }

    #[test]
    fn solver_result_respects_bounds_and_default_constraints() {
        let constraints = Constraint::defaults();
        let result = optimize(&DecisionVector::default(), &goals(), &constraints, true)
            .expect("feasible configuration");
        let x = result.configuration;
        assert!(within_bounds(&x, &DECISION_BOUNDS), "{x:?}");
        assert!(x.coverage_target >= 0.6);
        assert!(x.efficiency >= 0.7);
        assert!(sustainability(&x) >= 0.6);
        assert_eq!(result.mode, OptimizationMode::Solver);
    }

    #[test]
    fn solver_moves_coverage_toward_goal() {
        let result = optimize(&DecisionVector::default(), &goals(), &[], true).expect("feasible");
        assert!(
            result.configuration.coverage_target >= 0.99,
            "{:?}",
            result.configuration
        );
    }

    #[test]
    fn min_coverage_threshold_is_honored() {
        let constraints = [Constraint::new(ConstraintKind::MinCoverage, 0.95)];
        let initial = DecisionVector {
            coverage_target: 0.6,
            ..DecisionVector::default()
        };
        let result = optimize(&initial, &goals(), &constraints, true).expect("feasible");
        assert!(result.configuration.coverage_target >= 0.95);
    }

    #[test]
    fn demanding_sustainability_is_restored() {
        let constraints = [Constraint::new(ConstraintKind::MinSustainability, 0.9)];
        let initial = DecisionVector {
            capacity_daily: 20.0,
            efficiency: 0.4,
            coverage_target: 0.6,
            unit_cost: 50_000.0,
        };
        let result = optimize(&initial, &goals(), &constraints, true).expect("feasible");
        assert!(sustainability(&result.configuration) >= 0.9);
    }

    #[test]
    fn unattainable_thresholds_are_empty() {
        let initial = DecisionVector::default();
        let too_sustainable = [Constraint::new(ConstraintKind::MinSustainability, REVENUE_MARGIN)];
        assert!(optimize(&initial, &goals(), &too_sustainable, true).is_none());

        let too_covered = [Constraint::new(ConstraintKind::MinCoverage, 1.5)];
        assert!(optimize(&initial, &goals(), &too_covered, true).is_none());

        let nan_quality = [Constraint::new(ConstraintKind::MinQuality, f64::NAN)];
        assert!(optimize(&initial, &goals(), &nan_quality, true).is_none());
    }

    #[test]
    fn non_finite_initial_vector_is_empty() {
        let initial = DecisionVector {
            unit_cost: f64::NAN,
            ..DecisionVector::default()
        };
        assert!(optimize(&initial, &goals(), &[], true).is_none());
    }

    #[test]
    fn out_of_box_initial_vector_is_projected() {
        let initial = DecisionVector {
            capacity_daily: 500.0,
            efficiency: 0.0,
            coverage_target: 3.0,
            unit_cost: 1.0,
        };
        let result = optimize(&initial, &goals(), &Constraint::defaults(), true).expect("feasible");
        assert!(within_bounds(&result.configuration, &DECISION_BOUNDS));
    }

    #[test]
    fn restoration_bisects_toward_the_corner() {
        let constraints = [Constraint::new(ConstraintKind::MinSustainability, 0.8)];
        let x = DecisionVector {
            capacity_daily: 20.0,
            efficiency: 0.4,
            coverage_target: 0.7,
            unit_cost: 50_000.0,
        };
        let restored = restore_sustainability(x, &constraints, &DECISION_BOUNDS).expect("attainable");
        assert!(sustainability(&restored) >= 0.8);
        assert!(sustainability(&restored) < 0.8 + 1e-6);
        assert_eq!(restored.coverage_target, 0.7);
    }
}
