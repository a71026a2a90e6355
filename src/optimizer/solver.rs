//! Bound-constrained augmented Lagrangian solver.
//!
//! Minimizes `f(x)` over a box subject to inequality constraints `c_i(x) >= 0`.
//! Each outer round minimizes the Powell-Hestenes-Rockafellar merit function
//! with projected gradient descent in unit-scaled coordinates, then updates the
//! multipliers. Gradients are central finite differences.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const ARMIJO: f64 = 1e-4;
const MIN_STEP: f64 = 1e-14;
const FD_STEP: f64 = 1e-7;

#[derive(Debug, Error, PartialEq)]
pub enum SolverError {
    #[error("objective is not finite at the {0} point")]
    NonFinite(&'static str),
    #[error("bounds are empty or not finite for variable {0}")]
    InvalidBounds(usize),
    #[error("constraints cannot be satisfied: {0}")]
    Infeasible(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SolverOptions {
    /// Cap on projected-gradient steps across all rounds.
    pub max_iterations: usize,
    pub max_rounds: usize,
    /// Step size in unit coordinates below which a round is converged.
    pub tolerance: f64,
    pub feasibility_tolerance: f64,
    pub initial_penalty: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1_000,
            max_rounds: 25,
            tolerance: 1e-9,
            feasibility_tolerance: 1e-7,
            initial_penalty: 10.0,
        }
    }
}

pub type Objective<'a, const N: usize> = Box<dyn Fn(&[f64; N]) -> f64 + 'a>;

pub struct Problem<'a, const N: usize> {
    pub objective: Objective<'a, N>,
    pub constraints: Vec<Objective<'a, N>>,
    pub bounds: [(f64, f64); N],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution<const N: usize> {
    pub x: [f64; N],
    pub objective: f64,
    pub iterations: usize,
    pub converged: bool,
    /// Largest constraint violation at `x`, zero when feasible.
    pub max_violation: f64,
}

impl<'a, const N: usize> Problem<'a, N> {
    pub fn max_violation(&self, x: &[f64; N]) -> f64 {
        self.constraints
            .iter()
            .map(|c| (-c(x)).max(0.0))
            .fold(0.0, f64::max)
    }

    fn to_unit(&self, x: &[f64; N]) -> [f64; N] {
        let mut z = [0.0; N];
        for (i, (lo, hi)) in self.bounds.iter().enumerate() {
            let width = hi - lo;
            z[i] = if width > 0.0 {
                ((x[i] - lo) / width).clamp(0.0, 1.0)
            } else {
                0.0
            };
        }
        z
    }

    fn from_unit(&self, z: &[f64; N]) -> [f64; N] {
        let mut x = [0.0; N];
        for (i, (lo, hi)) in self.bounds.iter().enumerate() {
            x[i] = (lo + z[i] * (hi - lo)).clamp(*lo, *hi);
        }
        x
    }
}

struct Descent<const N: usize> {
    z: [f64; N],
    iterations: usize,
    converged: bool,
}

/// Minimizes `problem` starting from `start`, which is first projected into the box.
pub fn minimize<const N: usize>(
    problem: &Problem<'_, N>,
    start: [f64; N],
    options: &SolverOptions,
) -> Result<Solution<N>, SolverError> {
    for (i, (lo, hi)) in problem.bounds.iter().enumerate() {
        if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
            return Err(SolverError::InvalidBounds(i));
        }
    }

    let mut z = problem.to_unit(&start);
    if !(problem.objective)(&problem.from_unit(&z)).is_finite() {
        return Err(SolverError::NonFinite("initial"));
    }

    let mut multipliers = vec![0.0; problem.constraints.len()];
    let mut penalty = options.initial_penalty.max(1e-6);
    let mut previous_violation = f64::INFINITY;
    let mut iterations = 0;
    let mut converged = false;

    for round in 0..options.max_rounds {
        let budget = options.max_iterations.saturating_sub(iterations);
        if budget == 0 {
            break;
        }
        let merit = |z: &[f64; N]| -> f64 {
            let x = problem.from_unit(z);
            let mut value = (problem.objective)(&x);
            for (c, lambda) in problem.constraints.iter().zip(&multipliers) {
                let shifted = (lambda - penalty * c(&x)).max(0.0);
                value += (shifted * shifted - lambda * lambda) / (2.0 * penalty);
            }
            value
        };
        let descent = projected_descent(&merit, z, budget, options.tolerance);
        iterations += descent.iterations;
        z = descent.z;

        let x = problem.from_unit(&z);
        let violation = problem.max_violation(&x);
        for (c, lambda) in problem.constraints.iter().zip(multipliers.iter_mut()) {
            *lambda = (*lambda - penalty * c(&x)).max(0.0);
        }
        debug!(round, iterations, violation, penalty, "solver round");

        if descent.converged && violation <= options.feasibility_tolerance {
            converged = true;
            break;
        }
        if violation > 0.25 * previous_violation {
            penalty *= 10.0;
        }
        previous_violation = violation;
    }

    let x = problem.from_unit(&z);
    let objective = (problem.objective)(&x);
    if !objective.is_finite() {
        return Err(SolverError::NonFinite("final"));
    }
    Ok(Solution {
        x,
        objective,
        iterations,
        converged,
        max_violation: problem.max_violation(&x),
    })
}

fn projected_descent<const N: usize, F>(
    f: &F,
    start: [f64; N],
    budget: usize,
    tolerance: f64,
) -> Descent<N>
where
    F: Fn(&[f64; N]) -> f64,
{
    let mut z = start;
    let mut value = f(&z);
    let mut step: f64 = 1.0;

    for iteration in 0..budget {
        let grad = gradient(f, &z);
        if !value.is_finite() || grad.iter().any(|g| !g.is_finite()) {
            return Descent {
                z,
                iterations: iteration,
                converged: false,
            };
        }

        let mut t = (step * 2.0).min(1.0);
        let mut accepted = None;
        while t >= MIN_STEP {
            let candidate = project(&z, &grad, t);
            let decrease: f64 = (0..N).map(|i| grad[i] * (z[i] - candidate[i])).sum();
            let candidate_value = f(&candidate);
            if candidate_value.is_finite() && candidate_value <= value - ARMIJO * decrease {
                accepted = Some((candidate, candidate_value));
                break;
            }
            t *= 0.5;
        }

        let Some((candidate, candidate_value)) = accepted else {
            return Descent {
                z,
                iterations: iteration + 1,
                converged: true,
            };
        };
        let moved = (0..N)
            .map(|i| (candidate[i] - z[i]).abs())
            .fold(0.0, f64::max);
        z = candidate;
        value = candidate_value;
        step = t;
        if moved < tolerance {
            return Descent {
                z,
                iterations: iteration + 1,
                converged: true,
            };
        }
    }

    Descent {
        z,
        iterations: budget,
        converged: false,
    }
}

fn project<const N: usize>(z: &[f64; N], grad: &[f64; N], t: f64) -> [f64; N] {
    let mut out = [0.0; N];
    for i in 0..N {
        out[i] = (z[i] - t * grad[i]).clamp(0.0, 1.0);
    }
    out
}

fn gradient<const N: usize, F>(f: &F, z: &[f64; N]) -> [f64; N]
where
    F: Fn(&[f64; N]) -> f64,
{
    let mut grad = [0.0; N];
    for i in 0..N {
        let mut ahead = *z;
        let mut behind = *z;
        ahead[i] += FD_STEP;
        behind[i] -= FD_STEP;
        grad[i] = (f(&ahead) - f(&behind)) / (2.0 * FD_STEP);
    }
    grad
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic<'a>(target: [f64; 2]) -> Objective<'a, 2> {
        Box::new(move |x: &[f64; 2]| (x[0] - target[0]).powi(2) + (x[1] - target[1]).powi(2))
    }

    #[test]
    fn unconstrained_minimum_inside_the_box() {
        let problem = Problem {
            objective: quadratic([1.0, 2.0]),
            constraints: Vec::new(),
            bounds: [(-5.0, 5.0), (-5.0, 5.0)],
        };
        let solution = minimize(&problem, [4.0, -4.0], &SolverOptions::default()).expect("solves");
        assert!((solution.x[0] - 1.0).abs() < 1e-4, "{:?}", solution.x);
        assert!((solution.x[1] - 2.0).abs() < 1e-4, "{:?}", solution.x);
    }

    #[test]
    fn minimum_outside_the_box_lands_on_the_bound() {
        let problem = Problem {
            objective: quadratic([10.0, 0.5]),
            constraints: Vec::new(),
            bounds: [(0.0, 1.0), (0.0, 1.0)],
        };
        let solution = minimize(&problem, [0.2, 0.2], &SolverOptions::default()).expect("solves");
        assert_eq!(solution.x[0], 1.0);
        assert!((solution.x[1] - 0.5).abs() < 1e-4);
    }

    #[test]
    fn inequality_constraint_is_respected() {
        // Closest point to the origin with x + y >= 1.
        let problem = Problem {
            objective: quadratic([0.0, 0.0]),
            constraints: vec![Box::new(|x: &[f64; 2]| x[0] + x[1] - 1.0) as Objective<'_, 2>],
            bounds: [(-2.0, 2.0), (-2.0, 2.0)],
        };
        let solution = minimize(&problem, [2.0, 2.0], &SolverOptions::default()).expect("solves");
        assert!(solution.max_violation < 1e-4, "{solution:?}");
        assert!((solution.x[0] - 0.5).abs() < 1e-2, "{solution:?}");
        assert!((solution.x[1] - 0.5).abs() < 1e-2, "{solution:?}");
    }

    #[test]
    fn descent_from_the_far_bound_reaches_the_minimum() {
        let problem = Problem {
            objective: Box::new(|x: &[f64; 1]| (x[0] - 9.0).powi(2)),
            constraints: Vec::new(),
            bounds: [(0.0, 10.0)],
        };
        let solution = minimize(&problem, [0.0], &SolverOptions::default()).expect("solves");
        assert!((solution.x[0] - 9.0).abs() < 1e-4, "{solution:?}");
        assert!(solution.objective < 1e-6, "{solution:?}");
    }

    #[test]
    fn non_finite_objective_is_an_error() {
        let problem = Problem {
            objective: Box::new(|_: &[f64; 1]| f64::NAN),
            constraints: Vec::new(),
            bounds: [(0.0, 1.0)],
        };
        assert_eq!(
            minimize(&problem, [0.5], &SolverOptions::default()),
            Err(SolverError::NonFinite("initial"))
        );
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let problem = Problem {
            objective: quadratic([0.0, 0.0]),
            constraints: Vec::new(),
            bounds: [(0.0, 1.0), (2.0, 1.0)],
        };
        assert_eq!(
            minimize(&problem, [0.0, 0.0], &SolverOptions::default()),
            Err(SolverError::InvalidBounds(1))
        );
    }
}
