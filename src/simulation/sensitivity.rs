use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::params::{OperationalParameters, ParameterField, SimulationParameters};
use crate::simulation::runner::simulate;
use crate::simulation::SimulationResult;

/// Mean outcomes of one simulated configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MeanOutcome {
    pub demand: f64,
    pub cost: f64,
    pub coverage: f64,
    pub sustainability: f64,
}

impl From<&SimulationResult> for MeanOutcome {
    fn from(result: &SimulationResult) -> Self {
        Self {
            demand: result.statistics.demand.mean,
            cost: result.statistics.cost.mean,
            coverage: result.statistics.coverage.mean,
            sustainability: result.statistics.sustainability.mean,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensitivityPoint {
    pub value: f64,
    pub outcome: MeanOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensitivityResult {
    pub field: ParameterField,
    pub baseline: f64,
    pub points: Vec<SensitivityPoint>,
}

/// One named what-if: each field is scaled by `1 + variation`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub variations: BTreeMap<ParameterField, f64>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variations: BTreeMap::new(),
        }
    }

    pub fn vary(mut self, field: ParameterField, variation: f64) -> Self {
        self.variations.insert(field, variation);
        self
    }

    pub fn apply(&self, params: &OperationalParameters) -> OperationalParameters {
        let mut varied = params.clone();
        for (field, variation) in &self.variations {
            varied = varied.with_variation(*field, *variation);
        }
        varied
    }

    /// Pessimistic, optimistic and cost-shock cases around the baseline.
    pub fn defaults() -> Vec<Scenario> {
        vec![
            Scenario::new("pessimistic")
                .vary(ParameterField::Efficiency, -0.2)
                .vary(ParameterField::FixedMonthlyCost, 0.1),
            Scenario::new("optimistic")
                .vary(ParameterField::Efficiency, 0.2)
                .vary(ParameterField::PatientsPerDay, 0.1),
            Scenario::new("cost_shock")
                .vary(ParameterField::FixedMonthlyCost, 0.25)
                .vary(ParameterField::VariableCostPerPatient, 0.25),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioOutcome {
    pub name: String,
    pub outcome: MeanOutcome,
}

/// Evenly spaced values from `min` to `max` inclusive.
pub fn linspace(min: f64, max: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (steps - 1) as f64;
            (0..steps).map(|i| min + step * i as f64).collect()
        }
    }
}

/// Simulates a copy of `params` at each of `steps` values of `field`.
/// The caller's parameters are left untouched.
pub fn sensitivity_analysis<R: Rng + ?Sized>(
    params: &OperationalParameters,
    parameters: &SimulationParameters,
    field: ParameterField,
    range: (f64, f64),
    steps: usize,
    rng: &mut R,
) -> SensitivityResult {
    let mut points = Vec::with_capacity(steps);
    for value in linspace(range.0, range.1, steps) {
        let mut varied = params.clone();
        varied.set(field, value);
        debug!(%field, value, "sensitivity point");
        let result = simulate(&varied, parameters, rng);
        points.push(SensitivityPoint {
            value,
            outcome: MeanOutcome::from(&result),
        });
    }
    SensitivityResult {
        field,
        baseline: params.value(field),
        points,
    }
}

pub fn analyze_scenarios<R: Rng + ?Sized>(
    params: &OperationalParameters,
    parameters: &SimulationParameters,
    scenarios: &[Scenario],
    rng: &mut R,
) -> Vec<ScenarioOutcome> {
    scenarios
        .iter()
        .map(|scenario| {
            let result = simulate(&scenario.apply(params), parameters, rng);
            ScenarioOutcome {
                name: scenario.name.clone(),
                outcome: MeanOutcome::from(&result),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn linspace_is_inclusive() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn sweep_leaves_parameters_untouched_and_grows_demand() {
        let params = OperationalParameters::default();
        let sim = SimulationParameters::new(10, 3).expect("valid parameters");
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let result = sensitivity_analysis(
            &params,
            &sim,
            ParameterField::Efficiency,
            (0.2, 0.8),
            4,
            &mut rng,
        );
        assert_eq!(result.points.len(), 4);
        assert!((result.baseline - 0.4).abs() < 1e-12);
        assert_eq!(params, OperationalParameters::default());
        let first = result.points.first().expect("points").outcome.demand;
        let last = result.points.last().expect("points").outcome.demand;
        assert!(last > first);
    }

    #[test]
    fn scenarios_report_by_name() {
        let params = OperationalParameters::default();
        let sim = SimulationParameters::new(10, 3).expect("valid parameters");
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let outcomes = analyze_scenarios(&params, &sim, &Scenario::defaults(), &mut rng);
        let names: Vec<_> = outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["pessimistic", "optimistic", "cost_shock"]);
        let pessimistic = outcomes[0].outcome.demand;
        let optimistic = outcomes[1].outcome.demand;
        assert!(optimistic > pessimistic);
    }

    #[test]
    fn scenario_apply_compounds_variations() {
        let params = OperationalParameters::default();
        let varied = Scenario::new("x")
            .vary(ParameterField::FixedMonthlyCost, 1.0)
            .apply(&params);
        assert!((varied.costs.fixed_monthly - 2.0 * params.costs.fixed_monthly).abs() < 1e-6);
    }
}
