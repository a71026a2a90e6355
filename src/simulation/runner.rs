use chrono::Utc;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::finance::{guarded_sustainability, non_negative, total_cost};
use crate::params::{OperationalParameters, SimulationParameters};
use crate::simulation::draws::daily_demand;
use crate::simulation::{
    MetricSamples, MetricStatistics, SimulationResult, TrialOutcome, SEMESTER_REVISIT_MONTHS,
};

/// Runs `parameters.trials()` independent trials drawing from `rng`.
///
/// Never fails: degenerate inputs (negative capacity or efficiency, zero
/// population, negative costs) clamp every aggregated metric at zero.
pub fn simulate<R: Rng + ?Sized>(
    params: &OperationalParameters,
    parameters: &SimulationParameters,
    rng: &mut R,
) -> SimulationResult {
    run(params, parameters, rng, None)
}

/// Same as [`simulate`] with a fresh ChaCha generator seeded from `seed`.
pub fn simulate_seeded(
    params: &OperationalParameters,
    parameters: &SimulationParameters,
    seed: u64,
) -> SimulationResult {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    run(params, parameters, &mut rng, Some(seed))
}

fn run<R: Rng + ?Sized>(
    params: &OperationalParameters,
    parameters: &SimulationParameters,
    rng: &mut R,
    seed: Option<u64>,
) -> SimulationResult {
    debug!(
        trials = parameters.trials(),
        horizon_months = parameters.horizon_months(),
        patients_per_day = params.capacity.patients_per_day,
        efficiency = params.capacity.efficiency,
        "starting operational simulation"
    );

    let mut samples = MetricSamples::with_capacity(parameters.trials() as usize);
    for _ in 0..parameters.trials() {
        samples.push(run_trial(params, parameters.horizon_months(), rng));
    }
    let statistics = MetricStatistics::from_samples(&samples);

    info!(
        trials = samples.len(),
        mean_demand = statistics.demand.mean,
        mean_coverage = statistics.coverage.mean,
        mean_sustainability = statistics.sustainability.mean,
        "simulation complete"
    );

    SimulationResult {
        inputs: params.clone(),
        parameters: *parameters,
        seed,
        samples,
        statistics,
        computed_at: Utc::now(),
    }
}

/// Simulates `horizon_months` months and averages the monthly series.
pub fn run_trial<R: Rng + ?Sized>(
    params: &OperationalParameters,
    horizon_months: u32,
    rng: &mut R,
) -> TrialOutcome {
    let effective_capacity = params.capacity.effective_daily();
    let servable_per_month = (params.coverage.target_population / SEMESTER_REVISIT_MONTHS).max(1.0);

    let mut demand_sum = 0.0;
    let mut cost_sum = 0.0;
    let mut coverage_sum = 0.0;
    let mut sustainability_sum = 0.0;

    for _ in 0..horizon_months {
        let mut monthly_demand = 0.0;
        for _ in 0..params.capacity.days_per_month {
            let requested = daily_demand(rng, params.capacity.patients_per_day);
            monthly_demand += non_negative(requested.min(effective_capacity));
        }

        let monthly_cost = non_negative(total_cost(
            monthly_demand,
            params.costs.fixed_monthly,
            params.costs.variable_per_patient,
        ));
        let coverage = (monthly_demand / servable_per_month).min(1.0);
        let revenue = monthly_demand * params.costs.unit_cost_per_visit;

        demand_sum += monthly_demand;
        cost_sum += monthly_cost;
        coverage_sum += coverage;
        sustainability_sum += guarded_sustainability(revenue, monthly_cost);
    }

    let months = f64::from(horizon_months.max(1));
    TrialOutcome {
        demand: demand_sum / months,
        cost: cost_sum / months,
        coverage: coverage_sum / months,
        sustainability: sustainability_sum / months,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::Metric;

    fn short_run() -> SimulationParameters {
        SimulationParameters::new(20, 6).expect("valid parameters")
    }

    #[test]
    fn reference_unit_converges_to_capacity_bound() {
        let params = OperationalParameters::default();
        let sim = SimulationParameters::new(500, 12).expect("valid parameters");
        let result = simulate_seeded(&params, &sim, 42);

        let demand = result.stats(Metric::Demand).mean;
        assert!((demand - 192.0).abs() <= 19.2, "demand was {demand}");
        let coverage = result.stats(Metric::Coverage).mean;
        let expected = 192.0 / (10_000.0 / 6.0);
        assert!(
            (coverage - expected).abs() <= expected * 0.1,
            "coverage was {coverage}"
        );
    }

    #[test]
    fn sample_lengths_equal_trial_count() {
        let result = simulate_seeded(&OperationalParameters::default(), &short_run(), 1);
        for metric in Metric::ALL {
            assert_eq!(result.samples.get(metric).len(), 20);
        }
        assert_eq!(result.seed, Some(1));
    }

    #[test]
    fn same_seed_reproduces_statistics() {
        let params = OperationalParameters::default();
        let a = simulate_seeded(&params, &short_run(), 99);
        let b = simulate_seeded(&params, &short_run(), 99);
        assert_eq!(a.samples, b.samples);
        assert_eq!(a.statistics, b.statistics);
    }

    #[test]
    fn negative_efficiency_clamps_to_zero_demand() {
        let mut params = OperationalParameters::default();
        params.capacity.efficiency = -0.5;
        let result = simulate_seeded(&params, &short_run(), 5);
        assert_eq!(result.stats(Metric::Demand).max, 0.0);
        assert_eq!(result.stats(Metric::Coverage).max, 0.0);
        assert_eq!(result.stats(Metric::Sustainability).max, 0.0);
        assert!(result.stats(Metric::Cost).min >= 0.0);
    }

    #[test]
    fn zero_population_and_negative_costs_stay_non_negative() {
        let mut params = OperationalParameters::default();
        params.coverage.target_population = 0.0;
        params.costs.fixed_monthly = -1_000_000.0;
        params.costs.unit_cost_per_visit = -5.0;
        let result = simulate_seeded(&params, &short_run(), 8);
        for metric in Metric::ALL {
            let stats = result.stats(metric);
            assert!(stats.min >= 0.0, "{metric} min was {}", stats.min);
            assert!(stats.mean.is_finite(), "{metric} mean not finite");
        }
        assert!(result.stats(Metric::Coverage).max <= 1.0);
    }

    #[test]
    fn tiny_population_floors_the_monthly_divisor_at_one() {
        let mut params = OperationalParameters::default();
        params.coverage.target_population = 3.0;
        let result = simulate_seeded(&params, &short_run(), 13);
        // 3 / 6 < 1, so any attended patient covers the whole month.
        assert!(result.stats(Metric::Demand).min > 0.0);
        assert_eq!(result.stats(Metric::Coverage).min, 1.0);
        assert_eq!(result.stats(Metric::Coverage).max, 1.0);
    }

    #[test]
    fn injected_rng_is_used() {
        let params = OperationalParameters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let injected = simulate(&params, &short_run(), &mut rng);
        let seeded = simulate_seeded(&params, &short_run(), 3);
        assert_eq!(injected.samples, seeded.samples);
        assert_eq!(injected.seed, None);
    }
}
