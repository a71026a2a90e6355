use proptest::prelude::*;
use ums_viability::gaps::{build_recommendations, classify_priority, compare_models, relative_gap};
use ums_viability::optimizer::objective::satisfies_all;
use ums_viability::optimizer::{
    evaluate_compliance, optimize, within_bounds, Constraint, ConstraintKind, DecisionVector,
    IdealGoals, DECISION_BOUNDS,
};
use ums_viability::params::{OperationalParameters, SimulationParameters};
use ums_viability::simulation::{simulate_seeded, Metric};

fn decision_vector() -> impl Strategy<Value = DecisionVector> {
    (0.0..80.0f64, 0.0..1.2f64, 0.0..1.2f64, 1_000.0..200_000.0f64).prop_map(
        |(capacity_daily, efficiency, coverage_target, unit_cost)| DecisionVector {
            capacity_daily,
            efficiency,
            coverage_target,
            unit_cost,
        },
    )
}

fn small_run() -> SimulationParameters {
    SimulationParameters::new(5, 2).expect("valid parameters")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn degenerate_operation_never_yields_negative_metrics(
        patients in -20.0..60.0f64,
        efficiency in -0.5..1.5f64,
        population in -1_000.0..50_000.0f64,
        seed in any::<u64>(),
    ) {
        let mut params = OperationalParameters::default();
        params.capacity.patients_per_day = patients;
        params.capacity.efficiency = efficiency;
        params.coverage.target_population = population;

        let result = simulate_seeded(&params, &small_run(), seed);
        for metric in Metric::ALL {
            let stats = result.stats(metric);
            prop_assert!(stats.mean.is_finite() && stats.mean >= 0.0, "{metric}: {}", stats.mean);
            prop_assert!(stats.min >= 0.0, "{metric}: {}", stats.min);
        }
        prop_assert!(result.stats(Metric::Coverage).max <= 1.0);
    }

    #[test]
    fn same_seed_same_samples(seed in any::<u64>()) {
        let params = OperationalParameters::default();
        let first = simulate_seeded(&params, &small_run(), seed);
        let second = simulate_seeded(&params, &small_run(), seed);
        prop_assert_eq!(first.samples, second.samples);
    }

    #[test]
    fn direct_mode_returns_initial_vector(x in decision_vector()) {
        let result = optimize(&x, &IdealGoals::default(), &Constraint::defaults(), false)
            .expect("direct mode always resolves");
        prop_assert_eq!(result.configuration, x);
        prop_assert!(result.solver.is_none());
    }

    #[test]
    fn compliance_stays_in_unit_interval(x in decision_vector()) {
        let report = evaluate_compliance(&x, &IdealGoals::default());
        prop_assert!((0.0..=1.0).contains(&report.global), "global {}", report.global);
        for (category, score) in &report.categories {
            prop_assert!((0.0..=1.0).contains(score), "{category}: {score}");
        }
    }

    #[test]
    fn priority_grows_with_gap_magnitude(a in -2.0..2.0f64, b in -2.0..2.0f64) {
        let (small, large) = if a.abs() <= b.abs() { (a, b) } else { (b, a) };
        prop_assert!(classify_priority(small) <= classify_priority(large));
    }

    #[test]
    fn lower_is_better_inverts_the_gap(real in 0.0..1e6f64, ideal in 1.0..1e6f64) {
        let higher = relative_gap(real, ideal, false);
        let lower = relative_gap(real, ideal, true);
        prop_assert_eq!(higher, -lower);
    }

    #[test]
    fn recommendations_are_bounded_and_sorted(x in decision_vector(), seed in any::<u64>()) {
        let simulation = simulate_seeded(&OperationalParameters::default(), &small_run(), seed);
        let optimal = optimize(&x, &IdealGoals::default(), &[], false).expect("direct");
        let matrix = compare_models(Some(&simulation), Some(&optimal));
        let recommendations = build_recommendations(&matrix);
        prop_assert!(recommendations.len() <= 4);
        for pair in recommendations.windows(2) {
            prop_assert!(pair[0].priority >= pair[1].priority);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn solver_results_respect_bounds_and_constraints(
        x in decision_vector(),
        coverage in 0.0..1.0f64,
        quality in 0.0..0.95f64,
        sustainability in 0.0..0.9f64,
    ) {
        let constraints = vec![
            Constraint::new(ConstraintKind::MinCoverage, coverage),
            Constraint::new(ConstraintKind::MinQuality, quality),
            Constraint::new(ConstraintKind::MinSustainability, sustainability),
        ];
        let result = optimize(&x, &IdealGoals::default(), &constraints, true);
        prop_assert!(result.is_some(), "feasible thresholds resolved to no configuration");
        let result = result.expect("checked above");
        prop_assert!(within_bounds(&result.configuration, &DECISION_BOUNDS));
        prop_assert!(satisfies_all(&result.configuration, &constraints, 0.0));
    }

    #[test]
    fn thresholds_above_the_box_are_empty(excess in 0.001..1.0f64) {
        let constraints = vec![Constraint::new(ConstraintKind::MinCoverage, 1.0 + excess)];
        let result = optimize(&DecisionVector::default(), &IdealGoals::default(), &constraints, true);
        prop_assert!(result.is_none());
    }
}
