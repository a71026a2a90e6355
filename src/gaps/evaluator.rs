use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::gaps::{GapEntry, GapMatrix, Indicator, Priority};
use crate::optimizer::OptimalConfigurationResult;
use crate::simulation::SimulationResult;

pub const HIGH_PRIORITY_GAP: f64 = 0.5;
pub const MEDIUM_PRIORITY_GAP: f64 = 0.2;

/// `(real - ideal) / ideal`, zero when the ideal is zero. The sign is
/// inverted when lower real values are better so that positive always
/// reads as better than ideal.
pub fn relative_gap(real: f64, ideal: f64, lower_is_better: bool) -> f64 {
    if ideal == 0.0 {
        return 0.0;
    }
    let gap = (real - ideal) / ideal;
    if lower_is_better {
        -gap
    } else {
        gap
    }
}

/// Tier of a gap by magnitude. A NaN gap is treated as the most severe.
pub fn classify_priority(gap: f64) -> Priority {
    let magnitude = gap.abs();
    if magnitude.is_nan() || magnitude >= HIGH_PRIORITY_GAP {
        Priority::High
    } else if magnitude >= MEDIUM_PRIORITY_GAP {
        Priority::Medium
    } else {
        Priority::Low
    }
}

fn entry(real: f64, ideal: f64, indicator: Indicator) -> GapEntry {
    let gap = relative_gap(real, ideal, indicator.lower_is_better());
    GapEntry {
        real,
        ideal,
        gap,
        priority: classify_priority(gap),
    }
}

/// Compares the empirical run against the ideal configuration.
///
/// Real values come from the simulation (mean coverage, the configured
/// efficiency, mean cost per attention, mean sustainability); ideal values
/// from the resolved configuration and the financial sustainability goal.
/// Either input missing or empty yields an empty matrix.
pub fn compare_models(
    simulation: Option<&SimulationResult>,
    optimal: Option<&OptimalConfigurationResult>,
) -> GapMatrix {
    let (Some(simulation), Some(optimal)) = (simulation, optimal) else {
        info!(
            has_simulation = simulation.is_some(),
            has_configuration = optimal.is_some(),
            "model comparison skipped, results missing"
        );
        return GapMatrix::default();
    };
    if simulation.is_empty() {
        info!("model comparison skipped, simulation has no trials");
        return GapMatrix::default();
    }

    let ideal = &optimal.configuration;
    let values = [
        (
            Indicator::Coverage,
            simulation.statistics.coverage.mean,
            ideal.coverage_target,
        ),
        (
            Indicator::Efficiency,
            simulation.inputs.capacity.efficiency,
            ideal.efficiency,
        ),
        (
            Indicator::CostEffectiveness,
            simulation.cost_per_attention(),
            ideal.unit_cost,
        ),
        (
            Indicator::Sustainability,
            simulation.statistics.sustainability.mean,
            optimal.goals.financial.min_sustainability,
        ),
    ];

    let entries: BTreeMap<Indicator, GapEntry> = values
        .into_iter()
        .map(|(indicator, real, ideal)| (indicator, entry(real, ideal, indicator)))
        .collect();
    for (indicator, gap) in &entries {
        debug!(%indicator, gap = gap.gap, priority = %gap.priority, "gap computed");
    }
    GapMatrix { entries }
}
