pub mod equity;

use serde::{Deserialize, Serialize};

use crate::optimizer::objective::sustainability;
use crate::optimizer::{DecisionVector, IdealGoals};

pub use equity::{effective_coverage, equity_index, regions_from_columns, IndicatorError, Region};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CoverageIndicators {
    pub population_target: f64,
    pub visit_frequency: f64,
    /// Minutes; `None` when nothing is covered.
    pub max_access_time: Option<f64>,
    pub satisfaction: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OperationIndicators {
    pub capacity: f64,
    pub efficiency: f64,
    pub first_level_resolution: f64,
    /// Minutes; `None` at zero efficiency.
    pub max_wait_time: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FinancialIndicators {
    pub unit_cost: f64,
    pub sustainability: f64,
    pub self_financing: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct QualityIndicators {
    pub care_continuity: f64,
    pub record_integration: f64,
    pub effective_referral: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PerformanceIndicators {
    pub coverage: CoverageIndicators,
    pub operation: OperationIndicators,
    pub financial: FinancialIndicators,
    pub quality: QualityIndicators,
}

fn positive_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator)
}

/// Expected indicator values of a configuration, capped by the goals where
/// the goal is an upper reference.
pub fn performance_indicators(x: &DecisionVector, goals: &IdealGoals) -> PerformanceIndicators {
    let service_quality = 0.7 + 0.3 * x.efficiency;
    let ratio = sustainability(x);

    PerformanceIndicators {
        coverage: CoverageIndicators {
            population_target: x.coverage_target,
            visit_frequency: goals.coverage.visit_frequency * x.coverage_target,
            max_access_time: positive_ratio(goals.coverage.max_access_time, x.coverage_target),
            satisfaction: goals.coverage.min_satisfaction.min(service_quality),
        },
        operation: OperationIndicators {
            capacity: x.capacity_daily,
            efficiency: x.efficiency,
            first_level_resolution: goals.operation.first_level_resolution.min(service_quality),
            max_wait_time: positive_ratio(goals.operation.max_wait_time, x.efficiency),
        },
        financial: FinancialIndicators {
            unit_cost: x.unit_cost,
            sustainability: ratio,
            self_financing: ratio.min(1.0),
        },
        quality: QualityIndicators {
            care_continuity: goals.quality.care_continuity.min(0.9 * x.coverage_target),
            record_integration: goals.quality.record_integration,
            effective_referral: goals.quality.effective_referral.min(0.8 + 0.2 * x.efficiency),
        },
    }
}

/// Health indicators of the served territory before mobile units operate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HealthBaseline {
    /// Deaths per 1,000 live births.
    pub infant_mortality: f64,
    pub vaccination_coverage: f64,
    pub primary_care_access: f64,
}

impl Default for HealthBaseline {
    fn default() -> Self {
        Self {
            infant_mortality: 18.0,
            vaccination_coverage: 0.68,
            primary_care_access: 0.42,
        }
    }
}

pub type HealthImpact = HealthBaseline;

const MAX_VACCINATION_GAIN: f64 = 0.27;
const VACCINATION_CEILING: f64 = 0.95;
const MAX_ACCESS_GAIN: f64 = 0.48;
const ACCESS_CEILING: f64 = 0.9;

/// Projects the baseline forward given the relative change in coverage.
pub fn project_health_impact(
    initial_coverage: f64,
    projected_coverage: f64,
    baseline: &HealthBaseline,
) -> HealthImpact {
    let increase = if initial_coverage > 0.0 {
        (projected_coverage - initial_coverage) / initial_coverage
    } else {
        projected_coverage
    };

    let mortality_reduction = 0.3 * increase.min(1.0);
    let vaccination_gain = (0.5 * increase).min(MAX_VACCINATION_GAIN);
    let access_gain = (0.7 * increase).min(MAX_ACCESS_GAIN);

    HealthImpact {
        infant_mortality: (baseline.infant_mortality * (1.0 - mortality_reduction)).max(0.0),
        vaccination_coverage: (baseline.vaccination_coverage + vaccination_gain)
            .clamp(0.0, VACCINATION_CEILING),
        primary_care_access: (baseline.primary_care_access + access_gain).clamp(0.0, ACCESS_CEILING),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicators_of_reference_vector() {
        let goals = IdealGoals::default();
        let indicators = performance_indicators(&DecisionVector::default(), &goals);
        assert!((indicators.coverage.visit_frequency - 1.6).abs() < 1e-12);
        assert!((indicators.coverage.max_access_time.expect("covered") - 75.0).abs() < 1e-9);
        assert!((indicators.coverage.satisfaction - 0.91).abs() < 1e-12);
        assert!((indicators.operation.first_level_resolution - 0.85).abs() < 1e-12);
        assert!((indicators.quality.care_continuity - 0.72).abs() < 1e-12);
        assert!(indicators.financial.self_financing <= 1.0);
    }

    #[test]
    fn zero_coverage_and_efficiency_have_no_times() {
        let x = DecisionVector {
            coverage_target: 0.0,
            efficiency: 0.0,
            ..DecisionVector::default()
        };
        let indicators = performance_indicators(&x, &IdealGoals::default());
        assert_eq!(indicators.coverage.max_access_time, None);
        assert_eq!(indicators.operation.max_wait_time, None);
    }

    #[test]
    fn doubling_coverage_hits_the_caps() {
        let impact = project_health_impact(0.4, 0.8, &HealthBaseline::default());
        assert!((impact.infant_mortality - 18.0 * 0.7).abs() < 1e-9);
        assert!((impact.vaccination_coverage - 0.95).abs() < 1e-12);
        assert!((impact.primary_care_access - 0.9).abs() < 1e-12);
    }

    #[test]
    fn small_gain_moves_indicators_proportionally() {
        let impact = project_health_impact(0.5, 0.55, &HealthBaseline::default());
        assert!((impact.infant_mortality - 18.0 * (1.0 - 0.03)).abs() < 1e-9);
        assert!((impact.vaccination_coverage - 0.73).abs() < 1e-9);
        assert!((impact.primary_care_access - 0.49).abs() < 1e-9);
    }

    #[test]
    fn no_initial_coverage_uses_projected_as_increase() {
        let impact = project_health_impact(0.0, 0.2, &HealthBaseline::default());
        assert!((impact.infant_mortality - 18.0 * (1.0 - 0.06)).abs() < 1e-9);
    }
}
