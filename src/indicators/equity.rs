use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::simulation::SEMESTER_REVISIT_MONTHS;

#[derive(Debug, Error, PartialEq)]
pub enum IndicatorError {
    #[error("{field} has {actual} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// One served region.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Region {
    pub population: f64,
    /// Attentions the units can give per month in the region.
    pub capacity: f64,
    /// Average travel time to the nearest health center, in hours.
    pub distance_hours: f64,
}

fn ensure_len(field: &'static str, expected: usize, actual: usize) -> Result<(), IndicatorError> {
    if expected == actual {
        Ok(())
    } else {
        Err(IndicatorError::LengthMismatch {
            field,
            expected,
            actual,
        })
    }
}

/// `1 - Gini` of the served population across regions, from the trapezoidal
/// area under the Lorenz curve. 1 is perfect equity; no population yields 0.
pub fn equity_index(population: &[f64], coverage: &[f64]) -> Result<f64, IndicatorError> {
    ensure_len("coverage", population.len(), coverage.len())?;

    let mut regions: Vec<(f64, f64)> = population
        .iter()
        .zip(coverage)
        .map(|(p, c)| (p.max(0.0), (p * c).max(0.0)))
        .collect();
    let rate = |(p, served): &(f64, f64)| if *p > 0.0 { served / p } else { 0.0 };
    regions.sort_by(|a, b| rate(a).total_cmp(&rate(b)));

    let total_population: f64 = regions.iter().map(|(p, _)| p).sum();
    let total_served: f64 = regions.iter().map(|(_, s)| s).sum();
    if total_population <= 0.0 || total_served <= 0.0 {
        return Ok(0.0);
    }

    let mut served_so_far = 0.0;
    let mut area = 0.0;
    for (p, served) in regions {
        let before = served_so_far / total_served;
        served_so_far += served;
        let after = served_so_far / total_served;
        area += (p / total_population) * (before + after) / 2.0;
    }
    let gini = 1.0 - 2.0 * area;
    Ok((1.0 - gini).clamp(0.0, 1.0))
}

/// Per-region coverage: capacity relative to the semester revisit demand,
/// discounted by `1 / (1 + distance_hours)` and capped at 1.
pub fn effective_coverage(regions: &[Region]) -> Vec<f64> {
    regions
        .iter()
        .map(|region| {
            let capacity_ratio = if region.population > 0.0 {
                (region.capacity / (region.population / SEMESTER_REVISIT_MONTHS)).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let distance_factor = 1.0 / (1.0 + region.distance_hours.max(0.0));
            (capacity_ratio * distance_factor).min(1.0)
        })
        .collect()
}

/// Builds regions from parallel columns.
pub fn regions_from_columns(
    population: &[f64],
    capacity: &[f64],
    distance_hours: &[f64],
) -> Result<Vec<Region>, IndicatorError> {
    ensure_len("capacity", population.len(), capacity.len())?;
    ensure_len("distance_hours", population.len(), distance_hours.len())?;
    Ok(population
        .iter()
        .zip(capacity)
        .zip(distance_hours)
        .map(|((&population, &capacity), &distance_hours)| Region {
            population,
            capacity,
            distance_hours,
        })
        .collect())
}
