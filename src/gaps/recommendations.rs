use std::cmp::Reverse;

use crate::gaps::{GapEntry, GapMatrix, Indicator, Recommendation};

/// Gaps smaller than this in magnitude produce no recommendation.
pub const RECOMMENDATION_THRESHOLD: f64 = 0.1;

/// One recommendation per indicator with `|gap| >= 0.1`, most severe first.
/// Indicators of equal priority keep matrix order.
pub fn build_recommendations(matrix: &GapMatrix) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = matrix
        .iter()
        .filter(|(_, entry)| entry.gap.is_nan() || entry.gap.abs() >= RECOMMENDATION_THRESHOLD)
        .map(|(indicator, entry)| Recommendation {
            indicator,
            priority: entry.priority,
            text: recommendation_text(indicator, entry),
        })
        .collect();

    recommendations.sort_by_key(|r| Reverse(r.priority));
    recommendations
}

fn recommendation_text(indicator: Indicator, entry: &GapEntry) -> String {
    let pct = entry.gap.abs() * 100.0;
    let behind = entry.gap < 0.0;
    let tag = entry.priority;
    match (indicator, behind) {
        (Indicator::Coverage, true) => format!(
            "[{tag}] Coverage ({:.1}%) is {pct:.1}% below the ideal target ({:.1}%). \
             Increase visit frequency or extend the geographic reach of the units.",
            entry.real * 100.0,
            entry.ideal * 100.0
        ),
        (Indicator::Coverage, false) => format!(
            "[{tag}] Coverage ({:.1}%) exceeds the ideal target ({:.1}%) by {pct:.1}%. \
             Keep the current operating scheme and look for resource savings.",
            entry.real * 100.0,
            entry.ideal * 100.0
        ),
        (Indicator::Efficiency, true) => format!(
            "[{tag}] Operational efficiency ({:.1}%) is {pct:.1}% below the ideal level ({:.1}%). \
             Streamline processes, train staff and review care protocols.",
            entry.real * 100.0,
            entry.ideal * 100.0
        ),
        (Indicator::Efficiency, false) => format!(
            "[{tag}] Operational efficiency ({:.1}%) exceeds the ideal level ({:.1}%) by {pct:.1}%. \
             Document the practices behind it and roll them out to other units.",
            entry.real * 100.0,
            entry.ideal * 100.0
        ),
        (Indicator::CostEffectiveness, true) => format!(
            "[{tag}] Cost per attention (${:.0}) is {pct:.1}% above the ideal (${:.0}). \
             Review the cost structure, optimize routes and look for operating savings.",
            entry.real, entry.ideal
        ),
        (Indicator::CostEffectiveness, false) => format!(
            "[{tag}] Cost per attention (${:.0}) is {pct:.1}% below the ideal threshold (${:.0}). \
             Keep the current cost structure and consider quality improvements.",
            entry.real, entry.ideal
        ),
        (Indicator::Sustainability, true) => format!(
            "[{tag}] Sustainability ratio ({:.2}) is {pct:.1}% below the ideal ({:.2}). \
             Seek additional funding, revise fees and reduce operating costs.",
            entry.real, entry.ideal
        ),
        (Indicator::Sustainability, false) => format!(
            "[{tag}] Sustainability ratio ({:.2}) exceeds the ideal ({:.2}) by {pct:.1}%. \
             Reinvest the surplus in equipment or expanded services.",
            entry.real, entry.ideal
        ),
    }
}
