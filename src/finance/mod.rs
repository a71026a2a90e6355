//! Cost and financial primitives shared by the simulator, the optimizer and
//! the cash-flow projection.

pub mod breakdown;
pub mod cashflow;

pub use breakdown::{cost_breakdown, CostBreakdown};
pub use cashflow::{project_cash_flow, CashFlowMonth, CashFlowOptions, CashFlowProjection};

/// Total monthly operating cost for a number of attendances.
pub fn total_cost(attendances: f64, fixed_cost: f64, variable_cost: f64) -> f64 {
    fixed_cost + attendances * variable_cost
}

/// Attendances needed to cover fixed costs. `None` when each attendance does
/// not earn more than it costs.
pub fn break_even_point(fixed_cost: f64, variable_cost: f64, unit_price: f64) -> Option<f64> {
    if unit_price <= variable_cost {
        return None;
    }
    Some(fixed_cost / (unit_price - variable_cost))
}

/// Revenue over cost. `None` when there is no cost to recover.
pub fn sustainability_ratio(revenue: f64, cost: f64) -> Option<f64> {
    if cost == 0.0 {
        return None;
    }
    Some(revenue / cost)
}

/// Revenue over cost with both sides guarded: revenue is floored at zero and
/// cost at one, so the ratio is always finite and non-negative.
pub fn guarded_sustainability(revenue: f64, cost: f64) -> f64 {
    non_negative(revenue) / cost.max(1.0)
}

/// `value` when it is a positive number, zero otherwise (NaN included).
pub fn non_negative(value: f64) -> f64 {
    if value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_cost_adds_variable_component() {
        assert!((total_cost(192.0, 1_000.0, 10.0) - 2_920.0).abs() < 1e-9);
    }

    #[test]
    fn break_even_requires_positive_margin() {
        assert!(break_even_point(1_000.0, 50.0, 50.0).is_none());
        assert!(break_even_point(1_000.0, 50.0, 40.0).is_none());
        let units = break_even_point(1_000.0, 50.0, 150.0).expect("positive margin");
        assert!((units - 10.0).abs() < 1e-9);
    }

    #[test]
    fn sustainability_ratio_rejects_zero_cost() {
        assert!(sustainability_ratio(10.0, 0.0).is_none());
        assert_eq!(sustainability_ratio(10.0, 5.0), Some(2.0));
    }

    #[test]
    fn guarded_sustainability_never_negative_or_infinite() {
        assert_eq!(guarded_sustainability(-10.0, 5.0), 0.0);
        assert_eq!(guarded_sustainability(10.0, 0.0), 10.0);
        assert_eq!(guarded_sustainability(10.0, -4.0), 10.0);
        assert_eq!(guarded_sustainability(f64::NAN, 2.0), 0.0);
    }
}
