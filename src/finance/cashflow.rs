use serde::{Deserialize, Serialize};

use crate::params::OperationalParameters;

/// Monthly efficiency gain from operating experience.
const LEARNING_RATE: f64 = 0.005;
const IRR_MAX_ITERATIONS: usize = 200;
const IRR_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CashFlowOptions {
    #[serde(default = "default_horizon_months")]
    pub horizon_months: u32,
    /// Compounded once per projected month.
    #[serde(default = "default_monthly_inflation")]
    pub monthly_inflation: f64,
    #[serde(default = "default_annual_discount_rate")]
    pub annual_discount_rate: f64,
}

impl Default for CashFlowOptions {
    fn default() -> Self {
        Self {
            horizon_months: default_horizon_months(),
            monthly_inflation: default_monthly_inflation(),
            annual_discount_rate: default_annual_discount_rate(),
        }
    }
}

fn default_horizon_months() -> u32 {
    60
}

fn default_monthly_inflation() -> f64 {
    0.04
}

fn default_annual_discount_rate() -> f64 {
    0.12
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CashFlowMonth {
    pub month: u32,
    pub attendances: f64,
    pub revenue: f64,
    pub fixed_cost: f64,
    pub variable_cost: f64,
    pub total_cost: f64,
    pub net_flow: f64,
    pub discounted_flow: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CashFlowProjection {
    pub initial_investment: f64,
    pub months: Vec<CashFlowMonth>,
    pub npv: f64,
    /// Monthly internal rate of return.
    pub irr: Option<f64>,
    /// First month (1-based) in which the discounted cumulative flow recovers
    /// the vehicle investment.
    pub discounted_payback_month: Option<u32>,
}

pub fn project_cash_flow(
    params: &OperationalParameters,
    options: &CashFlowOptions,
) -> CashFlowProjection {
    let monthly_discount = (1.0 + options.annual_discount_rate).powf(1.0 / 12.0) - 1.0;
    let initial_investment = params.costs.vehicle_cost;
    let days = f64::from(params.capacity.days_per_month);

    let mut months = Vec::with_capacity(options.horizon_months as usize);
    for month in 0..options.horizon_months {
        let m = f64::from(month);
        let inflation = (1.0 + options.monthly_inflation).powf(m);
        let fixed_cost = params.costs.fixed_monthly * inflation;
        let unit_variable = params.costs.variable_per_patient * inflation;
        let unit_price = params.costs.unit_cost_per_visit * inflation;

        let efficiency = (params.capacity.efficiency * (1.0 + LEARNING_RATE * m)).min(1.0);
        let attendances = params.capacity.patients_per_day * efficiency * days;

        let revenue = attendances * unit_price;
        let variable_cost = attendances * unit_variable;
        let total_cost = fixed_cost + variable_cost;
        let net_flow = revenue - total_cost;
        let discounted_flow = net_flow / (1.0 + monthly_discount).powf(m);

        months.push(CashFlowMonth {
            month,
            attendances,
            revenue,
            fixed_cost,
            variable_cost,
            total_cost,
            net_flow,
            discounted_flow,
        });
    }

    let npv = -initial_investment + months.iter().map(|m| m.discounted_flow).sum::<f64>();

    let mut flows = Vec::with_capacity(months.len() + 1);
    flows.push(-initial_investment);
    flows.extend(months.iter().map(|m| m.net_flow));
    let irr = internal_rate_of_return(&flows);

    let mut cumulative = -initial_investment;
    let mut discounted_payback_month = None;
    for (idx, month) in months.iter().enumerate() {
        cumulative += month.discounted_flow;
        if cumulative >= 0.0 {
            discounted_payback_month = Some(idx as u32 + 1);
            break;
        }
    }

    CashFlowProjection {
        initial_investment,
        months,
        npv,
        irr,
        discounted_payback_month,
    }
}

/// Net present value of `flows` (period 0 first) at a per-period `rate`.
pub fn net_present_value(rate: f64, flows: &[f64]) -> f64 {
    flows
        .iter()
        .enumerate()
        .map(|(t, flow)| flow / (1.0 + rate).powi(t as i32))
        .sum()
}

/// Per-period rate at which the NPV of `flows` is zero, found by bisection.
/// `None` when the NPV does not change sign over the search interval.
pub fn internal_rate_of_return(flows: &[f64]) -> Option<f64> {
    if flows.len() < 2 {
        return None;
    }
    let mut lo = -0.99;
    let mut hi = 10.0;
    let mut f_lo = net_present_value(lo, flows);
    let f_hi = net_present_value(hi, flows);
    if !f_lo.is_finite() || !f_hi.is_finite() || f_lo.signum() == f_hi.signum() {
        return None;
    }

    for _ in 0..IRR_MAX_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        let f_mid = net_present_value(mid, flows);
        if f_mid.abs() < IRR_TOLERANCE || (hi - lo) < IRR_TOLERANCE {
            return Some(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    Some(0.5 * (lo + hi))
}
