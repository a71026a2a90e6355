use serde::{Deserialize, Serialize};

use crate::params::OperationalParameters;

/// Vehicle useful life used for straight-line depreciation.
pub const VEHICLE_LIFE_MONTHS: f64 = 60.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostBreakdown {
    pub fixed: f64,
    pub variable: f64,
    pub staff: f64,
    pub depreciation: f64,
    pub maintenance: f64,
    pub total_monthly: f64,
    pub cost_per_attention: Option<f64>,
}

/// Monthly cost components at the given mean monthly demand.
pub fn cost_breakdown(params: &OperationalParameters, mean_monthly_demand: f64) -> CostBreakdown {
    let fixed = params.costs.fixed_monthly;
    let variable = mean_monthly_demand * params.costs.variable_per_patient;
    let staff = params.staffing.monthly_staff_cost;
    let depreciation = params.costs.vehicle_cost / VEHICLE_LIFE_MONTHS;
    let maintenance = params.costs.annual_maintenance / 12.0;
    let total_monthly = fixed + variable + staff + depreciation + maintenance;
    let cost_per_attention = if mean_monthly_demand > 0.0 {
        Some(total_monthly / mean_monthly_demand)
    } else {
        None
    };

    CostBreakdown {
        fixed,
        variable,
        staff,
        depreciation,
        maintenance,
        total_monthly,
        cost_per_attention,
    }
}
