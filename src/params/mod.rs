pub mod services;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use services::{ServiceMix, ServiceType};

#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("trial count must be a positive integer")]
    ZeroTrials,
    #[error("time horizon must be a positive number of months")]
    ZeroHorizon,
    #[error("unknown parameter field: {0}")]
    UnknownField(String),
}

/// Operating data of one mobile health unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationalParameters {
    #[serde(default)]
    pub capacity: Capacity,
    #[serde(default)]
    pub costs: CostStructure,
    #[serde(default)]
    pub staffing: Staffing,
    #[serde(default)]
    pub services: ServiceMix,
    #[serde(default)]
    pub coverage: CoverageArea,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Capacity {
    pub patients_per_day: f64,
    pub days_per_month: u32,
    /// Share of the nominal daily capacity actually delivered, in [0, 1].
    pub efficiency: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostStructure {
    pub fixed_monthly: f64,
    pub variable_per_patient: f64,
    pub annual_maintenance: f64,
    /// Revenue collected per attended visit.
    pub unit_cost_per_visit: f64,
    pub vehicle_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Staffing {
    pub physicians: u32,
    pub nurses: u32,
    pub drivers: u32,
    pub monthly_staff_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoverageArea {
    pub target_population: f64,
    pub visits_per_month: f64,
    pub radius_km: f64,
    pub population_density: f64,
}

impl Default for OperationalParameters {
    fn default() -> Self {
        Self {
            capacity: Capacity::default(),
            costs: CostStructure::default(),
            staffing: Staffing::default(),
            services: ServiceMix::default(),
            coverage: CoverageArea::default(),
        }
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Self {
            patients_per_day: 24.0,
            days_per_month: 20,
            efficiency: 0.4,
        }
    }
}

impl Default for CostStructure {
    fn default() -> Self {
        Self {
            fixed_monthly: 17_291_667.0,
            variable_per_patient: 45_000.0,
            annual_maintenance: 20_750_000.0,
            unit_cost_per_visit: 103_750.0,
            vehicle_cost: 580_000_000.0,
        }
    }
}

impl Default for Staffing {
    fn default() -> Self {
        Self {
            physicians: 1,
            nurses: 1,
            drivers: 1,
            monthly_staff_cost: 8_500_000.0,
        }
    }
}

impl Default for CoverageArea {
    fn default() -> Self {
        Self {
            target_population: 10_000.0,
            visits_per_month: 1.0,
            radius_km: 50.0,
            population_density: 15.0,
        }
    }
}

impl Capacity {
    /// Patients that can actually be attended per day.
    pub fn effective_daily(&self) -> f64 {
        self.patients_per_day * self.efficiency
    }
}

impl OperationalParameters {
    pub fn value(&self, field: ParameterField) -> f64 {
        match field {
            ParameterField::PatientsPerDay => self.capacity.patients_per_day,
            ParameterField::DaysPerMonth => f64::from(self.capacity.days_per_month),
            ParameterField::Efficiency => self.capacity.efficiency,
            ParameterField::FixedMonthlyCost => self.costs.fixed_monthly,
            ParameterField::VariableCostPerPatient => self.costs.variable_per_patient,
            ParameterField::AnnualMaintenance => self.costs.annual_maintenance,
            ParameterField::UnitCost => self.costs.unit_cost_per_visit,
            ParameterField::VehicleCost => self.costs.vehicle_cost,
            ParameterField::MonthlyStaffCost => self.staffing.monthly_staff_cost,
            ParameterField::TargetPopulation => self.coverage.target_population,
            ParameterField::VisitsPerMonth => self.coverage.visits_per_month,
            ParameterField::CoverageRadius => self.coverage.radius_km,
            ParameterField::PopulationDensity => self.coverage.population_density,
        }
    }

    /// Sets one numeric field. Integral fields are rounded and floored at zero.
    pub fn set(&mut self, field: ParameterField, to: f64) {
        match field {
            ParameterField::PatientsPerDay => self.capacity.patients_per_day = to,
            ParameterField::DaysPerMonth => self.capacity.days_per_month = to_count(to),
            ParameterField::Efficiency => self.capacity.efficiency = to,
            ParameterField::FixedMonthlyCost => self.costs.fixed_monthly = to,
            ParameterField::VariableCostPerPatient => self.costs.variable_per_patient = to,
            ParameterField::AnnualMaintenance => self.costs.annual_maintenance = to,
            ParameterField::UnitCost => self.costs.unit_cost_per_visit = to,
            ParameterField::VehicleCost => self.costs.vehicle_cost = to,
            ParameterField::MonthlyStaffCost => self.staffing.monthly_staff_cost = to,
            ParameterField::TargetPopulation => self.coverage.target_population = to,
            ParameterField::VisitsPerMonth => self.coverage.visits_per_month = to,
            ParameterField::CoverageRadius => self.coverage.radius_km = to,
            ParameterField::PopulationDensity => self.coverage.population_density = to,
        }
    }

    /// Returns a copy with `field` scaled by `1 + variation`.
    pub fn with_variation(&self, field: ParameterField, variation: f64) -> Self {
        let mut varied = self.clone();
        varied.set(field, self.value(field) * (1.0 + variation));
        varied
    }

    /// Human-readable notes about degenerate values. None of them are fatal:
    /// the simulator clamps every derived metric at zero.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        for field in ParameterField::ALL {
            let value = self.value(field);
            if !value.is_finite() {
                out.push(format!("{field} is not a finite number"));
            } else if value < 0.0 {
                out.push(format!("{field} is negative ({value})"));
            }
        }
        if self.capacity.efficiency > 1.0 {
            out.push(format!(
                "efficiency above 1.0 ({}) exceeds nominal capacity",
                self.capacity.efficiency
            ));
        }
        out
    }
}

fn to_count(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

/// Monte Carlo run settings. Both counts are positive by construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawSimulationParameters")]
pub struct SimulationParameters {
    trials: u32,
    horizon_months: u32,
}

#[derive(Deserialize)]
struct RawSimulationParameters {
    trials: u32,
    horizon_months: u32,
}

impl TryFrom<RawSimulationParameters> for SimulationParameters {
    type Error = ParamError;

    fn try_from(raw: RawSimulationParameters) -> Result<Self, Self::Error> {
        Self::new(raw.trials, raw.horizon_months)
    }
}

impl SimulationParameters {
    pub fn new(trials: u32, horizon_months: u32) -> Result<Self, ParamError> {
        if trials == 0 {
            return Err(ParamError::ZeroTrials);
        }
        if horizon_months == 0 {
            return Err(ParamError::ZeroHorizon);
        }
        Ok(Self {
            trials,
            horizon_months,
        })
    }

    pub fn trials(&self) -> u32 {
        self.trials
    }

    pub fn horizon_months(&self) -> u32 {
        self.horizon_months
    }
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            trials: 1000,
            horizon_months: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ParameterField {
    PatientsPerDay,
    DaysPerMonth,
    Efficiency,
    FixedMonthlyCost,
    VariableCostPerPatient,
    AnnualMaintenance,
    UnitCost,
    VehicleCost,
    MonthlyStaffCost,
    TargetPopulation,
    VisitsPerMonth,
    CoverageRadius,
    PopulationDensity,
}

impl ParameterField {
    pub const ALL: [ParameterField; 13] = [
        ParameterField::PatientsPerDay,
        ParameterField::DaysPerMonth,
        ParameterField::Efficiency,
        ParameterField::FixedMonthlyCost,
        ParameterField::VariableCostPerPatient,
        ParameterField::AnnualMaintenance,
        ParameterField::UnitCost,
        ParameterField::VehicleCost,
        ParameterField::MonthlyStaffCost,
        ParameterField::TargetPopulation,
        ParameterField::VisitsPerMonth,
        ParameterField::CoverageRadius,
        ParameterField::PopulationDensity,
    ];
}

impl Display for ParameterField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::PatientsPerDay => "patients_per_day",
            Self::DaysPerMonth => "days_per_month",
            Self::Efficiency => "efficiency",
            Self::FixedMonthlyCost => "fixed_monthly",
            Self::VariableCostPerPatient => "variable_per_patient",
            Self::AnnualMaintenance => "annual_maintenance",
            Self::UnitCost => "unit_cost_per_visit",
            Self::VehicleCost => "vehicle_cost",
            Self::MonthlyStaffCost => "monthly_staff_cost",
            Self::TargetPopulation => "target_population",
            Self::VisitsPerMonth => "visits_per_month",
            Self::CoverageRadius => "radius_km",
            Self::PopulationDensity => "population_density",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ParameterField {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let field = match normalized.as_str() {
            "patients_per_day" | "capacity" | "daily_capacity" => Self::PatientsPerDay,
            "days_per_month" | "days" => Self::DaysPerMonth,
            "efficiency" => Self::Efficiency,
            "fixed_monthly" | "fixed_cost" => Self::FixedMonthlyCost,
            "variable_per_patient" | "variable_cost" => Self::VariableCostPerPatient,
            "annual_maintenance" | "maintenance" => Self::AnnualMaintenance,
            "unit_cost_per_visit" | "unit_cost" | "price" => Self::UnitCost,
            "vehicle_cost" | "vehicle" => Self::VehicleCost,
            "monthly_staff_cost" | "staff_cost" => Self::MonthlyStaffCost,
            "target_population" | "population" => Self::TargetPopulation,
            "visits_per_month" | "visit_frequency" => Self::VisitsPerMonth,
            "radius_km" | "radius" => Self::CoverageRadius,
            "population_density" | "density" => Self::PopulationDensity,
            _ => return Err(ParamError::UnknownField(s.to_string())),
        };
        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulation_parameters_reject_zero_counts() {
        assert_eq!(SimulationParameters::new(0, 12), Err(ParamError::ZeroTrials));
        assert_eq!(SimulationParameters::new(10, 0), Err(ParamError::ZeroHorizon));
        let params = SimulationParameters::new(10, 12).expect("valid parameters");
        assert_eq!(params.trials(), 10);
        assert_eq!(params.horizon_months(), 12);
    }

    #[test]
    fn simulation_parameters_validate_on_deserialize() {
        let parsed: Result<SimulationParameters, _> =
            serde_json::from_str(r#"{"trials": 0, "horizon_months": 12}"#);
        assert!(parsed.is_err());
        let parsed: SimulationParameters =
            serde_json::from_str(r#"{"trials": 5, "horizon_months": 6}"#).expect("valid json");
        assert_eq!(parsed.trials(), 5);
    }

    #[test]
    fn setters_round_trip_every_field() {
        let mut params = OperationalParameters::default();
        for field in ParameterField::ALL {
            params.set(field, 7.0);
            assert!((params.value(field) - 7.0).abs() < 1e-9, "{field}");
        }
        params.set(ParameterField::DaysPerMonth, -3.0);
        assert_eq!(params.capacity.days_per_month, 0);
    }

    #[test]
    fn parses_field_aliases() {
        assert_eq!(
            ParameterField::from_str("unit-cost").expect("alias"),
            ParameterField::UnitCost
        );
        assert_eq!(
            ParameterField::from_str(&ParameterField::Efficiency.to_string()).expect("display"),
            ParameterField::Efficiency
        );
        assert!(ParameterField::from_str("wheels").is_err());
    }

    #[test]
    fn variation_scales_a_copy() {
        let params = OperationalParameters::default();
        let varied = params.with_variation(ParameterField::PatientsPerDay, 0.5);
        assert!((varied.capacity.patients_per_day - 36.0).abs() < 1e-9);
        assert!((params.capacity.patients_per_day - 24.0).abs() < 1e-9);
    }

    #[test]
    fn warns_about_negative_efficiency() {
        let mut params = OperationalParameters::default();
        assert!(params.warnings().is_empty());
        params.capacity.efficiency = -0.2;
        assert_eq!(params.warnings().len(), 1);
    }
}
