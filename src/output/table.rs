use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::finance::{CashFlowProjection, CostBreakdown};
use crate::gaps::{GapMatrix, Priority, Recommendation};
use crate::indicators::{HealthImpact, PerformanceIndicators};
use crate::optimizer::{OptimalConfigurationResult, WhatIfComparison};
use crate::simulation::sensitivity::{ScenarioOutcome, SensitivityResult};
use crate::simulation::{Metric, SimulationResult};

fn new_table<T: ToString>(header: Vec<T>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.into_iter().map(|h| h.to_string()).collect::<Vec<_>>());
    table
}

fn optional(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{v:.precision$}"))
        .unwrap_or_else(|| "-".to_string())
}

fn priority_cell(priority: Priority) -> Cell {
    let color = match priority {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    };
    Cell::new(priority.to_string()).fg(color)
}

pub fn render_simulation_table(result: &SimulationResult) -> String {
    let mut table = new_table(vec![
        "Metric", "Mean", "Median", "Std Dev", "Min", "Max", "P25", "P75", "95% CI",
    ]);
    for metric in Metric::ALL {
        let s = result.stats(metric);
        let precision: usize = match metric {
            Metric::Coverage | Metric::Sustainability => 4,
            Metric::Demand => 1,
            Metric::Cost => 0,
        };
        table.add_row(vec![
            metric.to_string(),
            format!("{:.precision$}", s.mean),
            format!("{:.precision$}", s.median),
            format!("{:.precision$}", s.std_dev),
            format!("{:.precision$}", s.min),
            format!("{:.precision$}", s.max),
            format!("{:.precision$}", s.p25),
            format!("{:.precision$}", s.p75),
            format!("{:.precision$} - {:.precision$}", s.ci95_low, s.ci95_high),
        ]);
    }
    format!(
        "{table}\nTrials: {}  Horizon: {} months  Cost per attention: {:.0}",
        result.parameters.trials(),
        result.parameters.horizon_months(),
        result.cost_per_attention()
    )
}

pub fn render_optimization_table(result: &OptimalConfigurationResult) -> String {
    let x = &result.configuration;
    let d = &result.derived;
    let mut table = new_table(vec!["Variable", "Value"]);
    let rows = [
        ("Daily capacity", format!("{:.2}", x.capacity_daily)),
        ("Efficiency", format!("{:.3}", x.efficiency)),
        ("Coverage target", format!("{:.3}", x.coverage_target)),
        ("Unit cost", format!("{:.0}", x.unit_cost)),
        ("Monthly attendances", format!("{:.1}", d.monthly_attendances)),
        ("Covered population", format!("{:.0}", d.covered_population)),
        ("Units per 100k", format!("{:.2}", d.units_per_100k)),
        ("Total monthly cost", format!("{:.0}", d.total_monthly_cost)),
        ("Cost per capita", format!("{:.0}", d.cost_per_capita)),
    ];
    for (name, value) in rows {
        table.add_row(vec![name.to_string(), value]);
    }

    let mut compliance = new_table(vec!["Indicator", "Actual", "Goal", "Compliance"]);
    for (indicator, detail) in &result.compliance.details {
        compliance.add_row(vec![
            format!("{}/{}", indicator.category(), indicator),
            format!("{:.3}", detail.actual),
            format!("{:.3}", detail.goal),
            format!("{:.1}%", detail.compliance * 100.0),
        ]);
    }
    for (category, score) in &result.compliance.categories {
        compliance.add_row(vec![
            category.to_string(),
            "-".to_string(),
            "-".to_string(),
            format!("{:.1}%", score * 100.0),
        ]);
    }

    let solver = result
        .solver
        .map(|s| {
            format!(
                "Solver: {} iterations, converged {}, objective {:.4}{}",
                s.iterations,
                s.converged,
                s.objective,
                if s.restored { ", feasibility restored" } else { "" }
            )
        })
        .unwrap_or_else(|| "Direct mode: initial configuration accepted as given".to_string());

    format!(
        "{table}\n{compliance}\nGlobal compliance: {:.1}%\n{solver}",
        result.compliance.global * 100.0
    )
}

pub fn render_gap_table(matrix: &GapMatrix) -> String {
    if matrix.is_empty() {
        return "No comparison available: both models need results.".to_string();
    }
    let mut table = new_table(vec!["Indicator", "Real", "Ideal", "Gap", "Priority"]);
    for (indicator, entry) in matrix.iter() {
        table.add_row(Row::from(vec![
            Cell::new(indicator.to_string()),
            Cell::new(format!("{:.4}", entry.real)),
            Cell::new(format!("{:.4}", entry.ideal)),
            Cell::new(format!("{:+.1}%", entry.gap * 100.0)),
            priority_cell(entry.priority),
        ]));
    }
    table.to_string()
}

pub fn render_recommendations_table(recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return "No recommendations: every gap is below 10%.".to_string();
    }
    let mut table = new_table(vec!["#", "Priority", "Indicator", "Recommendation"]);
    for (idx, rec) in recommendations.iter().enumerate() {
        table.add_row(Row::from(vec![
            Cell::new((idx + 1).to_string()),
            priority_cell(rec.priority),
            Cell::new(rec.indicator.to_string()),
            Cell::new(&rec.text),
        ]));
    }
    table.to_string()
}

pub fn render_cashflow_table(projection: &CashFlowProjection) -> String {
    let mut table = new_table(vec![
        "Month",
        "Attendances",
        "Revenue",
        "Total cost",
        "Net flow",
        "Discounted",
    ]);
    for month in &projection.months {
        table.add_row(vec![
            month.month.to_string(),
            format!("{:.0}", month.attendances),
            format!("{:.0}", month.revenue),
            format!("{:.0}", month.total_cost),
            format!("{:.0}", month.net_flow),
            format!("{:.0}", month.discounted_flow),
        ]);
    }
    format!(
        "{table}\nInitial investment: {:.0}\nNPV: {:.0}\nMonthly IRR: {}\nDiscounted payback month: {}",
        projection.initial_investment,
        projection.npv,
        projection
            .irr
            .map(|r| format!("{:.2}%", r * 100.0))
            .unwrap_or_else(|| "-".to_string()),
        projection
            .discounted_payback_month
            .map(|m| m.to_string())
            .unwrap_or_else(|| "never".to_string())
    )
}

pub fn render_breakdown_table(breakdown: &CostBreakdown) -> String {
    let mut table = new_table(vec!["Component", "Monthly", "Share"]);
    let share = |value: f64| {
        if breakdown.total_monthly > 0.0 {
            format!("{:.1}%", value / breakdown.total_monthly * 100.0)
        } else {
            "-".to_string()
        }
    };
    for (name, value) in [
        ("Fixed", breakdown.fixed),
        ("Variable", breakdown.variable),
        ("Staff", breakdown.staff),
        ("Depreciation", breakdown.depreciation),
        ("Maintenance", breakdown.maintenance),
    ] {
        table.add_row(vec![name.to_string(), format!("{value:.0}"), share(value)]);
    }
    format!(
        "{table}\nTotal monthly: {:.0}\nCost per attention: {}",
        breakdown.total_monthly,
        optional(breakdown.cost_per_attention, 0)
    )
}

pub fn render_sensitivity_table(result: &SensitivityResult) -> String {
    let mut table = new_table(vec![
        result.field.to_string(),
        "Demand".to_string(),
        "Cost".to_string(),
        "Coverage".to_string(),
        "Sustainability".to_string(),
    ]);
    for point in &result.points {
        table.add_row(vec![
            format!("{:.4}", point.value),
            format!("{:.1}", point.outcome.demand),
            format!("{:.0}", point.outcome.cost),
            format!("{:.4}", point.outcome.coverage),
            format!("{:.4}", point.outcome.sustainability),
        ]);
    }
    format!("{table}\nBaseline {}: {:.4}", result.field, result.baseline)
}

pub fn render_scenarios_table(outcomes: &[ScenarioOutcome]) -> String {
    let mut table = new_table(vec![
        "Scenario",
        "Demand",
        "Cost",
        "Coverage",
        "Sustainability",
    ]);
    for scenario in outcomes {
        let sustainable = scenario.outcome.sustainability >= 1.0;
        table.add_row(Row::from(vec![
            Cell::new(&scenario.name),
            Cell::new(format!("{:.1}", scenario.outcome.demand)),
            Cell::new(format!("{:.0}", scenario.outcome.cost)),
            Cell::new(format!("{:.4}", scenario.outcome.coverage)),
            Cell::new(format!("{:.4}", scenario.outcome.sustainability)).fg(if sustainable {
                Color::Green
            } else {
                Color::Red
            }),
        ]));
    }
    table.to_string()
}

pub fn render_indicators_table(indicators: &PerformanceIndicators, impact: &HealthImpact) -> String {
    let mut table = new_table(vec!["Category", "Indicator", "Value"]);
    let rows = [
        ("coverage", "population_target", format!("{:.3}", indicators.coverage.population_target)),
        ("coverage", "visit_frequency", format!("{:.2}", indicators.coverage.visit_frequency)),
        ("coverage", "max_access_time", optional(indicators.coverage.max_access_time, 1)),
        ("coverage", "satisfaction", format!("{:.3}", indicators.coverage.satisfaction)),
        ("operation", "capacity", format!("{:.2}", indicators.operation.capacity)),
        ("operation", "efficiency", format!("{:.3}", indicators.operation.efficiency)),
        (
            "operation",
            "first_level_resolution",
            format!("{:.3}", indicators.operation.first_level_resolution),
        ),
        ("operation", "max_wait_time", optional(indicators.operation.max_wait_time, 1)),
        ("financial", "unit_cost", format!("{:.0}", indicators.financial.unit_cost)),
        ("financial", "sustainability", format!("{:.3}", indicators.financial.sustainability)),
        ("financial", "self_financing", format!("{:.3}", indicators.financial.self_financing)),
        ("quality", "care_continuity", format!("{:.3}", indicators.quality.care_continuity)),
        ("quality", "record_integration", format!("{:.3}", indicators.quality.record_integration)),
        ("quality", "effective_referral", format!("{:.3}", indicators.quality.effective_referral)),
        ("health", "infant_mortality", format!("{:.2}", impact.infant_mortality)),
        ("health", "vaccination_coverage", format!("{:.3}", impact.vaccination_coverage)),
        ("health", "primary_care_access", format!("{:.3}", impact.primary_care_access)),
    ];
    for (category, name, value) in rows {
        table.add_row(vec![category.to_string(), name.to_string(), value]);
    }
    table.to_string()
}

pub fn render_whatif_table(comparison: &WhatIfComparison) -> String {
    let mut table = new_table(vec!["Quantity", "Before", "After", "Change"]);
    for (name, change) in &comparison.changes {
        table.add_row(vec![
            name.clone(),
            format!("{:.2}", change.from),
            format!("{:.2}", change.to),
            format!("{:+.2}", change.delta()),
        ]);
    }
    for (category, change) in &comparison.category_compliance {
        table.add_row(vec![
            format!("{category} compliance"),
            format!("{:.1}%", change.from * 100.0),
            format!("{:.1}%", change.to * 100.0),
            format!("{:+.1} pts", change.delta() * 100.0),
        ]);
    }
    format!(
        "{table}\nGlobal compliance: {:.1}% -> {:.1}% ({:+.1} pts)",
        comparison.global_compliance.from * 100.0,
        comparison.global_compliance.to * 100.0,
        comparison.global_compliance.delta() * 100.0
    )
}
