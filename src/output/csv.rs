use anyhow::Result;

use crate::finance::CashFlowProjection;
use crate::gaps::GapMatrix;
use crate::simulation::sensitivity::SensitivityResult;
use crate::simulation::SimulationResult;

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

/// One row per trial, in run order.
pub fn samples_to_csv(result: &SimulationResult) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["trial", "demand", "cost", "coverage", "sustainability"])?;
    let samples = &result.samples;
    for idx in 0..samples.len() {
        writer.write_record([
            (idx + 1).to_string(),
            format!("{:.4}", samples.demand[idx]),
            format!("{:.2}", samples.cost[idx]),
            format!("{:.6}", samples.coverage[idx]),
            format!("{:.6}", samples.sustainability[idx]),
        ])?;
    }
    finish(writer)
}

pub fn gaps_to_csv(matrix: &GapMatrix) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["indicator", "real", "ideal", "gap", "priority"])?;
    for (indicator, entry) in matrix.iter() {
        writer.write_record([
            indicator.to_string(),
            format!("{:.6}", entry.real),
            format!("{:.6}", entry.ideal),
            format!("{:.6}", entry.gap),
            entry.priority.to_string().to_lowercase(),
        ])?;
    }
    finish(writer)
}

pub fn cashflow_to_csv(projection: &CashFlowProjection) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "month",
        "attendances",
        "revenue",
        "fixed_cost",
        "variable_cost",
        "total_cost",
        "net_flow",
        "discounted_flow",
    ])?;
    for month in &projection.months {
        writer.write_record([
            month.month.to_string(),
            format!("{:.2}", month.attendances),
            format!("{:.2}", month.revenue),
            format!("{:.2}", month.fixed_cost),
            format!("{:.2}", month.variable_cost),
            format!("{:.2}", month.total_cost),
            format!("{:.2}", month.net_flow),
            format!("{:.2}", month.discounted_flow),
        ])?;
    }
    finish(writer)
}

pub fn sensitivity_to_csv(result: &SensitivityResult) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        result.field.to_string().as_str(),
        "demand",
        "cost",
        "coverage",
        "sustainability",
    ])?;
    for point in &result.points {
        writer.write_record([
            format!("{:.6}", point.value),
            format!("{:.4}", point.outcome.demand),
            format!("{:.2}", point.outcome.cost),
            format!("{:.6}", point.outcome.coverage),
            format!("{:.6}", point.outcome.sustainability),
        ])?;
    }
    finish(writer)
}
