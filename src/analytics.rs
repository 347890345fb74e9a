//! Per-class aggregates computed with the Polars lazy API.

use itertools::Itertools;
use polars::prelude::*;
use serde::Serialize;

use crate::models::{Mech, WeightClass};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassBreakdown {
    pub weight_class: WeightClass,
    pub count: usize,
    pub avg_tonnage: f64,
    pub avg_hardpoints: f64,
}

fn mechs_frame(mechs: &[Mech]) -> PolarsResult<DataFrame> {
    let classes: Vec<&str> = mechs.iter().map(|m| m.weight_class.as_str()).collect();
    let tonnage: Vec<i64> = mechs.iter().map(|m| i64::from(m.tonnage)).collect();
    let totals: Vec<i64> = mechs.iter().map(|m| i64::from(m.total())).collect();
    df!(
        "weight_class" => classes,
        "tonnage" => tonnage,
        "total" => totals
    )
}

fn float_column(frame: &DataFrame, name: &str) -> Vec<f64> {
    frame
        .column(name)
        .ok()
        .and_then(|s| s.cast(&DataType::Float64).ok())
        .and_then(|s| s.f64().ok().map(|ca| ca.into_iter().map(|v| v.unwrap_or(0.0)).collect()))
        .unwrap_or_default()
}

/// Count, average tonnage and average hardpoint total per weight class,
/// ordered Light to Assault. Classes without records are omitted.
pub fn class_breakdown(mechs: &[Mech]) -> PolarsResult<Vec<ClassBreakdown>> {
    let result = mechs_frame(mechs)?
        .lazy()
        .group_by([col("weight_class")])
        .agg([
            len().alias("count"),
            col("tonnage").mean().alias("avg_tonnage"),
            col("total").mean().alias("avg_hardpoints"),
        ])
        .collect()?;

    let labels: Vec<String> = result
        .column("weight_class")
        .ok()
        .and_then(|s| s.str().ok())
        .map(|ca| ca.into_iter().map(|s| s.unwrap_or_default().to_string()).collect())
        .unwrap_or_default();
    let counts = float_column(&result, "count");
    let avg_tonnage = float_column(&result, "avg_tonnage");
    let avg_hardpoints = float_column(&result, "avg_hardpoints");

    Ok(labels
        .iter()
        .zip(counts)
        .zip(avg_tonnage)
        .zip(avg_hardpoints)
        .filter_map(|(((label, count), tonnage), hardpoints)| {
            label.parse::<WeightClass>().ok().map(|class| ClassBreakdown {
                weight_class: class,
                count: count as usize,
                avg_tonnage: tonnage,
                avg_hardpoints: hardpoints,
            })
        })
        .sorted_by_key(|row| row.weight_class)
        .collect())
}
