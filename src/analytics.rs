//! Metrics and grouped aggregates over a cleaned (and usually filtered)
//! dataset.

use std::collections::HashMap;

use itertools::Itertools;
use serde::Serialize;

use crate::{
    dataset::Dataset,
    error::PipelineResult,
    schema::CanonicalField,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total_vehicles: usize,
    pub total_revenue: Option<f64>,
    pub total_profit: Option<f64>,
    pub avg_battery_kwh: Option<f64>,
    pub avg_range_km: Option<f64>,
}

fn present(dataset: &Dataset, field: CanonicalField) -> Option<impl Iterator<Item = f64> + '_> {
    dataset
        .numbers(field.name())
        .map(|cells| cells.iter().flatten().copied())
}

fn sum(dataset: &Dataset, field: CanonicalField) -> Option<f64> {
    present(dataset, field).map(|values| values.sum())
}

fn mean(dataset: &Dataset, field: CanonicalField) -> Option<f64> {
    let (total, count) = present(dataset, field)?.fold((0.0, 0usize), |(t, c), v| (t + v, c + 1));
    (count > 0).then(|| total / count as f64)
}

impl SummaryMetrics {
    /// Absent columns yield `None` rather than zero.
    pub fn compute(dataset: &Dataset) -> Self {
        Self {
            total_vehicles: dataset.row_count(),
            total_revenue: sum(dataset, CanonicalField::RevenueInr),
            total_profit: sum(dataset, CanonicalField::ProfitInr),
            avg_battery_kwh: mean(dataset, CanonicalField::BatteryKwh),
            avg_range_km: mean(dataset, CanonicalField::RangeKm),
        }
    }

    /// Metric name and display value pairs, in report order.
    pub fn summary_rows(&self) -> Vec<(String, String)> {
        let na = || "n/a".to_string();
        vec![
            (
                "Total Vehicles".to_string(),
                self.total_vehicles.to_string(),
            ),
            (
                "Total Revenue (₹)".to_string(),
                self.total_revenue.map(format_rupees).unwrap_or_else(na),
            ),
            (
                "Total Profit (₹)".to_string(),
                self.total_profit.map(format_rupees).unwrap_or_else(na),
            ),
            (
                "Avg Battery (kWh)".to_string(),
                self.avg_battery_kwh
                    .map(|v| format!("{v:.1}"))
                    .unwrap_or_else(na),
            ),
            (
                "Avg Range (km)".to_string(),
                self.avg_range_km
                    .map(|v| format!("{v:.1}"))
                    .unwrap_or_else(na),
            ),
        ]
    }
}

/// Rounds to whole rupees and inserts thousands separators: `₹1,234,567`.
pub fn format_rupees(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .join(",");
    if rounded < 0.0 {
        format!("-₹{grouped}")
    } else {
        format!("₹{grouped}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    Sum,
    Mean,
    Count,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub key: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedAggregate {
    pub title: String,
    pub group_by: CanonicalField,
    pub measure: Option<CanonicalField>,
    pub aggregate: Aggregate,
    pub rows: Vec<GroupRow>,
}

/// Aggregates `measure` per distinct value of `group_by`. Rows come back in
/// first-seen order. `Count` ignores `measure`.
pub fn group_by(
    dataset: &Dataset,
    group_by: CanonicalField,
    measure: Option<CanonicalField>,
    aggregate: Aggregate,
) -> PipelineResult<Vec<GroupRow>> {
    let keys = dataset.require(group_by.name())?;
    let values = match (aggregate, measure) {
        (Aggregate::Count, _) | (_, None) => None,
        (_, Some(field)) => {
            dataset.require(field.name())?;
            dataset.numbers(field.name())
        }
    };

    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, (f64, usize)> = HashMap::new();
    for row in 0..dataset.row_count() {
        let key = keys.data.render(row).into_owned();
        let value = values.and_then(|cells| cells[row]);
        if aggregate != Aggregate::Count && value.is_none() {
            continue;
        }
        let entry = totals.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            (0.0, 0)
        });
        entry.0 += value.unwrap_or(0.0);
        entry.1 += 1;
    }

    Ok(order
        .into_iter()
        .map(|key| {
            let (total, count) = totals[&key];
            let value = match aggregate {
                Aggregate::Sum => total,
                Aggregate::Mean => total / count as f64,
                Aggregate::Count => count as f64,
            };
            GroupRow { key, value }
        })
        .collect())
}

fn sorted_desc(mut rows: Vec<GroupRow>) -> Vec<GroupRow> {
    rows.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.key.cmp(&b.key)));
    rows
}

fn has(dataset: &Dataset, field: CanonicalField) -> bool {
    dataset.column(field.name()).is_some()
}

/// The dashboard's standard breakdowns. A breakdown whose columns are absent
/// is skipped.
pub fn standard_breakdowns(dataset: &Dataset, top: usize) -> PipelineResult<Vec<GroupedAggregate>> {
    use CanonicalField::*;

    let mut breakdowns = Vec::new();
    let specs = [
        ("Revenue by segment", Segment, Some(RevenueInr), Aggregate::Sum),
        ("Profit by manufacturer", Manufacturer, Some(ProfitInr), Aggregate::Sum),
        ("Vehicles by usage type", UsageType, None, Aggregate::Count),
        (
            "Average charging time by segment",
            Segment,
            Some(ChargingTimeHours),
            Aggregate::Mean,
        ),
        ("Average energy by segment", Segment, Some(EnergyKwh), Aggregate::Mean),
    ];
    for (title, key, measure, aggregate) in specs {
        if !has(dataset, key) || measure.is_some_and(|m| !has(dataset, m)) {
            continue;
        }
        let mut rows = group_by(dataset, key, measure, aggregate)?;
        match (key, aggregate) {
            (Segment, Aggregate::Sum) => rows = sorted_desc(rows),
            (Manufacturer, _) => {
                rows = sorted_desc(rows);
                if top > 0 {
                    rows.truncate(top);
                }
            }
            _ => {}
        }
        breakdowns.push(GroupedAggregate {
            title: title.to_string(),
            group_by: key,
            measure,
            aggregate,
            rows,
        });
    }
    Ok(breakdowns)
}
