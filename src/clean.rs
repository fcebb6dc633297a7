//! Missing-value filling and derived columns.
//!
//! Text columns are filled with [`UNKNOWN`]. Numeric columns are filled with
//! the median of their present values, computed once per column before any
//! cell is touched. When both revenue and operating cost are present,
//! `ProfitINR` is recomputed from them.
//!
//! Every column is validated and planned before the dataset is mutated, so a
//! failure leaves the input untouched.

use std::fmt;

use clap::ValueEnum;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    dataset::{Column, ColumnData, Dataset, format_number, parse_number},
    error::{PipelineError, PipelineResult},
    schema::{CanonicalField, FieldKind},
};

pub const UNKNOWN: &str = "Unknown";

/// What to do with a numeric column that has rows but no values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[value(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum EmptyMedianPolicy {
    #[default]
    Fail,
    Leave,
    Zero,
}

impl fmt::Display for EmptyMedianPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EmptyMedianPolicy::Fail => "fail",
            EmptyMedianPolicy::Leave => "leave",
            EmptyMedianPolicy::Zero => "zero",
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanOptions {
    pub empty_median: EmptyMedianPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Text { filled: usize },
    Median { value: f64, filled: usize },
    Zero { filled: usize },
    LeftMissing { missing: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFill {
    pub column: String,
    pub fill: Fill,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanReport {
    pub fills: Vec<ColumnFill>,
    pub profit_derived: bool,
}

impl CleanReport {
    pub fn cells_filled(&self) -> usize {
        self.fills
            .iter()
            .map(|f| match f.fill {
                Fill::Text { filled } | Fill::Median { filled, .. } | Fill::Zero { filled } => {
                    filled
                }
                Fill::LeftMissing { .. } => 0,
            })
            .sum()
    }
}

/// Middle value of `values`; the mean of the two middle values when the
/// count is even. `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Declared kind of a canonical column. The derived profit column is typed
/// by inference since it is recomputed anyway.
fn declared_kind(name: &str) -> Option<FieldKind> {
    CanonicalField::from_name(name)
        .map(CanonicalField::kind)
        .filter(|kind| *kind != FieldKind::Derived)
}

/// Coerces a column to the type its canonical field declares. `first_line`
/// is the source line of the first cell, used in error messages.
fn coerce(column: &Column, first_line: usize) -> PipelineResult<ColumnData> {
    match (declared_kind(&column.name), &column.data) {
        (Some(kind), ColumnData::Text(cells)) if kind.is_numeric() => cells
            .iter()
            .enumerate()
            .map(|(row, cell)| match cell {
                None => Ok(None),
                Some(raw) => parse_number(raw).map(Some).ok_or_else(|| {
                    PipelineError::MalformedNumber {
                        column: column.name.clone(),
                        row: row + first_line,
                        value: raw.clone(),
                    }
                }),
            })
            .collect::<PipelineResult<Vec<_>>>()
            .map(ColumnData::Number),
        (Some(kind), ColumnData::Number(cells)) if !kind.is_numeric() => Ok(ColumnData::Text(
            cells.iter().map(|cell| cell.map(format_number)).collect(),
        )),
        (_, data) => Ok(data.clone()),
    }
}

fn fill(
    name: &str,
    data: ColumnData,
    options: &CleanOptions,
) -> PipelineResult<(ColumnData, Option<Fill>)> {
    let missing = data.missing_count();
    if missing == 0 {
        return Ok((data, None));
    }
    match data {
        ColumnData::Text(cells) => {
            let cells = cells
                .into_iter()
                .map(|cell| Some(cell.unwrap_or_else(|| UNKNOWN.to_string())))
                .collect();
            Ok((ColumnData::Text(cells), Some(Fill::Text { filled: missing })))
        }
        ColumnData::Number(cells) => {
            let present = cells.iter().flatten().copied().collect::<Vec<_>>();
            let (replacement, report) = match median(&present) {
                Some(value) => (
                    Some(value),
                    Fill::Median {
                        value,
                        filled: missing,
                    },
                ),
                None => match options.empty_median {
                    EmptyMedianPolicy::Fail => {
                        return Err(PipelineError::EmptyNumericColumn {
                            column: name.to_string(),
                        });
                    }
                    EmptyMedianPolicy::Leave => (None, Fill::LeftMissing { missing }),
                    EmptyMedianPolicy::Zero => (Some(0.0), Fill::Zero { filled: missing }),
                },
            };
            let cells = cells
                .into_iter()
                .map(|cell| cell.or(replacement))
                .collect();
            Ok((ColumnData::Number(cells), Some(report)))
        }
    }
}

fn derive_profit(dataset: &Dataset) -> Option<Column> {
    let revenue = dataset.numbers(CanonicalField::RevenueInr.name())?;
    let cost = dataset.numbers(CanonicalField::OperatingCostInr.name())?;
    let profit = revenue
        .iter()
        .zip(cost)
        .map(|(revenue, cost)| match (revenue, cost) {
            (Some(revenue), Some(cost)) => Some(revenue - cost),
            _ => None,
        })
        .collect();
    Some(Column::number(CanonicalField::ProfitInr.name(), profit))
}

/// Fills missing values and derives `ProfitINR` in place.
///
/// Expects headers to have been normalized already; declared types and the
/// profit derivation key off canonical labels.
pub fn clean_data(dataset: &mut Dataset, options: &CleanOptions) -> PipelineResult<CleanReport> {
    let mut planned = Vec::with_capacity(dataset.column_count());
    let mut report = CleanReport::default();
    for column in dataset.columns() {
        let data = coerce(column, dataset.first_line())?;
        let (data, filled) = fill(&column.name, data, options)?;
        if let Some(fill) = filled {
            debug!("Column '{}': {:?}", column.name, fill);
            report.fills.push(ColumnFill {
                column: column.name.clone(),
                fill,
            });
        }
        planned.push(data);
    }

    for (column, data) in dataset.columns_mut().iter_mut().zip(planned) {
        column.data = data;
    }

    match derive_profit(dataset) {
        Some(profit) => {
            dataset.upsert_column(profit)?;
            report.profit_derived = true;
        }
        None => info!(
            "Skipping {} derivation: '{}' or '{}' is not a numeric column",
            CanonicalField::ProfitInr,
            CanonicalField::RevenueInr,
            CanonicalField::OperatingCostInr
        ),
    }
    Ok(report)
}
