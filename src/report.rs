//! The `report` command: filter the cleaned dataset, print metrics and
//! breakdowns, and optionally export the selection and summary as CSV.

use std::fs;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use crate::{
    analytics::{self, Aggregate, GroupedAggregate, SummaryMetrics},
    cli::ReportArgs,
    dataset::format_number,
    filter::{self, SelectionFilter},
    io_utils,
    schema::CanonicalField,
    table::{self, Align},
};

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    rows: usize,
    metrics: &'a SummaryMetrics,
    breakdowns: &'a [GroupedAggregate],
}

fn format_group_value(aggregate: Aggregate, value: f64) -> String {
    match aggregate {
        Aggregate::Count => format_number(value),
        Aggregate::Sum => analytics::format_rupees(value),
        Aggregate::Mean => format!("{value:.2}"),
    }
}

pub fn execute(args: &ReportArgs) -> Result<()> {
    let prepared = crate::prepare(&args.input)?;
    let filter =
        SelectionFilter::from_values(&args.selection.segments, &args.selection.manufacturers);
    let selected = filter
        .apply(&prepared.dataset)
        .context("Applying segment/manufacturer selection")?;
    info!(
        "Selected {} of {} row(s)",
        selected.row_count(),
        prepared.dataset.row_count()
    );
    if selected.row_count() == 0 && !filter.is_unrestricted() {
        warn!(
            "No rows match the selection; segments available: {:?}, manufacturers available: {:?}",
            filter::distinct_values(&prepared.dataset, CanonicalField::Segment)?,
            filter::distinct_values(&prepared.dataset, CanonicalField::Manufacturer)?
        );
    }
    if selected.column(CanonicalField::ProfitInr.name()).is_none() {
        warn!("Profit metrics unavailable: revenue or operating cost column missing");
    }

    let metrics = SummaryMetrics::compute(&selected);
    let breakdowns = analytics::standard_breakdowns(&selected, args.top)?;
    let summary_rows = metrics.summary_rows();

    if args.json {
        let report = JsonReport {
            rows: selected.row_count(),
            metrics: &metrics,
            breakdowns: &breakdowns,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Serializing report")?
        );
    } else {
        let rows = summary_rows
            .iter()
            .map(|(metric, value)| vec![metric.clone(), value.clone()])
            .collect::<Vec<_>>();
        table::print_table(
            &["metric".to_string(), "value".to_string()],
            &rows,
            &[Align::Left, Align::Right],
        );
        for breakdown in &breakdowns {
            println!();
            println!("{}", breakdown.title);
            let rows = breakdown
                .rows
                .iter()
                .map(|row| {
                    vec![
                        row.key.clone(),
                        format_group_value(breakdown.aggregate, row.value),
                    ]
                })
                .collect::<Vec<_>>();
            let value_header = breakdown
                .measure
                .map(|m| m.name().to_string())
                .unwrap_or_else(|| "count".to_string());
            table::print_table(
                &[breakdown.group_by.name().to_string(), value_header],
                &rows,
                &[Align::Left, Align::Right],
            );
        }
    }

    if let Some(path) = &args.export {
        let bytes = io_utils::dataset_to_csv_bytes(&selected)?;
        fs::write(path, bytes).with_context(|| format!("Exporting selection to {path:?}"))?;
        info!("Exported {} row(s) to {:?}", selected.row_count(), path);
    }
    if let Some(path) = &args.summary {
        let mut writer =
            io_utils::open_csv_writer(Some(path.as_path()), io_utils::DEFAULT_CSV_DELIMITER)?;
        io_utils::write_summary(&mut writer, &summary_rows)
            .with_context(|| format!("Writing summary to {path:?}"))?;
        info!("Wrote summary report to {:?}", path);
    }
    Ok(())
}
