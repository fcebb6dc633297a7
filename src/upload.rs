use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::UploadArgs,
    filter::SelectionFilter,
    persist::{PersistenceGateway, SqliteGateway},
};

pub fn execute(args: &UploadArgs) -> Result<()> {
    let prepared = crate::prepare(&args.input)?;
    let filter =
        SelectionFilter::from_values(&args.selection.segments, &args.selection.manufacturers);
    let selected = filter
        .apply(&prepared.dataset)
        .context("Applying segment/manufacturer selection")?;

    let database = args
        .database
        .clone()
        .unwrap_or_else(|| prepared.config.database.path.clone());
    let table = args
        .table_name
        .clone()
        .unwrap_or_else(|| prepared.config.database.table.clone());
    info!(
        "Uploading {} row(s) to table '{}' in {:?}",
        selected.row_count(),
        table,
        database
    );

    let mut gateway = SqliteGateway::open(&database)?;
    let written = gateway
        .replace_all(&table, &selected)
        .with_context(|| format!("Uploading to {database:?}"))?;
    println!("Replaced '{table}' with {written} row(s)");
    Ok(())
}
