use anyhow::{Context, Result};
use log::info;

use crate::{cli::CleanArgs, io_utils, table};

pub fn execute(args: &CleanArgs) -> Result<()> {
    let prepared = crate::prepare(&args.input)?;
    let dataset = &prepared.dataset;

    if args.table {
        print!("{}", table::render_dataset(dataset, args.limit));
        info!(
            "Displayed {} of {} cleaned row(s)",
            dataset.row_count().min(args.limit),
            dataset.row_count()
        );
        return Ok(());
    }

    let output_path = args.output.as_deref();
    let delimiter = args
        .output_delimiter
        .unwrap_or(io_utils::DEFAULT_CSV_DELIMITER);
    let mut writer = io_utils::open_csv_writer(output_path, delimiter)?;
    io_utils::write_dataset(&mut writer, dataset).with_context(|| {
        format!(
            "Writing cleaned output to {}",
            output_path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "stdout".into())
        )
    })?;
    info!(
        "Wrote {} cleaned row(s) across {} column(s) (delimiter '{}')",
        dataset.row_count(),
        dataset.column_count(),
        crate::printable_delimiter(delimiter)
    );
    Ok(())
}
