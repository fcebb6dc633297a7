//! Spreadsheet input (`.xlsx`, `.xlsm`, `.xls`, `.ods`) through calamine.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, open_workbook_auto};
use log::debug;

use crate::dataset::Dataset;

/// Raw text of a spreadsheet cell; empty and error cells are missing.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(f.to_string()),
        other => Some(other.to_string()),
    }
}

/// Reads one worksheet (the first unless `sheet` names another). The first
/// row is the header.
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Dataset> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Opening workbook {path:?}"))?;
    let sheet_names = workbook.sheet_names().to_vec();
    let name = match sheet {
        Some(requested) => sheet_names
            .iter()
            .find(|candidate| candidate.as_str() == requested)
            .cloned()
            .ok_or_else(|| {
                anyhow!("Sheet '{requested}' not found in {path:?} (available: {sheet_names:?})")
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("Workbook {path:?} has no sheets"))?,
    };
    debug!("Reading sheet '{name}' from {path:?}");
    let range = workbook
        .worksheet_range(&name)
        .with_context(|| format!("Reading sheet '{name}' from {path:?}"))?;

    // calamine ranges start at the first non-empty cell
    let header_line = range.start().map_or(1, |(row, _)| row as usize + 1);
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Dataset::default());
    };
    let headers = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| cell_text(cell).unwrap_or_else(|| format!("column_{}", idx + 1)))
        .collect::<Vec<_>>();
    let records = rows
        .map(|row| {
            (0..headers.len())
                .map(|idx| row.get(idx).and_then(cell_text).unwrap_or_default())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    Ok(Dataset::from_records(&headers, &records)?.with_first_line(header_line + 1))
}
