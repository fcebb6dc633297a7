//! Reading datasets from delimited text or spreadsheets, and writing CSV.
//!
//! - **Delimiter resolution**: extension-based (`.tsv` → tab, otherwise
//!   comma) with manual override.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **Spreadsheets**: `.xlsx`, `.xlsm`, `.xls` and `.ods` inputs are routed
//!   to [`crate::excel`].
//! - **stdin/stdout**: the `-` path convention routes through standard
//!   streams.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::{dataset::Dataset, excel};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];

#[derive(Debug, Clone)]
pub struct InputOptions<'a> {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    pub sheet: Option<&'a str>,
}

impl Default for InputOptions<'_> {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
            sheet: None,
        }
    }
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SPREADSHEET_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    Ok(open_csv_reader(reader, delimiter))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Reads a whole delimited-text source into memory.
pub fn read_delimited<R: Read>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Dataset> {
    let headers = decode_record(reader.byte_headers()?, encoding).context("Decoding header row")?;
    let mut records = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        records.push(decoded);
    }
    Ok(Dataset::from_records(&headers, &records)?)
}

/// Loads `path` as a dataset, choosing the reader from its extension.
pub fn read_dataset(path: &Path, options: &InputOptions<'_>) -> Result<Dataset> {
    let dataset = if is_spreadsheet(path) {
        excel::read_workbook(path, options.sheet)?
    } else {
        let delimiter = resolve_input_delimiter(path, options.delimiter);
        debug!(
            "Reading {:?} as delimited text ('{}', {})",
            path,
            crate::printable_delimiter(delimiter),
            options.encoding.name()
        );
        let mut reader = open_csv_reader_from_path(path, delimiter)?;
        read_delimited(&mut reader, options.encoding)
            .with_context(|| format!("Reading {path:?}"))?
    };
    debug!(
        "Loaded {} row(s) x {} column(s) from {:?}",
        dataset.row_count(),
        dataset.column_count(),
        path
    );
    Ok(dataset)
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let base: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    Ok(csv_writer(base, delimiter))
}

pub fn csv_writer<W: Write>(writer: W, delimiter: u8) -> csv::Writer<W> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    builder.from_writer(writer)
}

pub fn write_dataset<W: Write>(writer: &mut csv::Writer<W>, dataset: &Dataset) -> Result<()> {
    writer
        .write_record(dataset.headers())
        .context("Writing header row")?;
    for row in 0..dataset.row_count() {
        writer
            .write_record(dataset.render_row(row))
            .with_context(|| format!("Writing row {}", row + 2))?;
    }
    writer.flush().context("Flushing CSV output")?;
    Ok(())
}

/// Writes `Metric,Value` pairs.
pub fn write_summary<W: Write>(writer: &mut csv::Writer<W>, rows: &[(String, String)]) -> Result<()> {
    writer
        .write_record(["Metric", "Value"])
        .context("Writing summary header")?;
    for (metric, value) in rows {
        writer
            .write_record([metric, value])
            .with_context(|| format!("Writing summary metric '{metric}'"))?;
    }
    writer.flush().context("Flushing summary output")?;
    Ok(())
}

/// Serializes `dataset` to CSV bytes, the form handed to download links.
pub fn dataset_to_csv_bytes(dataset: &Dataset) -> Result<Vec<u8>> {
    let mut writer = csv_writer(Vec::new(), DEFAULT_CSV_DELIMITER);
    write_dataset(&mut writer, dataset)?;
    writer
        .into_inner()
        .map_err(|err| anyhow!("Finishing CSV buffer: {}", err.error()))
}
