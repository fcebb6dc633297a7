use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::clean::EmptyMedianPolicy;

#[derive(Debug, Parser)]
#[command(author, version, about = "Normalize, clean and analyze EV sales datasets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Normalize headers, fill missing values and derive profit
    Clean(CleanArgs),
    /// Print metrics and grouped breakdowns for a filtered selection
    Report(ReportArgs),
    /// Replace the configured database table with the cleaned selection
    Upload(UploadArgs),
    /// List the canonical columns and the header aliases that reach them
    Columns(ColumnsArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input CSV/TSV or spreadsheet file ('-' reads CSV from stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of delimited input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Worksheet to read from spreadsheet input (defaults to the first)
    #[arg(long)]
    pub sheet: Option<String>,
    /// Handling of numeric columns with no values at all
    #[arg(long = "empty-numeric", value_enum)]
    pub empty_numeric: Option<EmptyMedianPolicy>,
    /// Configuration file (defaults to config/config.yaml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SelectionArgs {
    /// Keep only these segments (repeatable; default keeps all)
    #[arg(long = "segment", action = clap::ArgAction::Append)]
    pub segments: Vec<String>,
    /// Keep only these manufacturers (repeatable; default keeps all)
    #[arg(long = "manufacturer", action = clap::ArgAction::Append)]
    pub manufacturers: Vec<String>,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Delimiter to use for output (defaults to comma)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Render the cleaned rows as a table on stdout instead of CSV
    #[arg(long)]
    pub table: bool,
    /// Limit number of rows rendered with --table
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub selection: SelectionArgs,
    /// Manufacturers to show in the profit breakdown (0 = all)
    #[arg(long, default_value_t = 10)]
    pub top: usize,
    /// Write the filtered rows to this CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,
    /// Write the summary metrics to this CSV file
    #[arg(long)]
    pub summary: Option<PathBuf>,
    /// Print metrics and breakdowns as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub selection: SelectionArgs,
    /// SQLite database file (overrides the config file)
    #[arg(long)]
    pub database: Option<PathBuf>,
    /// Target table (overrides the config file)
    #[arg(long = "table-name")]
    pub table_name: Option<String>,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Print the schema as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_accepts_names_and_characters() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("semicolon"), Ok(b';'));
        assert_eq!(parse_delimiter(":"), Ok(b':'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("§").is_err());
    }

    #[test]
    fn report_args_collect_repeated_filters() {
        let cli = Cli::try_parse_from([
            "ev-sales-etl",
            "report",
            "-i",
            "sales.csv",
            "--segment",
            "SUV",
            "--segment",
            "Sedan",
            "--manufacturer",
            "Tata",
            "--empty-numeric",
            "zero",
        ])
        .expect("parse");
        match cli.command {
            Commands::Report(args) => {
                assert_eq!(args.selection.segments, vec!["SUV", "Sedan"]);
                assert_eq!(args.selection.manufacturers, vec!["Tata"]);
                assert_eq!(args.input.empty_numeric, Some(EmptyMedianPolicy::Zero));
                assert_eq!(args.top, 10);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
