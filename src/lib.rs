pub mod analytics;
pub mod clean;
pub mod cli;
pub mod columns;
pub mod config;
pub mod dataset;
pub mod error;
pub mod excel;
pub mod filter;
pub mod io_utils;
pub mod normalize;
pub mod persist;
pub mod pipeline;
pub mod process;
pub mod report;
pub mod schema;
pub mod table;
pub mod upload;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    clean::CleanOptions,
    cli::{Cli, Commands, InputArgs},
    config::AppConfig,
    dataset::Dataset,
    pipeline::{Pipeline, PipelineReport},
    schema::SynonymTable,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("ev_sales_etl", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Clean(args) => process::execute(&args),
        Commands::Report(args) => report::execute(&args),
        Commands::Upload(args) => upload::execute(&args),
        Commands::Columns(args) => columns::execute(&args),
    }
}

/// A cleaned dataset together with the configuration it was produced under.
pub struct Prepared {
    pub dataset: Dataset,
    pub report: PipelineReport,
    pub config: AppConfig,
}

/// Loads configuration and input, then runs the normalize/clean pipeline.
pub fn prepare(input: &InputArgs) -> Result<Prepared> {
    let config = AppConfig::resolve(input.config.as_deref())?;
    let encoding = io_utils::resolve_encoding(input.input_encoding.as_deref())?;
    let options = io_utils::InputOptions {
        delimiter: input.delimiter,
        encoding,
        sheet: input.sheet.as_deref(),
    };
    info!("Loading '{}'", input.input.display());
    let raw = io_utils::read_dataset(&input.input, &options)?;

    let synonyms = SynonymTable::builtin().context("Building synonym table")?;
    let clean_options = CleanOptions {
        empty_median: input
            .empty_numeric
            .unwrap_or(config.cleaning.empty_numeric),
    };
    let pipeline = Pipeline::new(&synonyms, clean_options);
    let (dataset, report) = pipeline
        .run(raw)
        .with_context(|| format!("Cleaning {:?}", input.input))?;
    Ok(Prepared {
        dataset,
        report,
        config,
    })
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
