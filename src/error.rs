//! Error taxonomy for the normalization, cleaning, filtering and persistence
//! stages.
//!
//! Command handlers wrap these in `anyhow` with file/row context; library
//! callers can match on the variant to tell a schema problem apart from a
//! storage problem.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Required column '{column}' is missing from the dataset")]
    MissingColumn { column: String },

    #[error("Numeric column '{column}' has no values to compute a median from")]
    EmptyNumericColumn { column: String },

    #[error("Column '{column}' row {row}: '{value}' is not a number")]
    MalformedNumber {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Alias '{alias}' maps to both '{first}' and '{second}'")]
    SynonymCollision {
        alias: String,
        first: String,
        second: String,
    },

    #[error("Column '{column}' has {actual} value(s) but the dataset has {expected} row(s)")]
    RaggedColumns {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("'{0}' is not a valid table name")]
    InvalidTableName(String),

    #[error(
        "Table '{table}' cannot hold columns with clashing names: {}",
        .columns.join(", ")
    )]
    DuplicateColumns { table: String, columns: Vec<String> },

    #[error("Opening database '{path}' failed")]
    Database {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Replacing rows in table '{table}' failed")]
    Persistence {
        table: String,
        #[source]
        source: rusqlite::Error,
    },
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
