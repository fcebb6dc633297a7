//! Full-replace persistence.
//!
//! [`PersistenceGateway::replace_all`] deletes every row of the target table
//! and inserts the dataset. [`SqliteGateway`] runs both steps in a single
//! transaction, so readers see either the old rows or the new ones.

use std::path::Path;

use log::{debug, info};
use rusqlite::{Connection, params_from_iter, types::Value as SqlValue};

use crate::{
    dataset::{ColumnData, Dataset},
    error::{PipelineError, PipelineResult},
};

pub const DEFAULT_TABLE: &str = "ev_data";

pub trait PersistenceGateway {
    /// Replaces the contents of `table` with `dataset`; returns the number
    /// of rows written.
    fn replace_all(&mut self, table: &str, dataset: &Dataset) -> PipelineResult<usize>;
}

pub fn validate_table_name(table: &str) -> PipelineResult<()> {
    let mut chars = table.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PipelineError::InvalidTableName(table.to_string()))
    }
}

/// Column names that collide with another column once compared the way
/// SQLite compares identifiers (ASCII case-insensitive), in column order.
pub fn clashing_columns(dataset: &Dataset) -> Vec<String> {
    let keys = dataset
        .columns()
        .iter()
        .map(|c| c.name.to_ascii_lowercase())
        .collect::<Vec<_>>();
    dataset
        .columns()
        .iter()
        .zip(&keys)
        .filter(|(_, key)| keys.iter().filter(|other| other == key).count() > 1)
        .map(|(column, _)| column.name.clone())
        .collect()
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub struct SqliteGateway {
    conn: Connection,
}

impl SqliteGateway {
    pub fn open(path: &Path) -> PipelineResult<Self> {
        let conn = Connection::open(path).map_err(|source| PipelineError::Database {
            path: path.display().to_string(),
            source,
        })?;
        info!("Opened SQLite database {path:?}");
        Ok(Self { conn })
    }

    pub fn in_memory() -> PipelineResult<Self> {
        let conn = Connection::open_in_memory().map_err(|source| PipelineError::Database {
            path: ":memory:".to_string(),
            source,
        })?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn create_table_sql(table: &str, dataset: &Dataset) -> String {
        let columns = dataset
            .columns()
            .iter()
            .map(|column| {
                let affinity = if column.data.is_numeric() {
                    "REAL"
                } else {
                    "TEXT"
                };
                format!("{} {affinity}", quote_identifier(&column.name))
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({columns})",
            quote_identifier(table)
        )
    }

    fn insert_sql(table: &str, dataset: &Dataset) -> String {
        let names = dataset
            .columns()
            .iter()
            .map(|c| quote_identifier(&c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=dataset.column_count())
            .map(|idx| format!("?{idx}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({names}) VALUES ({placeholders})",
            quote_identifier(table)
        )
    }

    fn row_values(dataset: &Dataset, row: usize) -> Vec<SqlValue> {
        dataset
            .columns()
            .iter()
            .map(|column| match &column.data {
                ColumnData::Text(cells) => cells[row]
                    .clone()
                    .map(SqlValue::Text)
                    .unwrap_or(SqlValue::Null),
                ColumnData::Number(cells) => {
                    cells[row].map(SqlValue::Real).unwrap_or(SqlValue::Null)
                }
            })
            .collect()
    }

    fn replace_in_transaction(&mut self, table: &str, dataset: &Dataset) -> rusqlite::Result<usize> {
        let tx = self.conn.transaction()?;
        if dataset.column_count() > 0 {
            tx.execute(&Self::create_table_sql(table, dataset), [])?;
        }
        let deleted = tx.execute(&format!("DELETE FROM {}", quote_identifier(table)), [])?;
        debug!("Deleted {deleted} existing row(s) from '{table}'");
        if dataset.column_count() > 0 {
            let mut statement = tx.prepare(&Self::insert_sql(table, dataset))?;
            for row in 0..dataset.row_count() {
                statement.execute(params_from_iter(Self::row_values(dataset, row)))?;
            }
        }
        tx.commit()?;
        Ok(dataset.row_count())
    }
}

impl PersistenceGateway for SqliteGateway {
    fn replace_all(&mut self, table: &str, dataset: &Dataset) -> PipelineResult<usize> {
        validate_table_name(table)?;
        let clashing = clashing_columns(dataset);
        if !clashing.is_empty() {
            return Err(PipelineError::DuplicateColumns {
                table: table.to_string(),
                columns: clashing,
            });
        }
        let written = self
            .replace_in_transaction(table, dataset)
            .map_err(|source| PipelineError::Persistence {
                table: table.to_string(),
                source,
            })?;
        info!("Replaced contents of '{table}' with {written} row(s)");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    fn dataset(manufacturers: &[&str]) -> Dataset {
        let revenue = (0..manufacturers.len())
            .map(|idx| Some(100.0 * (idx + 1) as f64))
            .collect();
        Dataset::new(vec![
            Column::text(
                "Manufacturer",
                manufacturers.iter().map(|m| Some(*m)).collect(),
            ),
            Column::number("RevenueINR", revenue),
        ])
        .expect("dataset")
    }

    fn count(gateway: &SqliteGateway, table: &str) -> i64 {
        gateway
            .connection()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
            .expect("count")
    }

    #[test]
    fn second_replace_does_not_append() {
        let mut gateway = SqliteGateway::in_memory().expect("db");
        gateway
            .replace_all(DEFAULT_TABLE, &dataset(&["Tata", "MG", "Kia"]))
            .expect("first");
        assert_eq!(count(&gateway, DEFAULT_TABLE), 3);

        let written = gateway
            .replace_all(DEFAULT_TABLE, &dataset(&["BYD"]))
            .expect("second");
        assert_eq!(written, 1);
        assert_eq!(count(&gateway, DEFAULT_TABLE), 1);
        let (name, revenue): (String, f64) = gateway
            .connection()
            .query_row(
                "SELECT \"Manufacturer\", \"RevenueINR\" FROM ev_data",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("row");
        assert_eq!(name, "BYD");
        assert_eq!(revenue, 100.0);
    }

    #[test]
    fn invalid_table_names_are_rejected() {
        let mut gateway = SqliteGateway::in_memory().expect("db");
        let err = gateway
            .replace_all("ev_data; DROP TABLE x", &dataset(&["Tata"]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidTableName(_)));
        assert!(validate_table_name("_ev2").is_ok());
        assert!(validate_table_name("2ev").is_err());
    }

    #[test]
    fn schema_mismatch_surfaces_as_persistence_error() {
        let mut gateway = SqliteGateway::in_memory().expect("db");
        gateway
            .replace_all(DEFAULT_TABLE, &dataset(&["Tata"]))
            .expect("first");
        let other = Dataset::new(vec![Column::text("City", vec![Some("Pune")])])
            .expect("dataset");
        let err = gateway.replace_all(DEFAULT_TABLE, &other).unwrap_err();
        assert!(matches!(err, PipelineError::Persistence { .. }));
        // rolled back: the earlier rows survive
        assert_eq!(count(&gateway, DEFAULT_TABLE), 1);
    }

    #[test]
    fn clashing_column_names_are_rejected_before_writing() {
        let mut gateway = SqliteGateway::in_memory().expect("db");
        gateway
            .replace_all(DEFAULT_TABLE, &dataset(&["Tata"]))
            .expect("first");

        let shadowed = Dataset::new(vec![
            Column::text("Manufacturer", vec![Some("Tata")]),
            Column::text("Manufacturer", vec![Some("Tata Motors")]),
            Column::text("Segment", vec![Some("SUV")]),
        ])
        .expect("dataset");
        let err = gateway.replace_all(DEFAULT_TABLE, &shadowed).unwrap_err();
        match err {
            PipelineError::DuplicateColumns { table, columns } => {
                assert_eq!(table, DEFAULT_TABLE);
                assert_eq!(columns, vec!["Manufacturer", "Manufacturer"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(count(&gateway, DEFAULT_TABLE), 1);
    }

    #[test]
    fn names_differing_only_in_case_clash() {
        let dataset = Dataset::new(vec![
            Column::text("Segment", vec![Some("SUV")]),
            Column::text("Notes", vec![Some("a")]),
            Column::text("notes", vec![Some("b")]),
        ])
        .expect("dataset");
        assert_eq!(clashing_columns(&dataset), vec!["Notes", "notes"]);

        let mut gateway = SqliteGateway::in_memory().expect("db");
        let err = gateway.replace_all(DEFAULT_TABLE, &dataset).unwrap_err();
        assert!(err.to_string().contains("Notes, notes"));
    }
}
