//! In-memory columnar dataset.
//!
//! Every column is either text or numeric. The type is inferred when the
//! dataset is built from raw cells: a column is numeric when every
//! non-missing cell parses as a finite `f64`, and text otherwise.

use std::borrow::Cow;

use crate::error::{PipelineError, PipelineResult};

/// Cell spellings treated as missing on load, compared case-insensitively.
const MISSING_MARKERS: &[&str] = &["", "na", "n/a", "nan", "null", "none", "-"];

pub fn is_missing_marker(raw: &str) -> bool {
    let trimmed = raw.trim();
    MISSING_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// Renders integral values without a fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

/// Parses a numeric cell; non-finite spellings such as `inf` are rejected.
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<Option<String>>),
    Number(Vec<Option<f64>>),
}

impl ColumnData {
    /// Infers the column type from raw cells. Missing markers become `None`.
    pub fn infer(raw: Vec<Option<String>>) -> Self {
        let cells = raw
            .into_iter()
            .map(|cell| cell.filter(|value| !is_missing_marker(value)))
            .collect::<Vec<_>>();
        let has_values = cells.iter().any(Option::is_some);
        let all_numeric = cells
            .iter()
            .flatten()
            .all(|value| parse_number(value).is_some());
        if has_values && all_numeric {
            ColumnData::Number(
                cells
                    .iter()
                    .map(|cell| cell.as_deref().and_then(parse_number))
                    .collect(),
            )
        } else {
            ColumnData::Text(cells)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(cells) => cells.len(),
            ColumnData::Number(cells) => cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnData::Number(_))
    }

    pub fn missing_count(&self) -> usize {
        match self {
            ColumnData::Text(cells) => cells.iter().filter(|c| c.is_none()).count(),
            ColumnData::Number(cells) => cells.iter().filter(|c| c.is_none()).count(),
        }
    }

    /// Display form of a cell; missing cells render as an empty string.
    pub fn render(&self, row: usize) -> Cow<'_, str> {
        match self {
            ColumnData::Text(cells) => match cells.get(row) {
                Some(Some(value)) => Cow::Borrowed(value.as_str()),
                _ => Cow::Borrowed(""),
            },
            ColumnData::Number(cells) => match cells.get(row) {
                Some(Some(value)) => Cow::Owned(format_number(*value)),
                _ => Cow::Borrowed(""),
            },
        }
    }

    fn select(&self, mask: &[bool]) -> Self {
        fn keep<T: Clone>(cells: &[T], mask: &[bool]) -> Vec<T> {
            cells
                .iter()
                .zip(mask)
                .filter(|(_, keep)| **keep)
                .map(|(cell, _)| cell.clone())
                .collect()
        }
        match self {
            ColumnData::Text(cells) => ColumnData::Text(keep(cells, mask)),
            ColumnData::Number(cells) => ColumnData::Number(keep(cells, mask)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn text<S: Into<String>>(name: &str, cells: Vec<Option<S>>) -> Self {
        Self::new(
            name,
            ColumnData::Text(cells.into_iter().map(|c| c.map(Into::into)).collect()),
        )
    }

    pub fn number(name: &str, cells: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Number(cells))
    }
}

/// Source line of the first data row when the header is on line 1.
pub const FIRST_DATA_LINE: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
    first_line: usize,
}

impl Default for Dataset {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            row_count: 0,
            first_line: FIRST_DATA_LINE,
        }
    }
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> PipelineResult<Self> {
        let row_count = columns.first().map(|c| c.data.len()).unwrap_or(0);
        if let Some(column) = columns.iter().find(|c| c.data.len() != row_count) {
            return Err(PipelineError::RaggedColumns {
                column: column.name.clone(),
                expected: row_count,
                actual: column.data.len(),
            });
        }
        Ok(Self {
            columns,
            row_count,
            first_line: FIRST_DATA_LINE,
        })
    }

    /// Records the source line the first data row was read from, so errors
    /// can point back into the file.
    pub fn with_first_line(mut self, line: usize) -> Self {
        self.first_line = line;
        self
    }

    pub fn first_line(&self) -> usize {
        self.first_line
    }

    /// Builds a dataset from a header row and equally sized string records,
    /// inferring each column's type.
    pub fn from_records(headers: &[String], records: &[Vec<String>]) -> PipelineResult<Self> {
        let columns = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let raw = records
                    .iter()
                    .map(|record| record.get(idx).cloned())
                    .collect();
                Column::new(header.clone(), ColumnData::infer(raw))
            })
            .collect();
        Self::new(columns)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Duplicate names resolve to the last column carrying the name, the
    /// one the header normalizer lets win.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().rposition(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|idx| &self.columns[idx])
    }

    pub fn require(&self, name: &str) -> PipelineResult<&Column> {
        self.column(name)
            .ok_or_else(|| PipelineError::MissingColumn {
                column: name.to_string(),
            })
    }

    pub fn numbers(&self, name: &str) -> Option<&[Option<f64>]> {
        match &self.column(name)?.data {
            ColumnData::Number(cells) => Some(cells),
            ColumnData::Text(_) => None,
        }
    }

    pub fn texts(&self, name: &str) -> Option<&[Option<String>]> {
        match &self.column(name)?.data {
            ColumnData::Text(cells) => Some(cells),
            ColumnData::Number(_) => None,
        }
    }

    /// Replaces the column named like `column`, or appends it.
    pub fn upsert_column(&mut self, column: Column) -> PipelineResult<()> {
        if !self.columns.is_empty() && column.data.len() != self.row_count {
            return Err(PipelineError::RaggedColumns {
                column: column.name,
                expected: self.row_count,
                actual: column.data.len(),
            });
        }
        if self.columns.is_empty() {
            self.row_count = column.data.len();
        }
        match self.column_index(&column.name) {
            Some(idx) => self.columns[idx] = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Keeps the rows whose `mask` entry is true.
    pub fn select_rows(&self, mask: &[bool]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), c.data.select(mask)))
            .collect();
        let row_count = mask
            .iter()
            .take(self.row_count)
            .filter(|keep| **keep)
            .count();
        Self {
            columns,
            row_count,
            first_line: self.first_line,
        }
    }

    pub fn render_row(&self, row: usize) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| c.data.render(row).into_owned())
            .collect()
    }

    pub fn head(&self, limit: usize) -> Vec<Vec<String>> {
        (0..self.row_count.min(limit))
            .map(|row| self.render_row(row))
            .collect()
    }
}
