#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use rust_xlsxwriter::Workbook;
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// The binary, run from inside the workspace so no stray
    /// `config/config.yaml` is picked up.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("ev-sales-etl").expect("binary exists");
        cmd.current_dir(self.path());
        cmd
    }
}

/// Reads a CSV file into its header and rows.
pub fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).expect("open csv");
    let headers = reader
        .headers()
        .expect("headers")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|record| {
            record
                .expect("record")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect();
    (headers, rows)
}

pub fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}

/// Writes a workbook with one worksheet per `(name, first_row, rows)` entry.
/// Numeric-looking cells are stored as numbers; empty strings stay blank.
pub fn write_workbook(path: &Path, sheets: &[(&str, u32, &[&[&str]])]) {
    let mut workbook = Workbook::new();
    for (name, first_row, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).expect("sheet name");
        for (offset, row) in rows.iter().enumerate() {
            let row_idx = first_row + offset as u32;
            for (col, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let col = col as u16;
                let written = match value.parse::<f64>() {
                    Ok(number) => worksheet.write_number(row_idx, col, number),
                    Err(_) => worksheet.write_string(row_idx, col, *value),
                };
                written.expect("write cell");
            }
        }
    }
    workbook.save(path).expect("save workbook");
}
