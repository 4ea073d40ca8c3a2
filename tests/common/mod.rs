#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use tempfile::{TempDir, tempdir};

/// One cell of a generated workbook fixture.
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Date(ExcelDateTime),
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    /// Writes raw bytes into a file under the workspace and returns the path.
    /// `name` may contain subdirectories; they are created as needed.
    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture directory");
        }
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }

    /// Builds a single-sheet workbook under the workspace and returns the path.
    /// Date cells carry a US-style display format, distinct from the value
    /// rendering, so tests can tell the two apart.
    pub fn write_workbook(&self, name: &str, rows: &[Vec<Cell<'_>>]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let date_format = Format::new().set_num_format("mm/dd/yyyy hh:mm");
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Text(text) => worksheet
                        .write_string(row_idx as u32, col_idx as u16, *text)
                        .expect("write text cell"),
                    Cell::Number(value) => worksheet
                        .write_number(row_idx as u32, col_idx as u16, *value)
                        .expect("write numeric cell"),
                    Cell::Date(value) => worksheet
                        .write_datetime_with_format(
                            row_idx as u32,
                            col_idx as u16,
                            value,
                            &date_format,
                        )
                        .expect("write date cell"),
                };
            }
        }
        workbook.save(&path).expect("save workbook");
        path
    }
}
