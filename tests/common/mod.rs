#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use calamine::{Data, Range, Reader, Xlsx, open_workbook};
use tempfile::{TempDir, tempdir};

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

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }
}

pub fn csv2xlsx() -> Command {
    Command::cargo_bin("csv2xlsx").expect("binary exists")
}

pub fn sheet_names(workbook: &Path) -> Vec<String> {
    let book: Xlsx<_> = open_workbook(workbook).expect("open workbook");
    book.sheet_names()
}

pub fn read_sheet(workbook: &Path, sheet: &str) -> Range<Data> {
    let mut book: Xlsx<_> = open_workbook(workbook).expect("open workbook");
    book.worksheet_range(sheet).expect("read sheet")
}

pub fn read_formulas(workbook: &Path, sheet: &str) -> Range<String> {
    let mut book: Xlsx<_> = open_workbook(workbook).expect("open workbook");
    book.worksheet_formula(sheet).expect("read formulas")
}

/// Cell at 0-based `(row, col)` counted from A1, regardless of where the
/// used range starts.
pub fn cell(range: &Range<Data>, row: u32, col: u32) -> Data {
    range
        .get_value((row, col))
        .cloned()
        .unwrap_or(Data::Empty)
}
