//! Spreadsheet output.
//!
//! The converter talks to a [`CellSink`]; [`XlsxSink`] is the workbook-backed
//! implementation. Rows and columns are 0-based.

use std::collections::HashMap;

use log::warn;
use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet, XlsxError};

use crate::{
    columns::column_letters,
    data::{TypedValue, anchor_time},
    error::{ConvertError, Result},
};

pub trait CellSink {
    /// Starts a new sheet; subsequent writes go to it.
    fn begin_sheet(&mut self, name: &str) -> Result<()>;

    /// Writes a header cell verbatim.
    fn write_header(&mut self, row: usize, col: usize, value: &str) -> Result<()>;

    fn write_literal(&mut self, row: usize, col: usize, value: &TypedValue) -> Result<()>;

    fn write_formula(&mut self, row: usize, col: usize, formula: &str) -> Result<()>;

    /// Writes `value` with the display format `num_format`.
    fn write_styled(
        &mut self,
        row: usize,
        col: usize,
        value: &TypedValue,
        num_format: &str,
    ) -> Result<()>;
}

pub fn cell_name(row: usize, col: usize) -> String {
    format!("{}{}", column_letters(col), row + 1)
}

#[derive(Default)]
pub struct XlsxSink {
    sheets: Vec<(String, Worksheet)>,
    /// Index into `sheets` that writes go to.
    current: Option<usize>,
    formats: HashMap<String, Format>,
}

impl XlsxSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|(name, _)| name.as_str())
    }

    /// Moves every written sheet into a new workbook, in creation order.
    pub fn into_workbook(self) -> Workbook {
        let mut workbook = Workbook::new();
        for (_, sheet) in self.sheets {
            workbook.push_worksheet(sheet);
        }
        workbook
    }

    fn format(&mut self, num_format: &str) -> Format {
        self.formats
            .entry(num_format.to_string())
            .or_insert_with(|| {
                if num_format.is_empty() {
                    Format::new()
                } else {
                    Format::new().set_num_format(num_format)
                }
            })
            .clone()
    }

    fn write<F>(&mut self, row: usize, col: usize, op: F) -> Result<()>
    where
        F: FnOnce(&mut Worksheet, RowNum, ColNum) -> std::result::Result<(), XlsxError>,
    {
        let (sheet_name, sheet) = self
            .current
            .and_then(|idx| self.sheets.get_mut(idx))
            .ok_or_else(|| ConvertError::SinkWrite {
                sheet: String::new(),
                cell: cell_name(row, col),
                source: XlsxError::ParameterError("no sheet has been started".to_string()),
            })?;
        let wrap = |source| ConvertError::SinkWrite {
            sheet: sheet_name.clone(),
            cell: cell_name(row, col),
            source,
        };
        let row_num = RowNum::try_from(row).map_err(|_| wrap(XlsxError::RowColumnLimitError))?;
        let col_num = ColNum::try_from(col).map_err(|_| wrap(XlsxError::RowColumnLimitError))?;
        op(sheet, row_num, col_num).map_err(wrap)
    }

    fn write_value(
        &mut self,
        row: usize,
        col: usize,
        value: &TypedValue,
        format: Format,
    ) -> Result<()> {
        self.write(row, col, |sheet, r, c| {
            match value {
                TypedValue::Text(text) => sheet.write_string(r, c, text.as_str()),
                TypedValue::Formula(formula) => sheet.write_formula(r, c, formula.as_str()),
                TypedValue::Bool(b) => sheet.write_boolean(r, c, *b),
                TypedValue::Number(n) => sheet.write_number_with_format(r, c, *n, &format),
                TypedValue::Date(d) => sheet.write_datetime_with_format(r, c, d, &format),
                TypedValue::Time(t) => {
                    sheet.write_datetime_with_format(r, c, &anchor_time(*t), &format)
                }
                TypedValue::DateTime(dt) => sheet.write_datetime_with_format(r, c, dt, &format),
            }
            .map(|_| ())
        })
    }
}

impl CellSink for XlsxSink {
    /// A name already in use (compared case-insensitively, as workbooks do)
    /// replaces that sheet in place.
    fn begin_sheet(&mut self, name: &str) -> Result<()> {
        let mut sheet = Worksheet::new();
        sheet
            .set_name(name)
            .map_err(|source| ConvertError::SheetCreate {
                sheet: name.to_string(),
                source,
            })?;
        let existing = self
            .sheets
            .iter()
            .position(|(taken, _)| taken.to_lowercase() == name.to_lowercase());
        match existing {
            Some(idx) => {
                warn!("Sheet '{name}' already written; replacing its contents");
                self.sheets[idx] = (name.to_string(), sheet);
                self.current = Some(idx);
            }
            None => {
                self.sheets.push((name.to_string(), sheet));
                self.current = Some(self.sheets.len() - 1);
            }
        }
        Ok(())
    }

    fn write_header(&mut self, row: usize, col: usize, value: &str) -> Result<()> {
        self.write(row, col, |sheet, r, c| sheet.write_string(r, c, value).map(|_| ()))
    }

    fn write_literal(&mut self, row: usize, col: usize, value: &TypedValue) -> Result<()> {
        let format = self.format("");
        self.write_value(row, col, value, format)
    }

    fn write_formula(&mut self, row: usize, col: usize, formula: &str) -> Result<()> {
        self.write(row, col, |sheet, r, c| sheet.write_formula(r, c, formula).map(|_| ()))
    }

    fn write_styled(
        &mut self,
        row: usize,
        col: usize,
        value: &TypedValue,
        num_format: &str,
    ) -> Result<()> {
        let format = self.format(num_format);
        self.write_value(row, col, value, format)
    }
}
