//! The `convert` command: every input becomes one sheet of the output
//! workbook.
//!
//! Records are read one at a time. The header row is written verbatim and
//! names the columns for hint lookup; rows above it are skipped. Every other
//! field is guessed (or written as text when guessing is off) and sent to the
//! sink. Nothing reaches the output path until every input was written.

use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    cli::ConvertArgs,
    columns::{ColumnSet, column_letters},
    config::{Settings, header_row},
    data::TypedValue,
    guess::TypeGuesser,
    io_utils,
    sink::{CellSink, XlsxSink},
    types::{BaseType, TypeDescriptor},
};

/// Longest sheet name a workbook accepts.
const SHEET_NAME_LIMIT: usize = 31;

pub fn execute(args: &ConvertArgs) -> Result<()> {
    let mut settings = Settings::load(&args.hints)?;
    if args.delimiter.is_some() {
        settings.delimiter = args.delimiter;
    }
    if args.input_encoding.is_some() {
        settings.input_encoding = args.input_encoding.clone();
    }
    if let Some(header) = args.header {
        settings.header = header_row(header);
    }
    if let Some(guess) = args.guess {
        settings.guess = guess;
    }

    let hints = settings.column_set()?;
    let encoding = io_utils::resolve_encoding(settings.input_encoding.as_deref())?;
    let converter = Converter::new(&settings, &hints);
    let mut sink = XlsxSink::new();

    for input in &args.inputs {
        let delimiter = io_utils::resolve_input_delimiter(input, settings.delimiter);
        let sheet = sheet_name(input);
        info!(
            "Converting '{}' into sheet '{}' (delimiter '{}', encoding {})",
            input.display(),
            sheet,
            crate::printable_delimiter(delimiter),
            encoding.name()
        );
        let reader = io_utils::open_csv_reader_from_path(input, delimiter)?;
        let records = io_utils::decoded_records(reader, encoding);
        let summary = converter
            .write_sheet(&mut sink, &sheet, records)
            .with_context(|| format!("Converting {input:?}"))?;
        info!(
            "Sheet '{}': {} row(s), {} cell(s)",
            sheet, summary.rows, summary.cells
        );
        debug!("Sheet '{}' cell types: {:?}", sheet, summary.types);
    }

    let sheets = sink.sheet_names().count();
    let mut workbook = sink.into_workbook();
    io_utils::commit_workbook(&mut workbook, &args.output)
        .with_context(|| format!("Writing workbook {:?}", args.output))?;
    info!(
        "Wrote {} sheet(s) to {}",
        sheets,
        if io_utils::is_dash(&args.output) {
            "stdout".to_string()
        } else {
            args.output.display().to_string()
        }
    );
    Ok(())
}

/// Sheet name for an input: its file name, or `stdin` for `-`. Characters a
/// workbook rejects become `_` and the name is cut to the sheet name limit.
pub fn sheet_name(input: &Path) -> String {
    if io_utils::is_dash(input) {
        return "stdin".to_string();
    }
    let raw = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let cleaned = raw
        .chars()
        .map(|ch| match ch {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(SHEET_NAME_LIMIT)
        .collect::<String>();
    let cleaned = cleaned.trim_matches('\'');
    if cleaned.is_empty() {
        "sheet".to_string()
    } else {
        cleaned.to_string()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SheetSummary {
    /// Rows written, header included.
    pub rows: usize,
    /// Non-empty cells written.
    pub cells: usize,
    pub types: BTreeMap<BaseType, usize>,
}

/// Settled per-run state shared by every sheet.
pub struct Converter<'a> {
    hints: &'a ColumnSet,
    guesser: TypeGuesser<'a>,
    header: Option<usize>,
    guess: bool,
}

impl<'a> Converter<'a> {
    pub fn new(settings: &'a Settings, hints: &'a ColumnSet) -> Self {
        Converter {
            hints,
            guesser: TypeGuesser::new(&settings.formats),
            header: settings.header,
            guess: settings.guess,
        }
    }

    /// Writes `records` as a new sheet of `sink`.
    pub fn write_sheet<S, I>(&self, sink: &mut S, sheet: &str, records: I) -> Result<SheetSummary>
    where
        S: CellSink,
        I: IntoIterator<Item = Result<Vec<String>>>,
    {
        sink.begin_sheet(sheet)?;
        let mut summary = SheetSummary::default();
        let mut names: Vec<String> = Vec::new();
        let mut hints: Vec<Option<&TypeDescriptor>> = Vec::new();

        for (idx, record) in records.into_iter().enumerate() {
            let fields = record?;
            let line = idx + 1;
            match self.header {
                Some(header) if line < header => continue,
                Some(header) if line == header => {
                    names = fields.iter().map(|field| field.trim().to_string()).collect();
                    for (col, value) in fields.iter().enumerate() {
                        if !value.is_empty() {
                            sink.write_header(summary.rows, col, value)?;
                            summary.cells += 1;
                        }
                    }
                    summary.rows += 1;
                    continue;
                }
                _ => {}
            }

            while hints.len() < fields.len() {
                let col = hints.len();
                hints.push(self.column_hint(sheet, names.get(col).map_or("", String::as_str), col));
            }
            for (col, raw) in fields.iter().enumerate() {
                if raw.is_empty() {
                    continue;
                }
                let base = self.write_field(sink, summary.rows, col, raw, hints[col])?;
                *summary.types.entry(base).or_default() += 1;
                summary.cells += 1;
            }
            summary.rows += 1;
        }
        Ok(summary)
    }

    fn column_hint(&self, sheet: &str, name: &str, col: usize) -> Option<&'a TypeDescriptor> {
        let column = self.hints.find(sheet, name, Some(col))?;
        debug!(
            "Column {} ('{}') of '{}' uses {}:{}",
            column_letters(col),
            name,
            sheet,
            column.name,
            column.datatype
        );
        Some(&column.datatype)
    }

    fn write_field<S: CellSink>(
        &self,
        sink: &mut S,
        row: usize,
        col: usize,
        raw: &str,
        hint: Option<&TypeDescriptor>,
    ) -> Result<BaseType> {
        if !self.guess {
            sink.write_literal(row, col, &TypedValue::Text(raw.to_string()))?;
            return Ok(BaseType::Text);
        }

        let (base, value) = self.guesser.guess(raw, hint);
        match &value {
            TypedValue::Formula(formula) => sink.write_formula(row, col, formula)?,
            TypedValue::Text(_) | TypedValue::Bool(_) => sink.write_literal(row, col, &value)?,
            _ => {
                let format = self.guesser.output_format(base, hint);
                if format.is_empty() {
                    sink.write_literal(row, col, &value)?;
                } else {
                    sink.write_styled(row, col, &value, format)?;
                }
            }
        }
        Ok(base)
    }
}
