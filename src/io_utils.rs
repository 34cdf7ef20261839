//! I/O utilities for delimited input and workbook output.
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.tsv` → tab,
//!   anything else → comma) with manual override support.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **Records**: header-less readers yielding decoded records one at a time.
//! - **Commit**: the workbook is saved to a staging file and renamed into
//!   place so a failed run never leaves a partial workbook behind.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{
    ffi::OsString,
    fs::{self, File},
    io::{BufReader, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use rust_xlsxwriter::Workbook;

use crate::error::ConvertError;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    Ok(open_csv_reader(reader, delimiter))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Decoded records of `reader`, in file order. Line numbers from the CSV
/// parser are attached to read errors.
pub fn decoded_records<R>(
    reader: csv::Reader<R>,
    encoding: &'static Encoding,
) -> impl Iterator<Item = Result<Vec<String>>>
where
    R: Read,
{
    reader.into_byte_records().map(move |record| {
        let record = record.context("Reading CSV record")?;
        let line = record.position().map(|p| p.line());
        decode_record(&record, encoding).with_context(|| match line {
            Some(line) => format!("Decoding record on line {line}"),
            None => "Decoding record".to_string(),
        })
    })
}

/// Staging file used while the workbook for `output` is being saved.
pub fn staging_path(output: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(output.file_name().unwrap_or_else(|| output.as_os_str()));
    name.push(".partial");
    output.with_file_name(name)
}

/// Saves `workbook` to `output`, or streams it to stdout when `output` is `-`.
pub fn commit_workbook(workbook: &mut Workbook, output: &Path) -> Result<()> {
    if is_dash(output) {
        let buffer = workbook.save_to_buffer().map_err(ConvertError::Save)?;
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(&buffer)
            .context("Writing workbook to stdout")?;
        stdout.flush().context("Flushing stdout")?;
        return Ok(());
    }

    let staging = staging_path(output);
    let saved = workbook
        .save(&staging)
        .map_err(ConvertError::Save)
        .with_context(|| format!("Saving workbook to {staging:?}"))
        .and_then(|()| {
            fs::rename(&staging, output)
                .with_context(|| format!("Moving workbook into place at {output:?}"))
        });
    if saved.is_err() && staging.exists() {
        let _ = fs::remove_file(&staging);
    }
    saved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_defaults_follow_extension() {
        assert_eq!(resolve_input_delimiter(Path::new("a.tsv"), None), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("a.TSV"), None), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("a.csv"), None), b',');
        assert_eq!(resolve_input_delimiter(Path::new("-"), None), b',');
        assert_eq!(resolve_input_delimiter(Path::new("a.tsv"), Some(b';')), b';');
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        assert!(resolve_encoding(Some("not-a-charset")).is_err());
        assert_eq!(resolve_encoding(Some(" latin1 ")).unwrap().name(), "windows-1252");
    }

    #[test]
    fn records_are_read_without_header_handling() {
        let reader = open_csv_reader("a,b\n1,2\n".as_bytes(), b',');
        let rows = decoded_records(reader, UTF_8)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(rows, vec![vec!["a", "b"], vec!["1", "2"]]);
    }

    #[test]
    fn ragged_records_are_an_error() {
        let reader = open_csv_reader("a,b\n1\n".as_bytes(), b',');
        let result = decoded_records(reader, UTF_8).collect::<Result<Vec<_>>>();
        assert!(result.is_err());
    }

    #[test]
    fn records_are_decoded_with_the_input_encoding() {
        let bytes: &[u8] = b"caf\xe9\n";
        let encoding = resolve_encoding(Some("windows-1252")).unwrap();
        let rows = decoded_records(open_csv_reader(bytes, b','), encoding)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(rows, vec![vec!["café"]]);
    }

    #[test]
    fn staging_file_sits_next_to_output() {
        assert_eq!(
            staging_path(Path::new("out/book.xlsx")),
            PathBuf::from("out/.book.xlsx.partial")
        );
    }
}
