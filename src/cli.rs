use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Convert CSV files into typed Excel workbooks",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert one or more CSV files into a workbook with one sheet per input
    Convert(ConvertArgs),
    /// Show how column declarations are parsed, in resolution order
    Columns(ColumnsArgs),
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Input CSV files; `-` reads stdin into a sheet named `stdin`
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,
    /// Output workbook (`-` writes to stdout)
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(short = 'd', long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// 1-based header row; 0 or a negative value means no header (defaults to 1)
    #[arg(long, allow_negative_numbers = true)]
    pub header: Option<i64>,
    /// Infer cell types; `false` writes every field as text (defaults to true)
    #[arg(short = 'g', long, action = clap::ArgAction::Set, value_name = "BOOL")]
    pub guess: Option<bool>,
    #[command(flatten)]
    pub hints: HintArgs,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub hints: HintArgs,
}

/// Column declarations and the run-wide format table.
#[derive(Debug, Args, Default, Clone)]
pub struct HintArgs {
    /// Column declarations `[SHEET!]NAME:TYPE[(INPUT[->OUTPUT])]`, comma separated
    /// (`\,` for a literal comma); repeatable
    #[arg(short = 'C', long = "columns", visible_alias = "cols", action = clap::ArgAction::Append)]
    pub columns: Vec<String>,
    /// YAML file with defaults for any of these options
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// Input pattern for dates, e.g. `d-m-y` (defaults to `ymd`)
    #[arg(long, visible_alias = "df")]
    pub date: Option<String>,
    /// Input pattern for times, e.g. `h:m:s` (defaults to `hms`)
    #[arg(long, visible_alias = "tf")]
    pub time: Option<String>,
    /// Input pattern for datetimes (defaults to `20060102 150405`)
    #[arg(long, visible_alias = "dtf")]
    pub datetime: Option<String>,
    /// Excel display format for dates (defaults to `yyyy/mm/dd`)
    #[arg(long = "date-xlsx", visible_alias = "dxf")]
    pub date_xlsx: Option<String>,
    /// Excel display format for times (defaults to `hh:mm:ss`)
    #[arg(long = "time-xlsx", visible_alias = "txf")]
    pub time_xlsx: Option<String>,
    /// Excel display format for datetimes (defaults to `yyyy/mm/dd hh:mm:ss`)
    #[arg(long = "datetime-xlsx", visible_alias = "dtxf")]
    pub datetime_xlsx: Option<String>,
    /// Excel display format for numbers (defaults to General)
    #[arg(long = "number-xlsx", visible_alias = "nxf")]
    pub number_xlsx: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" | "\\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
