//! Run settings: built-in defaults, overlaid by a YAML config file, overlaid
//! by command-line flags.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, anyhow};
use log::debug;
use serde::Deserialize;

use crate::{
    cli::{HintArgs, parse_delimiter},
    columns::{ColumnSet, split_declarations},
    types::FormatDefaults,
};

pub const DEFAULT_HEADER_ROW: i64 = 1;

/// Keys accepted in a `--config` file. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub delimiter: Option<String>,
    pub input_encoding: Option<String>,
    pub header: Option<i64>,
    pub guess: Option<bool>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub datetime: Option<String>,
    pub date_xlsx: Option<String>,
    pub time_xlsx: Option<String>,
    pub datetime_xlsx: Option<String>,
    pub number_xlsx: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config: ConfigFile = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config file {path:?}"))?;
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub delimiter: Option<u8>,
    pub input_encoding: Option<String>,
    /// 1-based header row; `None` when the input has no header.
    pub header: Option<usize>,
    pub guess: bool,
    pub formats: FormatDefaults,
    /// Column declarations in resolution order.
    pub declarations: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            delimiter: None,
            input_encoding: None,
            header: header_row(DEFAULT_HEADER_ROW),
            guess: true,
            formats: FormatDefaults::default(),
            declarations: Vec::new(),
        }
    }
}

/// Maps the user-facing header value to a 1-based row; zero or negative
/// means there is no header row.
pub fn header_row(value: i64) -> Option<usize> {
    usize::try_from(value).ok().filter(|row| *row > 0)
}

impl Settings {
    /// Loads the config file named by `hints` (if any) and applies the
    /// format and declaration flags on top of it.
    pub fn load(hints: &HintArgs) -> Result<Self> {
        let config = match &hints.config {
            Some(path) => {
                debug!("Loading config from {path:?}");
                ConfigFile::load(path)?
            }
            None => ConfigFile::default(),
        };
        let mut settings = Settings::from_config(config)?;
        settings.apply_hint_args(hints);
        Ok(settings)
    }

    pub fn from_config(config: ConfigFile) -> Result<Self> {
        let mut settings = Settings::default();
        if let Some(delimiter) = config.delimiter.as_deref() {
            settings.delimiter = Some(
                parse_delimiter(delimiter).map_err(|err| anyhow!("Config delimiter: {err}"))?,
            );
        }
        settings.input_encoding = config.input_encoding;
        if let Some(header) = config.header {
            settings.header = header_row(header);
        }
        if let Some(guess) = config.guess {
            settings.guess = guess;
        }
        let formats = &mut settings.formats;
        overlay(&mut formats.date_input, config.date);
        overlay(&mut formats.time_input, config.time);
        overlay(&mut formats.datetime_input, config.datetime);
        overlay(&mut formats.date_output, config.date_xlsx);
        overlay(&mut formats.time_output, config.time_xlsx);
        overlay(&mut formats.datetime_output, config.datetime_xlsx);
        overlay(&mut formats.number_output, config.number_xlsx);
        settings.declarations = config.columns;
        Ok(settings)
    }

    fn apply_hint_args(&mut self, hints: &HintArgs) {
        let formats = &mut self.formats;
        overlay(&mut formats.date_input, hints.date.clone());
        overlay(&mut formats.time_input, hints.time.clone());
        overlay(&mut formats.datetime_input, hints.datetime.clone());
        overlay(&mut formats.date_output, hints.date_xlsx.clone());
        overlay(&mut formats.time_output, hints.time_xlsx.clone());
        overlay(&mut formats.datetime_output, hints.datetime_xlsx.clone());
        overlay(&mut formats.number_output, hints.number_xlsx.clone());
        self.declarations.extend(
            hints
                .columns
                .iter()
                .flat_map(|value| split_declarations(value)),
        );
    }

    /// Parses every declaration against the settled format table.
    pub fn column_set(&self) -> Result<ColumnSet> {
        let set = ColumnSet::parse(&self.declarations, &self.formats)?;
        debug!("Parsed {} column declaration(s)", set.len());
        Ok(set)
    }
}

fn overlay(target: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *target = value;
    }
}
