//! Base types, type descriptors and the implicit format table.
//!
//! A [`TypeDescriptor`] pairs a [`BaseType`] with the input and output formats
//! that apply to it. Formats come from two places: an explicit per-column
//! declaration such as `date(d-m-y -> yyyy-mm-dd)`, and the run-wide
//! [`FormatDefaults`]. Explicit formats are always tried first.

use std::{fmt, str::FromStr, sync::OnceLock};

use regex::Regex;

use crate::{
    error::{ConvertError, Result},
    layout::Layout,
    pattern::{self, PatternKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum BaseType {
    #[default]
    Unknown,
    Text,
    Number,
    Date,
    Time,
    DateTime,
    Bool,
    Formula,
}

impl BaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseType::Unknown => "unknown",
            BaseType::Text => "text",
            BaseType::Number => "number",
            BaseType::Date => "date",
            BaseType::Time => "time",
            BaseType::DateTime => "datetime",
            BaseType::Bool => "bool",
            BaseType::Formula => "formula",
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &["text", "number", "date", "time", "datetime", "bool", "formula"]
    }

    pub fn pattern_kind(&self) -> Option<PatternKind> {
        match self {
            BaseType::Date => Some(PatternKind::Date),
            BaseType::Time => Some(PatternKind::Time),
            BaseType::DateTime => Some(PatternKind::DateTime),
            _ => None,
        }
    }

    /// Builds a descriptor for this type, taking implicit formats from
    /// `defaults`.
    pub fn derive(
        self,
        explicit_input: &str,
        explicit_output: &str,
        defaults: &FormatDefaults,
    ) -> TypeDescriptor {
        TypeDescriptor::new(
            self,
            explicit_input.to_string(),
            defaults.input(self).to_string(),
            explicit_output.to_string(),
            defaults.output(self).to_string(),
        )
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BaseType {
    type Err = ConvertError;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "text" => Ok(BaseType::Text),
            "number" => Ok(BaseType::Number),
            "date" => Ok(BaseType::Date),
            "time" => Ok(BaseType::Time),
            "datetime" => Ok(BaseType::DateTime),
            "bool" => Ok(BaseType::Bool),
            "formula" => Ok(BaseType::Formula),
            _ => Err(ConvertError::invalid_declaration(
                value,
                format!("supported types: {}", BaseType::variants().join(", ")),
            )),
        }
    }
}

/// The implicit format table: one input pattern per temporal type and one
/// output display format per styled type. Built once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDefaults {
    pub date_input: String,
    pub time_input: String,
    pub datetime_input: String,
    pub date_output: String,
    pub time_output: String,
    pub datetime_output: String,
    pub number_output: String,
}

impl Default for FormatDefaults {
    fn default() -> Self {
        FormatDefaults {
            date_input: "ymd".to_string(),
            time_input: "hms".to_string(),
            datetime_input: "20060102 150405".to_string(),
            date_output: "yyyy/mm/dd".to_string(),
            time_output: "hh:mm:ss".to_string(),
            datetime_output: "yyyy/mm/dd hh:mm:ss".to_string(),
            number_output: String::new(),
        }
    }
}

impl FormatDefaults {
    pub fn input(&self, base: BaseType) -> &str {
        match base {
            BaseType::Date => &self.date_input,
            BaseType::Time => &self.time_input,
            BaseType::DateTime => &self.datetime_input,
            _ => "",
        }
    }

    pub fn output(&self, base: BaseType) -> &str {
        match base {
            BaseType::Date => &self.date_output,
            BaseType::Time => &self.time_output,
            BaseType::DateTime => &self.datetime_output,
            BaseType::Number => &self.number_output,
            _ => "",
        }
    }

    /// Candidate layouts for the implicit input pattern of `base`.
    pub fn input_layouts(&self, base: BaseType) -> Vec<Layout> {
        compile_candidates(base, self.input(base))
    }
}

fn compile_candidates(base: BaseType, pattern: &str) -> Vec<Layout> {
    match base.pattern_kind() {
        Some(kind) if !pattern.is_empty() => pattern::translate(kind, pattern)
            .iter()
            .map(|layout| Layout::compile(layout))
            .collect(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    base: BaseType,
    explicit_input: String,
    implicit_input: String,
    explicit_output: String,
    implicit_output: String,
    layouts: Vec<Layout>,
}

impl TypeDescriptor {
    pub fn new(
        base: BaseType,
        explicit_input: String,
        implicit_input: String,
        explicit_output: String,
        implicit_output: String,
    ) -> Self {
        let mut layouts = compile_candidates(base, &explicit_input);
        layouts.extend(compile_candidates(base, &implicit_input));
        TypeDescriptor {
            base,
            explicit_input,
            implicit_input,
            explicit_output,
            implicit_output,
            layouts,
        }
    }

    /// Parses `BASETYPE[(INPUT[->OUTPUT])]`.
    pub fn parse(declaration: &str, defaults: &FormatDefaults) -> Result<Self> {
        static DECLARATION: OnceLock<Regex> = OnceLock::new();
        let re = DECLARATION.get_or_init(|| {
            Regex::new(r"(?is)^\s*(text|number|datetime|date|time|bool|formula)\s*(?:\((.*?)(?:->(.*))?\))?\s*$")
                .expect("declaration grammar compiles")
        });
        let caps = re.captures(declaration).ok_or_else(|| {
            ConvertError::invalid_declaration(
                declaration,
                "expected TYPE[(INPUT[->OUTPUT])]",
            )
        })?;

        let base = BaseType::from_str(&caps[1])?;
        let input = caps.get(2).map_or("", |m| m.as_str().trim());
        let output = caps.get(3).map_or("", |m| m.as_str().trim());
        Ok(base.derive(input, output, defaults))
    }

    pub fn base(&self) -> BaseType {
        self.base
    }

    pub fn explicit_input(&self) -> &str {
        &self.explicit_input
    }

    pub fn implicit_input(&self) -> &str {
        &self.implicit_input
    }

    /// Candidate layouts in trial order: explicit first, then implicit.
    pub fn input_layouts(&self) -> &[Layout] {
        &self.layouts
    }

    /// The display format for cells of this type; explicit wins.
    pub fn output_format(&self) -> &str {
        if self.explicit_output.is_empty() {
            &self.implicit_output
        } else {
            &self.explicit_output
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base.as_str())?;
        let input = match (self.explicit_input.as_str(), self.implicit_input.as_str()) {
            ("", "") => String::new(),
            (explicit, "") => explicit.to_string(),
            ("", implicit) => implicit.to_string(),
            (explicit, implicit) => format!("{explicit} or {implicit}"),
        };
        let output = self.output_format();
        if input.is_empty() && output.is_empty() {
            return Ok(());
        }
        write!(f, "({input}")?;
        if !output.is_empty() {
            write!(f, "->{output}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> FormatDefaults {
        FormatDefaults::default()
    }

    #[test]
    fn parse_plain_type_defers_to_implicit_formats() {
        let ty = TypeDescriptor::parse("date", &defaults()).unwrap();
        assert_eq!(ty.base(), BaseType::Date);
        assert_eq!(ty.explicit_input(), "");
        assert_eq!(ty.implicit_input(), "ymd");
        assert_eq!(ty.output_format(), "yyyy/mm/dd");
        assert_eq!(ty.input_layouts().len(), 3);
    }

    #[test]
    fn parse_trims_input_and_output_segments() {
        let ty = TypeDescriptor::parse("date( d-m-y -> yyyy-mm-dd )", &defaults()).unwrap();
        assert_eq!(ty.explicit_input(), "d-m-y");
        assert_eq!(ty.output_format(), "yyyy-mm-dd");
        let layouts = ty
            .input_layouts()
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            layouts,
            vec!["02-01-2006", "02-01-06", "2-1-06", "20060102", "060102", "0612"]
        );
    }

    #[test]
    fn parse_output_only() {
        let ty = TypeDescriptor::parse("time(->h:mm)", &defaults()).unwrap();
        assert_eq!(ty.explicit_input(), "");
        assert_eq!(ty.output_format(), "h:mm");
    }

    #[test]
    fn parse_is_case_insensitive_for_the_type() {
        let ty = TypeDescriptor::parse(" Number ", &defaults()).unwrap();
        assert_eq!(ty.base(), BaseType::Number);
        assert!(ty.input_layouts().is_empty());
    }

    #[test]
    fn parse_keeps_commas_inside_layouts() {
        let ty = TypeDescriptor::parse("datetime(Jan 2, 2006 3:04pm)", &defaults()).unwrap();
        assert_eq!(ty.explicit_input(), "Jan 2, 2006 3:04pm");
        assert_eq!(ty.input_layouts()[0].as_str(), "Jan 2, 2006 3:04pm");
    }

    #[test]
    fn parse_rejects_unknown_types_and_trailing_garbage() {
        for bad in ["money", "date(ymd", "textual", "", "number(1)x"] {
            let err = TypeDescriptor::parse(bad, &defaults()).unwrap_err();
            assert!(
                matches!(err, ConvertError::InvalidDeclaration { .. }),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn display_renders_both_inputs_and_effective_output() {
        let ty = TypeDescriptor::parse("date(d-m-y)", &defaults()).unwrap();
        assert_eq!(ty.to_string(), "date(d-m-y or ymd->yyyy/mm/dd)");

        let text = TypeDescriptor::parse("text", &defaults()).unwrap();
        assert_eq!(text.to_string(), "text");

        let number = BaseType::Number.derive("", "#,##0.00", &defaults());
        assert_eq!(number.to_string(), "number(->#,##0.00)");
    }

    #[test]
    fn base_type_round_trips_through_display() {
        for token in BaseType::variants() {
            let base = BaseType::from_str(token).unwrap();
            assert_eq!(base.to_string(), *token);
        }
        assert!(BaseType::from_str("unknown").is_err());
    }
}
