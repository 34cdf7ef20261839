//! Field type guessing.
//!
//! A declared column type is tried first and, when it does not parse, the
//! value is kept as text: a declaration states intent, so the heuristics are
//! not consulted for that column. Without a declaration the heuristics run
//! in a fixed order and the first one that accepts the value wins.

use crate::{
    data::{TypedValue, parse_bool, parse_bool_literal, parse_number},
    layout::Layout,
    types::{BaseType, FormatDefaults, TypeDescriptor},
};

#[derive(Debug, Clone)]
pub struct TypeGuesser<'a> {
    defaults: &'a FormatDefaults,
    datetime_layouts: Vec<Layout>,
    date_layouts: Vec<Layout>,
    time_layouts: Vec<Layout>,
}

impl<'a> TypeGuesser<'a> {
    pub fn new(defaults: &'a FormatDefaults) -> Self {
        TypeGuesser {
            defaults,
            datetime_layouts: defaults.input_layouts(BaseType::DateTime),
            date_layouts: defaults.input_layouts(BaseType::Date),
            time_layouts: defaults.input_layouts(BaseType::Time),
        }
    }

    /// Infers the type of `raw`, honouring `hint` when it declares one.
    pub fn guess(&self, raw: &str, hint: Option<&TypeDescriptor>) -> (BaseType, TypedValue) {
        if let Some(hint) = hint.filter(|h| h.base() != BaseType::Unknown) {
            return parse_declared(raw, hint)
                .unwrap_or_else(|| (BaseType::Text, TypedValue::Text(raw.to_string())));
        }

        match raw.chars().next() {
            Some('\'' | '0') => return (BaseType::Text, TypedValue::Text(raw.to_string())),
            Some('=') => return (BaseType::Formula, TypedValue::Formula(raw.to_string())),
            _ => {}
        }
        if let Some(b) = parse_bool_literal(raw) {
            return (BaseType::Bool, TypedValue::Bool(b));
        }
        if let Some(dt) = self.datetime_layouts.iter().find_map(|l| l.parse_datetime(raw)) {
            return (BaseType::DateTime, TypedValue::DateTime(dt));
        }
        if let Some(d) = self.date_layouts.iter().find_map(|l| l.parse_date(raw)) {
            return (BaseType::Date, TypedValue::Date(d));
        }
        if let Some(t) = self.time_layouts.iter().find_map(|l| l.parse_time(raw)) {
            return (BaseType::Time, TypedValue::Time(t));
        }
        if let Some(f) = parse_number(raw) {
            return (BaseType::Number, TypedValue::Number(f));
        }
        (BaseType::Unknown, TypedValue::Text(raw.to_string()))
    }

    /// The display format for a guessed value: the hint's own format when
    /// the value kept the declared type, the run-wide default otherwise.
    pub fn output_format<'h>(
        &'h self,
        base: BaseType,
        hint: Option<&'h TypeDescriptor>,
    ) -> &'h str {
        match hint {
            Some(hint) if hint.base() == base => hint.output_format(),
            _ => self.defaults.output(base),
        }
    }
}

fn parse_declared(raw: &str, hint: &TypeDescriptor) -> Option<(BaseType, TypedValue)> {
    let layouts = hint.input_layouts();
    let value = match hint.base() {
        BaseType::Unknown => return None,
        BaseType::Text => TypedValue::Text(raw.to_string()),
        BaseType::Formula => TypedValue::Formula(raw.to_string()),
        BaseType::Number => TypedValue::Number(parse_number(raw)?),
        BaseType::Bool => TypedValue::Bool(parse_bool(raw)?),
        BaseType::Date => TypedValue::Date(layouts.iter().find_map(|l| l.parse_date(raw))?),
        BaseType::Time => TypedValue::Time(layouts.iter().find_map(|l| l.parse_time(raw))?),
        BaseType::DateTime => {
            TypedValue::DateTime(layouts.iter().find_map(|l| l.parse_datetime(raw))?)
        }
    };
    Some((hint.base(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn hint(decl: &str) -> TypeDescriptor {
        TypeDescriptor::parse(decl, &FormatDefaults::default()).expect("valid declaration")
    }

    fn date(y: i32, m: u32, d: u32) -> TypedValue {
        TypedValue::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn time(h: u32, m: u32, s: u32) -> TypedValue {
        TypedValue::Time(NaiveTime::from_hms_opt(h, m, s).unwrap())
    }

    fn text(value: &str) -> (BaseType, TypedValue) {
        (BaseType::Text, TypedValue::Text(value.to_string()))
    }

    #[test]
    fn heuristics_without_hints() {
        let defaults = FormatDefaults::default();
        let guesser = TypeGuesser::new(&defaults);

        assert_eq!(guesser.guess("01", None), text("01"));
        assert_eq!(
            guesser.guess("11", None),
            (BaseType::Number, TypedValue::Number(11.0))
        );
        assert_eq!(guesser.guess("20220101", None), (BaseType::Date, date(2022, 1, 1)));
        assert_eq!(guesser.guess("123456", None), (BaseType::Time, time(12, 34, 56)));
        assert_eq!(guesser.guess("012345", None), text("012345"));
        assert_eq!(
            guesser.guess("TRUE", None),
            (BaseType::Bool, TypedValue::Bool(true))
        );
        assert_eq!(
            guesser.guess("False", None),
            (BaseType::Bool, TypedValue::Bool(false))
        );
        assert_eq!(
            guesser.guess("hello", None),
            (BaseType::Unknown, TypedValue::Text("hello".to_string()))
        );
    }

    #[test]
    fn quote_and_formula_markers() {
        let defaults = FormatDefaults::default();
        let guesser = TypeGuesser::new(&defaults);
        assert_eq!(guesser.guess("'123", None), text("'123"));
        assert_eq!(
            guesser.guess("=SUM(A1:A3)", None),
            (BaseType::Formula, TypedValue::Formula("=SUM(A1:A3)".to_string()))
        );
    }

    #[test]
    fn datetime_heuristic_uses_global_layout() {
        let defaults = FormatDefaults::default();
        let guesser = TypeGuesser::new(&defaults);
        let (base, value) = guesser.guess("20220304 123456", None);
        assert_eq!(base, BaseType::DateTime);
        assert_eq!(
            value,
            TypedValue::DateTime(
                NaiveDate::from_ymd_opt(2022, 3, 4)
                    .unwrap()
                    .and_hms_opt(12, 34, 56)
                    .unwrap()
            )
        );
    }

    #[test]
    fn declared_number_overrides_leading_zero_escape() {
        let defaults = FormatDefaults::default();
        let guesser = TypeGuesser::new(&defaults);
        assert_eq!(
            guesser.guess("01", Some(&hint("number"))),
            (BaseType::Number, TypedValue::Number(1.0))
        );
    }

    #[test]
    fn declared_bool_falls_back_to_text() {
        let defaults = FormatDefaults::default();
        let guesser = TypeGuesser::new(&defaults);
        let bool_hint = hint("bool");
        assert_eq!(
            guesser.guess("1", Some(&bool_hint)),
            (BaseType::Bool, TypedValue::Bool(true))
        );
        assert_eq!(guesser.guess("01", Some(&bool_hint)), text("01"));
    }

    #[test]
    fn declared_date_patterns() {
        let defaults = FormatDefaults::default();
        let guesser = TypeGuesser::new(&defaults);
        assert_eq!(
            guesser.guess("4-3-22", Some(&hint("date(d-m-y)"))),
            (BaseType::Date, date(2022, 3, 4))
        );
        assert_eq!(
            guesser.guess("4-3-22", Some(&hint("date(2-1-06)"))),
            (BaseType::Date, date(2022, 3, 4))
        );
        assert_eq!(guesser.guess("4-3-22", Some(&hint("date(dd-mm-yyyy)"))), text("4-3-22"));
        assert_eq!(
            guesser.guess("Feb 4 2008", Some(&hint("date(Jan 2 2006)"))),
            (BaseType::Date, date(2008, 2, 4))
        );
    }

    #[test]
    fn declared_time_patterns() {
        let defaults = FormatDefaults::default();
        let guesser = TypeGuesser::new(&defaults);
        assert_eq!(
            guesser.guess("012345", Some(&hint("time"))),
            (BaseType::Time, time(1, 23, 45))
        );
        assert_eq!(
            guesser.guess("1 2 3", Some(&hint("time(h m s)"))),
            (BaseType::Time, time(1, 2, 3))
        );
        assert_eq!(guesser.guess("1 2 3", Some(&hint("time(hh mm ss)"))), text("1 2 3"));
    }

    #[test]
    fn declared_datetime_does_not_reenter_heuristics() {
        let defaults = FormatDefaults::default();
        let guesser = TypeGuesser::new(&defaults);
        assert_eq!(guesser.guess("20220304", Some(&hint("datetime"))), text("20220304"));
        assert_eq!(guesser.guess("true", Some(&hint("datetime"))), text("true"));
    }

    #[test]
    fn mismatched_global_datetime_layout_keeps_text() {
        let defaults = FormatDefaults {
            datetime_input: "yyyyMMdd HHmmss".to_string(),
            ..FormatDefaults::default()
        };
        let guesser = TypeGuesser::new(&defaults);
        let declared = TypeDescriptor::parse("datetime", &defaults).unwrap();
        assert_eq!(guesser.guess("20220304", Some(&declared)), text("20220304"));
    }

    #[test]
    fn declared_text_and_formula_take_value_verbatim() {
        let defaults = FormatDefaults::default();
        let guesser = TypeGuesser::new(&defaults);
        assert_eq!(guesser.guess("42", Some(&hint("text"))), text("42"));
        assert_eq!(
            guesser.guess("A1*2", Some(&hint("formula"))),
            (BaseType::Formula, TypedValue::Formula("A1*2".to_string()))
        );
    }

    #[test]
    fn output_format_prefers_matching_hint() {
        let defaults = FormatDefaults::default();
        let guesser = TypeGuesser::new(&defaults);
        let declared = hint("date(d-m-y -> yyyy-mm-dd)");
        assert_eq!(
            guesser.output_format(BaseType::Date, Some(&declared)),
            "yyyy-mm-dd"
        );
        assert_eq!(guesser.output_format(BaseType::Date, None), "yyyy/mm/dd");
        assert_eq!(guesser.output_format(BaseType::Text, Some(&declared)), "");
    }
}
