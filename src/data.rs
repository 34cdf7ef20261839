use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Date given to time-only values before they reach a spreadsheet, which
/// stores times as fractions of a dated serial number.
pub const BASE_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1900, 1, 1) {
    Some(date) => date,
    None => panic!("1900-01-01 is a valid date"),
};

#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Formula(String),
}

/// Anchors a time-only value to [`BASE_DATE`].
pub fn anchor_time(time: NaiveTime) -> NaiveDateTime {
    BASE_DATE.and_time(time)
}

/// Parses a finite 64-bit float; infinities and NaN cannot live in a cell.
pub fn parse_number(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Case-insensitive `true`/`false` only.
pub fn parse_bool_literal(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Boolean parse for columns declared `bool`: the literals plus `t`, `f`,
/// `1` and `0`.
pub fn parse_bool(value: &str) -> Option<bool> {
    parse_bool_literal(value).or_else(|| match value {
        "1" | "t" | "T" => Some(true),
        "0" | "f" | "F" => Some(false),
        _ => None,
    })
}
