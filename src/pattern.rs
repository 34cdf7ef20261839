//! Token pattern translation.
//!
//! Users write dates as `yyyy/mm/dd` or `d-m-y` and times as `hh:mm:ss` or
//! `h m s`. These patterns are translated into layouts (see
//! [`crate::layout`]). Patterns without any token letter are taken to be
//! layouts already and pass through untouched.
//!
//! A pattern made only of single-letter tokens does not say how wide each
//! field is, so several candidate layouts are produced and tried in order.

use itertools::iproduct;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    Date,
    Time,
    DateTime,
}

const DATE_WIDE: &[(&str, &str)] = &[("yy", "2006"), ("y", "2006"), ("m", "01"), ("d", "02")];
const DATE_SHORT_YEAR: &[(&str, &str)] = &[("yy", "06"), ("y", "06"), ("m", "01"), ("d", "02")];
const DATE_NARROW: &[(&str, &str)] = &[("yy", "06"), ("y", "06"), ("m", "1"), ("d", "2")];
const DATE_EXPLICIT: &[(&str, &str)] = &[
    ("yyyy", "2006"),
    ("yy", "06"),
    ("y", "06"),
    ("mm", "01"),
    ("m", "1"),
    ("dd", "02"),
    ("d", "2"),
];

const TIME_WIDE: &[(&str, &str)] = &[("hh", "15"), ("h", "15"), ("m", "04"), ("s", "05")];
const TIME_NARROW: &[(&str, &str)] = &[("h", "3"), ("m", "4"), ("s", "5")];
const TIME_EXPLICIT: &[(&str, &str)] = &[
    ("hh", "15"),
    ("h", "15"),
    ("mm", "04"),
    ("m", "4"),
    ("ss", "05"),
    ("s", "5"),
];

/// Translates `pattern` into the ordered layouts to try for `kind`.
pub fn translate(kind: PatternKind, pattern: &str) -> Vec<String> {
    match kind {
        PatternKind::Date => translate_date(pattern),
        PatternKind::Time => translate_time(pattern),
        PatternKind::DateTime => translate_datetime(pattern),
    }
}

fn substitute(pattern: &str, table: &[(&str, &str)]) -> String {
    table
        .iter()
        .fold(pattern.to_string(), |acc, (token, layout)| {
            acc.replace(token, layout)
        })
}

fn translate_date(pattern: &str) -> Vec<String> {
    if !pattern.contains(['y', 'm', 'd']) {
        return vec![pattern.to_string()];
    }
    let doubled = ["yyyy", "mm", "dd"].iter().any(|t| pattern.contains(t));
    if doubled {
        return vec![substitute(pattern, DATE_EXPLICIT)];
    }
    vec![
        substitute(pattern, DATE_WIDE),
        substitute(pattern, DATE_SHORT_YEAR),
        substitute(pattern, DATE_NARROW),
    ]
}

fn translate_time(pattern: &str) -> Vec<String> {
    if !pattern.contains(['h', 'm', 's']) {
        return vec![pattern.to_string()];
    }
    let doubled = ["hh", "mm", "ss"].iter().any(|t| pattern.contains(t));
    if doubled {
        return vec![substitute(pattern, TIME_EXPLICIT)];
    }
    vec![
        substitute(pattern, TIME_WIDE),
        substitute(pattern, TIME_NARROW),
    ]
}

/// A datetime pattern is token based only when it names a year; it is split
/// at its first whitespace run into a date half and a time half.
fn translate_datetime(pattern: &str) -> Vec<String> {
    if !pattern.contains('y') {
        return vec![pattern.to_string()];
    }
    let Some(start) = pattern.find(char::is_whitespace) else {
        return translate_date(pattern);
    };
    let tail = &pattern[start..];
    let end = start + (tail.len() - tail.trim_start().len());
    let (date, separator, time) = (&pattern[..start], &pattern[start..end], &pattern[end..]);

    iproduct!(translate_date(date), translate_time(time))
        .map(|(d, t)| format!("{d}{separator}{t}"))
        .collect()
}
