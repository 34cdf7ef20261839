//! Layout-by-example compilation.
//!
//! A layout spells out how the reference moment `Mon Jan 2 15:04:05 2006`
//! would be written (`2006-01-02`, `Jan 2, 2006 3:04pm`, `150405`, ...).
//! [`Layout::compile`] turns such a string into `chrono` parse items once, so
//! that each field only pays for the parse itself.
//!
//! Every parse is gated by width: the raw value must have exactly as many
//! characters as the layout text. This keeps `060102` from claiming a
//! four-character value through `chrono`'s variable-width numeric fields.

use std::fmt;

use chrono::format::{self, Fixed, Item, Numeric, Pad, Parsed};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chunk {
    LongMonth,
    ShortMonth,
    LongWeekday,
    ShortWeekday,
    Year,
    YearMod100,
    ZeroMonth,
    Month,
    ZeroDay,
    Day,
    SpaceDay,
    Hour,
    ZeroHour12,
    Hour12,
    ZeroMinute,
    Minute,
    ZeroSecond,
    Second,
    UpperMeridiem,
    LowerMeridiem,
    /// `.000`-style run: exactly this many digits are written and read.
    Fraction(usize),
    /// `.999`-style run: trailing zeros are dropped when writing.
    TrimmedFraction,
}

impl Chunk {
    fn is_date(self) -> bool {
        matches!(
            self,
            Chunk::LongMonth
                | Chunk::ShortMonth
                | Chunk::Year
                | Chunk::YearMod100
                | Chunk::ZeroMonth
                | Chunk::Month
                | Chunk::ZeroDay
                | Chunk::Day
                | Chunk::SpaceDay
        )
    }

    fn is_clock(self) -> bool {
        matches!(
            self,
            Chunk::Hour
                | Chunk::ZeroHour12
                | Chunk::Hour12
                | Chunk::ZeroMinute
                | Chunk::Minute
                | Chunk::ZeroSecond
                | Chunk::Second
        )
    }

    fn item(self, twelve_hour: bool) -> Item<'static> {
        match self {
            Chunk::LongMonth => Item::Fixed(Fixed::LongMonthName),
            Chunk::ShortMonth => Item::Fixed(Fixed::ShortMonthName),
            Chunk::LongWeekday => Item::Fixed(Fixed::LongWeekdayName),
            Chunk::ShortWeekday => Item::Fixed(Fixed::ShortWeekdayName),
            Chunk::Year => Item::Numeric(Numeric::Year, Pad::Zero),
            Chunk::YearMod100 => Item::Numeric(Numeric::YearMod100, Pad::Zero),
            Chunk::ZeroMonth => Item::Numeric(Numeric::Month, Pad::Zero),
            Chunk::Month => Item::Numeric(Numeric::Month, Pad::None),
            Chunk::ZeroDay => Item::Numeric(Numeric::Day, Pad::Zero),
            Chunk::Day => Item::Numeric(Numeric::Day, Pad::None),
            Chunk::SpaceDay => Item::Numeric(Numeric::Day, Pad::Space),
            Chunk::Hour => Item::Numeric(Numeric::Hour, Pad::Zero),
            Chunk::ZeroHour12 if twelve_hour => Item::Numeric(Numeric::Hour12, Pad::Zero),
            Chunk::Hour12 if twelve_hour => Item::Numeric(Numeric::Hour12, Pad::None),
            // without a meridiem there is nothing to disambiguate a 12-hour clock
            Chunk::ZeroHour12 => Item::Numeric(Numeric::Hour, Pad::Zero),
            Chunk::Hour12 => Item::Numeric(Numeric::Hour, Pad::None),
            Chunk::ZeroMinute => Item::Numeric(Numeric::Minute, Pad::Zero),
            Chunk::Minute => Item::Numeric(Numeric::Minute, Pad::None),
            Chunk::ZeroSecond => Item::Numeric(Numeric::Second, Pad::Zero),
            Chunk::Second => Item::Numeric(Numeric::Second, Pad::None),
            Chunk::UpperMeridiem => Item::Fixed(Fixed::UpperAmPm),
            Chunk::LowerMeridiem => Item::Fixed(Fixed::LowerAmPm),
            Chunk::Fraction(3) => Item::Fixed(Fixed::Nanosecond3),
            Chunk::Fraction(6) => Item::Fixed(Fixed::Nanosecond6),
            Chunk::Fraction(9) => Item::Fixed(Fixed::Nanosecond9),
            Chunk::Fraction(_) | Chunk::TrimmedFraction => Item::Fixed(Fixed::Nanosecond),
        }
    }
}

const CHUNKS: &[(&str, Chunk)] = &[
    ("January", Chunk::LongMonth),
    ("Jan", Chunk::ShortMonth),
    ("Monday", Chunk::LongWeekday),
    ("Mon", Chunk::ShortWeekday),
    ("2006", Chunk::Year),
    ("01", Chunk::ZeroMonth),
    ("02", Chunk::ZeroDay),
    ("03", Chunk::ZeroHour12),
    ("04", Chunk::ZeroMinute),
    ("05", Chunk::ZeroSecond),
    ("06", Chunk::YearMod100),
    ("15", Chunk::Hour),
    ("1", Chunk::Month),
    ("2", Chunk::Day),
    ("3", Chunk::Hour12),
    ("4", Chunk::Minute),
    ("5", Chunk::Second),
    ("_2", Chunk::SpaceDay),
    ("PM", Chunk::UpperMeridiem),
    ("pm", Chunk::LowerMeridiem),
];

/// Matches the reference chunk starting at the head of `rest`, returning it
/// with its length in bytes.
fn next_chunk(rest: &str) -> Option<(Chunk, usize)> {
    if rest.starts_with("_2006") {
        return None;
    }
    if let Some(found) = fraction(rest) {
        return Some(found);
    }
    CHUNKS
        .iter()
        .find(|(text, _)| rest.starts_with(text))
        .map(|(text, chunk)| (*chunk, text.len()))
}

fn fraction(rest: &str) -> Option<(Chunk, usize)> {
    let digits = rest.strip_prefix('.')?;
    let first = digits.chars().next().filter(|c| matches!(c, '0' | '9'))?;
    let run = digits.chars().take_while(|c| *c == first).count();
    let trailing_digit = digits[run..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit());
    if trailing_digit {
        return None;
    }
    let chunk = if first == '0' {
        Chunk::Fraction(run)
    } else {
        Chunk::TrimmedFraction
    };
    Some((chunk, run + 1))
}

/// `chrono` takes second 60 as a leap second; a clock reading never does.
fn reject_leap_second(time: NaiveTime) -> Option<NaiveTime> {
    (time.nanosecond() < 1_000_000_000).then_some(time)
}

/// A compiled layout-by-example string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    text: String,
    width: usize,
    items: Vec<Item<'static>>,
    has_date: bool,
    has_clock: bool,
}

impl Layout {
    pub fn compile(text: &str) -> Self {
        let twelve_hour = text.contains("PM") || text.contains("pm");
        let mut items = Vec::new();
        let mut literal = String::new();
        let mut has_date = false;
        let mut has_clock = false;

        let mut idx = 0;
        while idx < text.len() {
            let rest = &text[idx..];
            if let Some((chunk, len)) = next_chunk(rest) {
                if !literal.is_empty() {
                    items.push(Item::OwnedLiteral(std::mem::take(&mut literal).into()));
                }
                has_date |= chunk.is_date();
                has_clock |= chunk.is_clock();
                items.push(chunk.item(twelve_hour));
                idx += len;
            } else if let Some(ch) = rest.chars().next() {
                literal.push(ch);
                idx += ch.len_utf8();
            }
        }
        if !literal.is_empty() {
            items.push(Item::OwnedLiteral(literal.into()));
        }

        Layout {
            text: text.to_string(),
            width: text.chars().count(),
            items,
            has_date,
            has_clock,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True when `value` has the same character count as the layout text.
    pub fn fits(&self, value: &str) -> bool {
        value.chars().count() == self.width
    }

    fn scan(&self, value: &str) -> Option<Parsed> {
        if !self.fits(value) {
            return None;
        }
        let mut parsed = Parsed::new();
        format::parse(&mut parsed, value, self.items.iter()).ok()?;
        Some(parsed)
    }

    pub fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        if !self.has_date {
            return None;
        }
        self.scan(value)?.to_naive_date().ok()
    }

    pub fn parse_time(&self, value: &str) -> Option<NaiveTime> {
        if !self.has_clock {
            return None;
        }
        self.scan(value)?
            .to_naive_time()
            .ok()
            .and_then(reject_leap_second)
    }

    /// Parses a calendar date with an optional clock; a layout without clock
    /// fields yields midnight.
    pub fn parse_datetime(&self, value: &str) -> Option<NaiveDateTime> {
        if !self.has_date {
            return None;
        }
        let parsed = self.scan(value)?;
        let date = parsed.to_naive_date().ok()?;
        let time = if self.has_clock {
            parsed.to_naive_time().ok().and_then(reject_leap_second)?
        } else {
            NaiveTime::MIN
        };
        Some(date.and_time(time))
    }

    /// Writes `value` the way this layout reads it.
    pub fn format(&self, value: &NaiveDateTime) -> String {
        value.format_with_items(self.items.iter()).to_string()
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn compact_date_layout_parses_eight_digits() {
        let layout = Layout::compile("20060102");
        assert!(layout.fits("20220304"));
        assert_eq!(layout.parse_date("20220304"), Some(ymd(2022, 3, 4)));
        assert_eq!(layout.parse_date("2022034"), None);
    }

    #[test]
    fn unpadded_layout_widens_two_digit_year() {
        let layout = Layout::compile("2-1-06");
        assert_eq!(layout.parse_date("4-3-22"), Some(ymd(2022, 3, 4)));
    }

    #[test]
    fn width_gate_rejects_values_of_other_length() {
        let layout = Layout::compile("02-01-2006");
        assert!(!layout.fits("4-3-22"));
        assert_eq!(layout.parse_date("4-3-22"), None);
        assert_eq!(layout.parse_date("04-03-2022"), Some(ymd(2022, 3, 4)));
    }

    #[test]
    fn month_names_are_recognised() {
        let layout = Layout::compile("Jan 2 2006");
        assert_eq!(layout.parse_date("Feb 4 2008"), Some(ymd(2008, 2, 4)));
    }

    #[test]
    fn meridiem_switches_hour_to_twelve_hour_clock() {
        let layout = Layout::compile("Jan 2, 2006 3:04pm");
        let parsed = layout.parse_datetime("Feb 4, 2008 4:45pm").unwrap();
        assert_eq!(parsed, ymd(2008, 2, 4).and_hms_opt(16, 45, 0).unwrap());
    }

    #[test]
    fn bare_twelve_hour_chunk_reads_as_plain_hour() {
        let layout = Layout::compile("3 4 5");
        assert_eq!(
            layout.parse_time("1 2 3"),
            NaiveTime::from_hms_opt(1, 2, 3)
        );
    }

    #[test]
    fn compact_time_layout() {
        let layout = Layout::compile("150405");
        assert_eq!(
            layout.parse_time("123456"),
            NaiveTime::from_hms_opt(12, 34, 56)
        );
        assert_eq!(layout.parse_time("126056"), None);
    }

    #[test]
    fn datetime_without_clock_defaults_to_midnight() {
        let layout = Layout::compile("2006/01/02");
        assert_eq!(
            layout.parse_datetime("2024/05/06"),
            Some(ymd(2024, 5, 6).and_hms_opt(0, 0, 0).unwrap())
        );
    }

    #[test]
    fn datetime_layout_with_space_separator() {
        let layout = Layout::compile("20060102 150405");
        assert_eq!(
            layout.parse_datetime("20220304 123456"),
            Some(ymd(2022, 3, 4).and_hms_opt(12, 34, 56).unwrap())
        );
        assert_eq!(layout.parse_datetime("20220304"), None);
    }

    #[test]
    fn fractional_seconds_chunk() {
        let layout = Layout::compile("15:04:05.000");
        let parsed = layout.parse_time("08:30:15.250").unwrap();
        assert_eq!(parsed, NaiveTime::from_hms_milli_opt(8, 30, 15, 250).unwrap());
    }

    #[test]
    fn zero_fraction_keeps_its_width_when_written() {
        let layout = Layout::compile("15:04:05.000");
        let whole = ymd(2024, 1, 2).and_hms_opt(8, 30, 15).unwrap();
        assert_eq!(layout.format(&whole), "08:30:15.000");
        assert_eq!(layout.parse_time("08:30:15.000"), Some(whole.time()));

        let micros = Layout::compile("15:04:05.000000");
        let value = ymd(2024, 1, 2).and_hms_micro_opt(8, 30, 15, 42).unwrap();
        assert_eq!(micros.format(&value), "08:30:15.000042");
    }

    #[test]
    fn nine_fraction_drops_trailing_zeros() {
        let layout = Layout::compile("15:04:05.999");
        let whole = ymd(2024, 1, 2).and_hms_opt(8, 30, 15).unwrap();
        assert_eq!(layout.format(&whole), "08:30:15");
    }

    #[test]
    fn second_sixty_is_not_a_time() {
        let layout = Layout::compile("150405");
        assert_eq!(layout.parse_time("235960"), None);
        let stamp = Layout::compile("20060102 150405");
        assert_eq!(stamp.parse_datetime("20221231 235960"), None);
    }

    #[test]
    fn layout_without_date_chunks_never_yields_a_date() {
        let layout = Layout::compile("hello");
        assert_eq!(layout.parse_date("hello"), None);
        assert_eq!(layout.parse_time("hello"), None);
    }
}
