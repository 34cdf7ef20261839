//! Column hints and their resolution.
//!
//! A hint is declared as `[SHEET!]NAME:TYPE[(INPUT[->OUTPUT])]`. `NAME` may be
//! a header name, a `#<ordinal>` position (1-based), a `$<letter>` column
//! reference or a glob; `SHEET` may also be a glob. [`ColumnSet::resolve`]
//! runs the precedence passes below and returns the first hint that matches,
//! declaration order breaking ties inside a pass.
//!
//! | pass | name              | sheet    |
//! |------|-------------------|----------|
//! | 1    | exact             | exact    |
//! | 2    | `$` alias         | exact    |
//! | 3    | `#` alias         | exact    |
//! | 4    | exact             | wildcard |
//! | 5    | `$` alias         | wildcard |
//! | 6    | `#` alias         | wildcard |
//! | 7    | exact             | any      |
//! | 8    | `$` / `#` alias   | any      |
//! | 9    | wildcard          | exact    |
//! | 10   | wildcard          | wildcard |
//! | 11   | wildcard          | any      |
//!
//! "any" hints are the ones declared without a sheet.

use regex::{Regex, RegexBuilder};

use crate::{
    error::{ConvertError, Result},
    types::{FormatDefaults, TypeDescriptor},
};

/// Case-insensitive shell glob.
#[derive(Debug, Clone)]
struct Glob {
    regex: Regex,
}

impl Glob {
    fn new(pattern: &str) -> Self {
        let source = format!("^{}$", glob_to_regex(pattern));
        let regex = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .unwrap_or_else(|_| {
                RegexBuilder::new(&format!("^{}$", regex::escape(pattern)))
                    .case_insensitive(true)
                    .build()
                    .expect("escaped pattern is a valid regex")
            });
        Glob { regex }
    }

    fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let chars = pattern.chars().collect::<Vec<_>>();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut idx = 0;
    while idx < chars.len() {
        match chars[idx] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => match bracket_class(&chars[idx..]) {
                Some((class, consumed)) => {
                    out.push_str(&class);
                    idx += consumed;
                    continue;
                }
                None => out.push_str(r"\["),
            },
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
        idx += 1;
    }
    out
}

/// Translates a `[...]` class starting at `chars[0]`; `None` when unterminated.
fn bracket_class(chars: &[char]) -> Option<(String, usize)> {
    let mut idx = 1;
    let mut class = String::from("[");
    if matches!(chars.get(idx), Some('!' | '^')) {
        class.push('^');
        idx += 1;
    }
    // a leading ']' is a member, not the terminator
    if chars.get(idx) == Some(&']') {
        class.push_str(r"\]");
        idx += 1;
    }
    while let Some(&ch) = chars.get(idx) {
        match ch {
            ']' => {
                class.push(']');
                return Some((class, idx + 1));
            }
            '-' => class.push('-'),
            '\\' | '[' | '^' | '&' | '~' => {
                class.push('\\');
                class.push(ch);
            }
            other => class.push(other),
        }
        idx += 1;
    }
    None
}

/// Splits `SHEET!NAME` at the first `!` outside a bracket class.
fn split_sheet(target: &str) -> (&str, &str) {
    let mut in_class = false;
    let mut prev = None;
    for (idx, ch) in target.char_indices() {
        match ch {
            '[' if !in_class => in_class = true,
            ']' if in_class && prev != Some('[') => in_class = false,
            '!' if !in_class => return (&target[..idx], &target[idx + 1..]),
            _ => {}
        }
        prev = Some(ch);
    }
    ("", target)
}

fn is_wildcard(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Spreadsheet column letters for a 0-based column index (`0` → `A`,
/// `26` → `AA`).
pub fn column_letters(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[derive(Debug, Clone)]
pub struct Column {
    pub sheet: String,
    pub name: String,
    pub datatype: TypeDescriptor,
    sheet_glob: Glob,
    name_glob: Glob,
}

impl Column {
    pub fn new(sheet: &str, name: &str, datatype: TypeDescriptor) -> Self {
        Column {
            sheet: sheet.to_string(),
            name: name.to_string(),
            datatype,
            sheet_glob: Glob::new(sheet),
            name_glob: Glob::new(name),
        }
    }

    /// Parses `[SHEET!]NAME:TYPE[(INPUT[->OUTPUT])]`.
    pub fn parse(declaration: &str, defaults: &FormatDefaults) -> Result<Self> {
        let (target, datatype) = declaration.split_once(':').ok_or_else(|| {
            ConvertError::invalid_declaration(declaration, "expected [SHEET!]NAME:TYPE")
        })?;
        let (sheet, name) = split_sheet(target);
        let (sheet, name) = (sheet.trim(), name.trim());
        if name.is_empty() {
            return Err(ConvertError::invalid_declaration(
                declaration,
                "column name is empty",
            ));
        }
        let datatype = TypeDescriptor::parse(datatype, defaults).map_err(|err| match err {
            ConvertError::InvalidDeclaration { reason, .. } => {
                ConvertError::invalid_declaration(declaration, reason)
            }
            other => other,
        })?;
        Ok(Column::new(sheet, name, datatype))
    }

    fn is_sheet_agnostic(&self) -> bool {
        self.sheet.is_empty()
    }

    fn sheet_is(&self, sheet: &str) -> bool {
        !self.sheet.is_empty() && self.sheet.eq_ignore_ascii_case(sheet)
    }

    fn sheet_matches(&self, sheet: &str) -> bool {
        !self.sheet.is_empty() && (self.sheet == "*" || self.sheet_glob.matches(sheet))
    }

    fn name_is(&self, name: &str) -> bool {
        !name.is_empty() && self.name.eq_ignore_ascii_case(name)
    }

    fn name_matches(&self, name: &str) -> bool {
        self.name == "*" || (is_wildcard(&self.name) && self.name_glob.matches(name))
    }
}

#[derive(Debug, Clone, Copy)]
enum NameRule {
    Exact,
    Letter,
    Ordinal,
    Alias,
    Wildcard,
}

#[derive(Debug, Clone, Copy)]
enum SheetRule {
    Exact,
    Wildcard,
    Any,
}

const PASSES: &[(NameRule, SheetRule)] = &[
    (NameRule::Exact, SheetRule::Exact),
    (NameRule::Letter, SheetRule::Exact),
    (NameRule::Ordinal, SheetRule::Exact),
    (NameRule::Exact, SheetRule::Wildcard),
    (NameRule::Letter, SheetRule::Wildcard),
    (NameRule::Ordinal, SheetRule::Wildcard),
    (NameRule::Exact, SheetRule::Any),
    (NameRule::Alias, SheetRule::Any),
    (NameRule::Wildcard, SheetRule::Exact),
    (NameRule::Wildcard, SheetRule::Wildcard),
    (NameRule::Wildcard, SheetRule::Any),
];

/// Declared column hints in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    columns: Vec<Column>,
}

impl ColumnSet {
    pub fn new(columns: Vec<Column>) -> Self {
        ColumnSet { columns }
    }

    pub fn parse<S: AsRef<str>>(declarations: &[S], defaults: &FormatDefaults) -> Result<Self> {
        declarations
            .iter()
            .map(|decl| Column::parse(decl.as_ref(), defaults))
            .collect::<Result<Vec<_>>>()
            .map(ColumnSet::new)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Index of the best hint for the column `name` of `sheet`. `ordinal` is
    /// the 0-based column position and enables `#n` / `$X` aliases.
    pub fn resolve(&self, sheet: &str, name: &str, ordinal: Option<usize>) -> Option<usize> {
        let letter = ordinal.map(|idx| format!("${}", column_letters(idx)));
        let position = ordinal.map(|idx| format!("#{}", idx + 1));

        let name_rule = |column: &Column, rule: NameRule| match rule {
            NameRule::Exact => column.name_is(name),
            NameRule::Letter => letter.as_deref().is_some_and(|l| column.name_is(l)),
            NameRule::Ordinal => position.as_deref().is_some_and(|p| column.name_is(p)),
            NameRule::Alias => {
                letter.as_deref().is_some_and(|l| column.name_is(l))
                    || position.as_deref().is_some_and(|p| column.name_is(p))
            }
            NameRule::Wildcard => column.name_matches(name),
        };
        let sheet_rule = |column: &Column, rule: SheetRule| match rule {
            SheetRule::Exact => column.sheet_is(sheet),
            SheetRule::Wildcard => column.sheet_matches(sheet),
            SheetRule::Any => column.is_sheet_agnostic(),
        };

        PASSES.iter().find_map(|(names, sheets)| {
            if let NameRule::Alias = names {
                // `$` aliases outrank `#` aliases within the pass
                return [NameRule::Letter, NameRule::Ordinal].iter().find_map(|rule| {
                    self.columns
                        .iter()
                        .position(|c| sheet_rule(c, *sheets) && name_rule(c, *rule))
                });
            }
            self.columns
                .iter()
                .position(|c| sheet_rule(c, *sheets) && name_rule(c, *names))
        })
    }

    pub fn find(&self, sheet: &str, name: &str, ordinal: Option<usize>) -> Option<&Column> {
        self.resolve(sheet, name, ordinal)
            .and_then(|idx| self.columns.get(idx))
    }
}

/// Splits a `--columns` value on unescaped commas; `\,` yields a literal
/// comma.
pub fn split_declarations(value: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&',') => {
                current.push(',');
                chars.next();
            }
            ',' => parts.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    parts.push(current);
    parts
        .into_iter()
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}
