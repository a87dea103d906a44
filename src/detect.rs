//! Stateless type detectors.
//!
//! Each detector is a pure function from one raw value (plus format hints) to
//! a match or no-match. Detectors report *what* they matched — the concrete
//! date pattern, the numeric shape, the boolean polarity — so the inference
//! engine can tally compatible formats rather than bare type names.

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::format::{self, DataKind, to_strftime};

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥'];

/// Shape of a numeric token as observed in one raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericShape {
    Integer,
    /// Has a fractional part that fits an exact decimal.
    Numeric,
    /// Scientific notation or magnitude beyond exact decimal range.
    Double,
}

#[derive(Debug, Clone, Copy)]
pub struct NumberMatch {
    pub shape: NumericShape,
    pub had_currency_symbol: bool,
    pub had_group_separator: bool,
    /// `%` divides by 100, `‰` by 1000; `1` means no suffix.
    pub percent_divisor: u32,
}

/// Analyzes one token with a candidate separator pair. Leading-zero integers
/// (`0123`) are rejected so significant zeros are never silently dropped.
pub fn match_number(
    raw: &str,
    decimal_separator: char,
    group_separator: Option<char>,
    allow_currency: bool,
) -> Option<NumberMatch> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (body, percent_divisor) = split_percent(trimmed);
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let mut mantissa = String::with_capacity(body.len());
    let mut exponent = String::new();
    let mut in_exponent = false;
    let mut exponent_sign_allowed = false;
    let mut saw_decimal = false;
    let mut sign_consumed = false;
    let mut had_currency_symbol = false;
    let mut had_group_separator = false;
    let mut group_digits_since = 0usize;
    let mut pending_group = false;

    for ch in body.chars() {
        match ch {
            '0'..='9' => {
                if in_exponent {
                    exponent.push(ch);
                } else {
                    mantissa.push(ch);
                    if pending_group {
                        group_digits_since += 1;
                    }
                }
            }
            c if c == decimal_separator && !in_exponent && !saw_decimal => {
                if pending_group && group_digits_since != 3 {
                    return None;
                }
                pending_group = false;
                saw_decimal = true;
                mantissa.push('.');
            }
            c if Some(c) == group_separator && !in_exponent && !saw_decimal => {
                if mantissa.is_empty() {
                    return None;
                }
                if pending_group && group_digits_since != 3 {
                    return None;
                }
                had_group_separator = true;
                pending_group = true;
                group_digits_since = 0;
            }
            'e' | 'E' => {
                if in_exponent || mantissa.is_empty() {
                    return None;
                }
                in_exponent = true;
                exponent_sign_allowed = true;
            }
            '+' | '-' => {
                if in_exponent && exponent_sign_allowed {
                    exponent.push(ch);
                    exponent_sign_allowed = false;
                } else if !in_exponent && mantissa.is_empty() && !sign_consumed {
                    sign_consumed = true;
                } else {
                    return None;
                }
            }
            c if CURRENCY_SYMBOLS.contains(&c) => {
                if !allow_currency {
                    return None;
                }
                had_currency_symbol = true;
            }
            ' ' => continue,
            _ => return None,
        }
        // The sign slot stays open only across the `e`/`E` that opened it;
        // the sign arm above closes it itself once consumed.
        if !matches!(ch, 'e' | 'E') {
            exponent_sign_allowed = false;
        }
    }

    if mantissa.is_empty() {
        return None;
    }
    if pending_group && group_digits_since != 3 {
        return None;
    }
    if in_exponent && (exponent.is_empty() || exponent == "+" || exponent == "-") {
        return None;
    }

    // A leading zero followed by more digits is deliberately not a number.
    let integer_part = mantissa.split('.').next().unwrap_or("");
    if integer_part.len() > 1 && integer_part.starts_with('0') && !had_group_separator {
        return None;
    }

    let shape = if in_exponent {
        NumericShape::Double
    } else if saw_decimal {
        NumericShape::Numeric
    } else if mantissa.len() > 18 {
        // Too many digits for i64; still a valid floating observation.
        NumericShape::Double
    } else {
        NumericShape::Integer
    };

    Some(NumberMatch {
        shape,
        had_currency_symbol,
        had_group_separator,
        percent_divisor,
    })
}

fn split_percent(raw: &str) -> (&str, u32) {
    if let Some(stripped) = raw.strip_suffix('‰') {
        (stripped, 1000)
    } else if let Some(stripped) = raw.strip_suffix('%') {
        (stripped, 100)
    } else {
        (raw, 1)
    }
}

/// Case-insensitive membership in the configured literal sets.
pub fn match_boolean(raw: &str, true_literals: &[String], false_literals: &[String]) -> Option<bool> {
    let lowered = raw.trim().to_ascii_lowercase();
    if true_literals.iter().any(|l| l.eq_ignore_ascii_case(&lowered)) {
        return Some(true);
    }
    if false_literals.iter().any(|l| l.eq_ignore_ascii_case(&lowered)) {
        return Some(false);
    }
    None
}

/// Canonical dashed hex, optionally wrapped in braces.
pub fn match_guid(raw: &str) -> bool {
    let inner = raw.trim().trim_matches(|c| matches!(c, '{' | '}'));
    // Require the dashed canonical form; bare 32-hex runs are too easy to
    // confuse with hashes or codes.
    inner.len() == 36 && inner.contains('-') && Uuid::parse_str(inner).is_ok()
}

/// Tries every candidate pattern against the value and returns the ones that
/// parse it. Patterns are concrete viewer-notation strings.
pub fn match_date_patterns<'a>(raw: &str, patterns: &'a [String]) -> Vec<&'a str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    patterns
        .iter()
        .filter(|pattern| parse_with_pattern(trimmed, pattern).is_some())
        .map(|pattern| pattern.as_str())
        .collect()
}

pub(crate) fn parse_with_pattern(raw: &str, pattern: &str) -> Option<NaiveDateTime> {
    let strftime = to_strftime(pattern, "/", ":");
    super_strict_parse(raw, pattern, &strftime)
}

fn super_strict_parse(raw: &str, pattern: &str, strftime: &str) -> Option<NaiveDateTime> {
    // chrono accepts 1-2 digit numeric fields; require the raw length to be
    // plausible for the pattern so "1-2-3" does not match "yyyy-MM-dd".
    if raw.len() + 4 < pattern.len() {
        return None;
    }
    format::try_parse_strftime(raw, strftime)
}

/// Serial date-time (days since 1899-12-30); only meaningful when the caller
/// explicitly enabled serial mode, since any plain number matches.
pub fn match_serial_date(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let serial: f64 = trimmed.parse().ok()?;
    // Keep the plausible spreadsheet window: 1900-01-01 .. year 9999.
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    format::from_serial(serial)
}

/// Detector identifiers in priority order, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Detector {
    Boolean,
    Guid,
    DateTime,
    Percentage,
    Numeric,
    Double,
    Integer,
}

impl Detector {
    pub const PRIORITY: [Detector; 7] = [
        Detector::Boolean,
        Detector::Guid,
        Detector::DateTime,
        Detector::Percentage,
        Detector::Numeric,
        Detector::Double,
        Detector::Integer,
    ];

    pub fn kind(&self) -> DataKind {
        match self {
            Detector::Boolean => DataKind::Boolean,
            Detector::Guid => DataKind::Guid,
            Detector::DateTime => DataKind::DateTime,
            Detector::Percentage => DataKind::Percentage,
            Detector::Numeric => DataKind::Numeric,
            Detector::Double => DataKind::Double,
            Detector::Integer => DataKind::Integer,
        }
    }
}
