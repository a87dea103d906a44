//! Value formats: the self-describing descriptor of how raw text maps to a
//! typed value.
//!
//! A [`ValueFormat`] is a [`DataKind`] plus every parameter needed to parse
//! and re-format text for that kind: date pattern list and separators, number
//! separators, boolean literal sets, text-part selection, replacement pairs,
//! and the serial date-time flag. Locale settings are resolved into the
//! format once, at construction or guess time; parsing never consults global
//! state afterwards.
//!
//! Date patterns use the viewer notation (`yyyy`, `MM`, `dd`, `HH`, `mm`,
//! `ss`) and are converted to `chrono` strftime patterns on demand.

use std::{fmt, str::FromStr};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use uuid::Uuid;

use crate::{
    locale::{FORMAT_LIST_DELIMITER, LocaleConfig},
    value::Value,
};

/// Serial date-time epoch (OLE Automation / spreadsheet convention).
pub const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

const SECONDS_PER_DAY: f64 = 86_400.0;
const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    String,
    Integer,
    Numeric,
    Double,
    Percentage,
    DateTime,
    Boolean,
    Guid,
    TextPart,
    TextReplace,
    Binary,
}

impl DataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::String => "string",
            DataKind::Integer => "integer",
            DataKind::Numeric => "numeric",
            DataKind::Double => "double",
            DataKind::Percentage => "percentage",
            DataKind::DateTime => "datetime",
            DataKind::Boolean => "boolean",
            DataKind::Guid => "guid",
            DataKind::TextPart => "text-part",
            DataKind::TextReplace => "text-replace",
            DataKind::Binary => "binary",
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &[
            "string",
            "integer",
            "numeric",
            "double",
            "percentage",
            "datetime",
            "boolean",
            "guid",
            "text-part",
            "text-replace",
            "binary",
        ]
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DataKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "string" | "text" => Ok(DataKind::String),
            "integer" | "int" => Ok(DataKind::Integer),
            "numeric" | "decimal" => Ok(DataKind::Numeric),
            "double" | "float" => Ok(DataKind::Double),
            "percentage" | "percent" => Ok(DataKind::Percentage),
            "datetime" | "date" | "date-time" | "timestamp" => Ok(DataKind::DateTime),
            "boolean" | "bool" => Ok(DataKind::Boolean),
            "guid" | "uuid" => Ok(DataKind::Guid),
            "text-part" | "textpart" => Ok(DataKind::TextPart),
            "text-replace" | "textreplace" => Ok(DataKind::TextReplace),
            "binary" => Ok(DataKind::Binary),
            _ => Err(anyhow!(
                "Unknown data kind '{value}'. Supported kinds: {}",
                DataKind::variants().join(", ")
            )),
        }
    }
}

impl Serialize for DataKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DataKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        DataKind::from_str(&token).map_err(|err| de::Error::custom(err.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextReplacement {
    pub from: String,
    pub to: String,
}

/// Immutable descriptor of how text maps to a typed value.
///
/// Given a `ValueFormat` and a raw string, parsing is deterministic: every
/// locale-dependent parameter is stored on the format itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValueFormat {
    pub kind: DataKind,
    /// Concrete date patterns, joined by `;` when several are compatible.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub date_format: String,
    #[serde(default = "default_date_separator")]
    pub date_separator: String,
    #[serde(default = "default_time_separator")]
    pub time_separator: String,
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: char,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_separator: Option<char>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub true_literals: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub false_literals: Vec<String>,
    /// 1-based part index for `TextPart`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<usize>,
    #[serde(default = "default_part_splitter")]
    pub part_splitter: char,
    #[serde(default)]
    pub part_to_end: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replacements: Vec<TextReplacement>,
    #[serde(default)]
    pub remove_currency_symbols: bool,
    #[serde(default)]
    pub serial_date_time: bool,
}

fn default_date_separator() -> String {
    "/".to_string()
}

fn default_time_separator() -> String {
    ":".to_string()
}

fn default_decimal_separator() -> char {
    '.'
}

fn default_part_splitter() -> char {
    ':'
}

impl ValueFormat {
    pub fn new(kind: DataKind) -> Self {
        Self {
            kind,
            date_format: String::new(),
            date_separator: default_date_separator(),
            time_separator: default_time_separator(),
            decimal_separator: default_decimal_separator(),
            group_separator: None,
            true_literals: Vec::new(),
            false_literals: Vec::new(),
            part: None,
            part_splitter: default_part_splitter(),
            part_to_end: false,
            replacements: Vec::new(),
            remove_currency_symbols: false,
            serial_date_time: false,
        }
    }

    pub fn with_locale(kind: DataKind, locale: &LocaleConfig) -> Self {
        let mut format = Self::new(kind);
        format.date_separator = locale.date_separator.clone();
        format.time_separator = locale.time_separator.clone();
        format.decimal_separator = locale.decimal_separator;
        format.group_separator = locale.group_separator;
        format.true_literals = locale.true_literals.clone();
        format.false_literals = locale.false_literals.clone();
        format
    }

    pub fn date_formats(&self) -> Vec<&str> {
        self.date_format
            .split(FORMAT_LIST_DELIMITER)
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// One-line description for tables and log lines.
    pub fn describe(&self) -> String {
        match self.kind {
            DataKind::DateTime if self.serial_date_time => {
                format!("datetime(serial;{})", self.date_format)
            }
            DataKind::DateTime => format!("datetime({})", self.date_format),
            DataKind::TextPart => {
                let part = self.part.unwrap_or(1);
                if self.part_to_end {
                    format!("text-part('{}', {part}..)", self.part_splitter)
                } else {
                    format!("text-part('{}', {part})", self.part_splitter)
                }
            }
            DataKind::Numeric | DataKind::Double | DataKind::Percentage => {
                match self.group_separator {
                    Some(group) => format!("{}('{}','{group}')", self.kind, self.decimal_separator),
                    None => format!("{}('{}')", self.kind, self.decimal_separator),
                }
            }
            other => other.as_str().to_string(),
        }
    }

    /// Parses a raw cell. Empty input is a null cell, not an error.
    pub fn parse(&self, raw: &str) -> Result<Option<Value>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let parsed = match self.kind {
            DataKind::String | DataKind::Binary => Value::String(trimmed.to_string()),
            DataKind::TextReplace => {
                let replaced = self.apply_replacements(trimmed);
                let replaced = replaced.trim();
                if replaced.is_empty() {
                    return Ok(None);
                }
                Value::String(replaced.to_string())
            }
            DataKind::TextPart => match self.select_part(trimmed) {
                Some(part) => Value::String(part),
                None => return Ok(None),
            },
            DataKind::Integer => {
                let body = self.numeric_body(trimmed)?;
                reject_leading_zero(&body)?;
                let value: i64 = body
                    .parse()
                    .with_context(|| format!("Parsing '{trimmed}' as integer"))?;
                Value::Integer(value)
            }
            DataKind::Numeric => Value::Numeric(self.parse_decimal(trimmed)?),
            DataKind::Double => {
                let body = self.numeric_body(trimmed)?;
                reject_leading_zero(&body)?;
                let value: f64 = body
                    .parse()
                    .with_context(|| format!("Parsing '{trimmed}' as double"))?;
                Value::Double(value)
            }
            DataKind::Percentage => {
                let (body, divisor) = split_percent_suffix(trimmed);
                let decimal = self.parse_decimal(body)?;
                Value::Percentage(decimal / Decimal::from(divisor))
            }
            DataKind::DateTime => Value::DateTime(self.parse_date_time(trimmed)?),
            DataKind::Boolean => match self.parse_boolean(trimmed) {
                Some(flag) => Value::Boolean(flag),
                None => bail!("Failed to parse '{trimmed}' as boolean"),
            },
            DataKind::Guid => {
                let inner = trimmed.trim_matches(|c| matches!(c, '{' | '}'));
                let parsed = Uuid::parse_str(inner)
                    .with_context(|| format!("Parsing '{trimmed}' as GUID"))?;
                Value::Guid(parsed)
            }
        };
        Ok(Some(parsed))
    }

    /// Formats a typed value the way the grid displays it.
    pub fn format_value(&self, value: &Value) -> String {
        match (self.kind, value) {
            (DataKind::DateTime, Value::DateTime(dt)) => {
                let pattern = self.date_formats().first().map(|p| p.to_string());
                match pattern {
                    Some(p) => {
                        let strftime =
                            to_strftime(&p, &self.date_separator, &self.time_separator);
                        dt.format(&strftime).to_string()
                    }
                    None => value.as_display(),
                }
            }
            (DataKind::Numeric, Value::Numeric(d)) => {
                self.localize_number(&d.normalize().to_string())
            }
            (DataKind::Double, Value::Double(f)) => self.localize_number(&f.to_string()),
            (DataKind::Percentage, Value::Percentage(d)) => {
                let percent = (*d * Decimal::from(100)).normalize();
                format!("{}%", self.localize_number(&percent.to_string()))
            }
            _ => value.as_display(),
        }
    }

    fn localize_number(&self, canonical: &str) -> String {
        if self.decimal_separator == '.' {
            canonical.to_string()
        } else {
            canonical.replace('.', &self.decimal_separator.to_string())
        }
    }

    pub(crate) fn parse_boolean(&self, raw: &str) -> Option<bool> {
        let lowered = raw.trim().to_ascii_lowercase();
        if self
            .true_literals
            .iter()
            .any(|lit| lit.eq_ignore_ascii_case(&lowered))
        {
            return Some(true);
        }
        if self
            .false_literals
            .iter()
            .any(|lit| lit.eq_ignore_ascii_case(&lowered))
        {
            return Some(false);
        }
        None
    }

    fn apply_replacements(&self, raw: &str) -> String {
        let mut current = raw.to_string();
        for replacement in &self.replacements {
            current = current.replace(&replacement.from, &replacement.to);
        }
        current
    }

    fn select_part(&self, raw: &str) -> Option<String> {
        let part = self.part.unwrap_or(1);
        if part == 0 {
            return None;
        }
        let pieces: Vec<&str> = raw.split(self.part_splitter).collect();
        if part > pieces.len() {
            return None;
        }
        let selected = if self.part_to_end {
            pieces[part - 1..].join(&self.part_splitter.to_string())
        } else {
            pieces[part - 1].to_string()
        };
        let selected = selected.trim().to_string();
        if selected.is_empty() { None } else { Some(selected) }
    }

    fn numeric_body(&self, raw: &str) -> Result<String> {
        let mut body = String::with_capacity(raw.len());
        for ch in raw.chars() {
            if ch == self.decimal_separator {
                body.push('.');
            } else if Some(ch) == self.group_separator {
                continue;
            } else if CURRENCY_SYMBOLS.contains(&ch) {
                if self.remove_currency_symbols {
                    continue;
                }
                bail!("Unexpected currency symbol in '{raw}'");
            } else if ch.is_whitespace() {
                continue;
            } else {
                body.push(ch);
            }
        }
        if body.is_empty() {
            bail!("No digits found in '{raw}'");
        }
        Ok(body)
    }

    fn parse_decimal(&self, raw: &str) -> Result<Decimal> {
        let body = self.numeric_body(raw)?;
        reject_leading_zero(&body)?;
        if body.contains(['e', 'E']) {
            return Decimal::from_scientific(&body)
                .map_err(|err| anyhow!("Parsing '{raw}' as numeric: {err}"));
        }
        Decimal::from_str(&body).map_err(|err| anyhow!("Parsing '{raw}' as numeric: {err}"))
    }

    fn parse_date_time(&self, raw: &str) -> Result<NaiveDateTime> {
        for pattern in self.date_formats() {
            let strftime = to_strftime(pattern, &self.date_separator, &self.time_separator);
            if let Some(parsed) = try_parse_strftime(raw, &strftime) {
                return Ok(parsed);
            }
        }
        if self.serial_date_time
            && let Ok(serial) = raw.parse::<f64>()
            && let Some(parsed) = from_serial(serial)
        {
            return Ok(parsed);
        }
        bail!("Failed to parse '{raw}' with date format list '{}'", self.date_format)
    }
}

fn reject_leading_zero(body: &str) -> Result<()> {
    // "0123" keeps its leading zero significant (postal codes); not a number.
    let digits = body.trim_start_matches(['+', '-']);
    if digits.len() > 1 && digits.starts_with('0') && digits.as_bytes()[1].is_ascii_digit() {
        bail!("Leading zero in '{body}' would be dropped by numeric parsing");
    }
    Ok(())
}

fn split_percent_suffix(raw: &str) -> (&str, u32) {
    if let Some(stripped) = raw.strip_suffix('‰') {
        (stripped.trim_end(), 1000)
    } else if let Some(stripped) = raw.strip_suffix('%') {
        (stripped.trim_end(), 100)
    } else {
        (raw, 1)
    }
}

/// Converts a viewer-notation pattern (`yyyy/MM/dd HH:mm:ss`) into a chrono
/// strftime pattern, substituting the configured separators for the `/` and
/// `:` placeholders.
pub fn to_strftime(pattern: &str, date_separator: &str, time_separator: &str) -> String {
    let mut output = String::with_capacity(pattern.len() + 8);
    let chars: Vec<char> = pattern.chars().collect();
    let mut index = 0;
    while index < chars.len() {
        let ch = chars[index];
        let run = chars[index..].iter().take_while(|c| **c == ch).count();
        match ch {
            'y' => output.push_str(if run >= 4 { "%Y" } else { "%y" }),
            'M' => output.push_str(match run {
                4.. => "%B",
                3 => "%b",
                _ => "%m",
            }),
            'd' => output.push_str("%d"),
            'H' => output.push_str("%H"),
            'h' => output.push_str("%I"),
            'm' => output.push_str("%M"),
            's' => output.push_str("%S"),
            't' => output.push_str("%p"),
            'f' => output.push_str("%.f"),
            'z' => output.push_str("%#z"),
            '/' => output.push_str(date_separator),
            ':' => output.push_str(time_separator),
            '%' => output.push_str("%%"),
            other => {
                for _ in 0..run {
                    output.push(other);
                }
            }
        }
        index += run;
    }
    output
}

pub(crate) fn try_parse_strftime(raw: &str, strftime: &str) -> Option<NaiveDateTime> {
    if strftime.contains("%#z") {
        if let Ok(parsed) = DateTime::parse_from_str(raw, strftime) {
            return Some(parsed.naive_local());
        }
        return None;
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, strftime) {
        return Some(parsed);
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(raw, strftime) {
        return Some(parsed.and_time(NaiveTime::MIN));
    }
    if let Ok(parsed) = NaiveTime::parse_from_str(raw, strftime) {
        return Some(serial_epoch_date().and_time(parsed));
    }
    None
}

fn serial_epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(SERIAL_EPOCH.0, SERIAL_EPOCH.1, SERIAL_EPOCH.2)
        .expect("serial epoch is a valid date")
}

/// Days since 1899-12-30, fraction carrying the time of day.
pub fn from_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.trunc() as i64;
    let seconds = (serial.fract().abs() * SECONDS_PER_DAY).round() as i64;
    let base = serial_epoch_date().and_time(NaiveTime::MIN);
    base.checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::seconds(if serial < 0.0 {
            -seconds
        } else {
            seconds
        }))
}

/// Inverse of [`from_serial`], used when persisting serial formats.
pub fn to_serial(value: &NaiveDateTime) -> f64 {
    let base = serial_epoch_date().and_time(NaiveTime::MIN);
    let delta = *value - base;
    delta.num_seconds() as f64 / SECONDS_PER_DAY
}

/// Merges compatible concrete patterns into a single persistable list.
pub fn join_date_formats<I, S>(patterns: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for pattern in patterns {
        if !joined.is_empty() {
            joined.push(FORMAT_LIST_DELIMITER);
        }
        joined.push_str(pattern.as_ref());
    }
    joined
}
