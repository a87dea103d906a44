//! Locale configuration for parsing and inference.
//!
//! All locale-sensitive settings (date/time separators, number separators,
//! candidate date patterns, boolean literals) are carried explicitly as a
//! [`LocaleConfig`] value. The engine never reads ambient culture state in
//! the middle of an algorithm: a process-wide default is populated once and
//! replaced wholesale when preferences change.

use std::sync::{OnceLock, RwLock};

use serde::{Deserialize, Serialize};

/// Joins multiple compatible date patterns inside one `ValueFormat`.
pub const FORMAT_LIST_DELIMITER: char = ';';

/// Separates user-supplied extra boolean literals.
pub const LITERAL_DELIMITER: char = ';';

const DEFAULT_DATE_PATTERNS: &[&str] = &[
    "yyyy/MM/dd",
    "MM/dd/yyyy",
    "dd/MM/yyyy",
    "yyyy/MM/dd HH:mm:ss",
    "MM/dd/yyyy HH:mm:ss",
    "dd/MM/yyyy HH:mm:ss",
    "yyyy/MM/dd HH:mm",
    "MM/dd/yyyy HH:mm",
    "dd/MM/yyyy HH:mm",
];

// Non-locale patterns always tried in addition to the locale candidates.
const EXTRA_DATE_PATTERNS: &[&str] = &[
    "yyyyMMdd",
    "yyyy/MM/ddTHH:mm:ss",
    "yyyy/MM/ddTHH:mm:sszz",
    "HH:mm:ss",
    "HH:mm",
];

const DEFAULT_TRUE_LITERALS: &[&str] = &["true", "yes", "y", "t", "1"];
const DEFAULT_FALSE_LITERALS: &[&str] = &["false", "no", "n", "f", "0"];

/// Date separators substituted for the `/` placeholder when expanding
/// candidate patterns.
pub const CANDIDATE_DATE_SEPARATORS: &[&str] = &["/", "-", "."];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocaleConfig {
    pub date_separator: String,
    pub time_separator: String,
    pub decimal_separator: char,
    pub group_separator: Option<char>,
    /// Candidate date patterns in viewer notation (`yyyy`, `MM`, `dd`, ...).
    /// `/` and `:` act as separator placeholders.
    pub date_patterns: Vec<String>,
    pub true_literals: Vec<String>,
    pub false_literals: Vec<String>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            date_separator: "/".to_string(),
            time_separator: ":".to_string(),
            decimal_separator: '.',
            group_separator: Some(','),
            date_patterns: DEFAULT_DATE_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            true_literals: DEFAULT_TRUE_LITERALS
                .iter()
                .map(|l| l.to_string())
                .collect(),
            false_literals: DEFAULT_FALSE_LITERALS
                .iter()
                .map(|l| l.to_string())
                .collect(),
        }
    }
}

impl LocaleConfig {
    /// All concrete date patterns to try during inference: every locale
    /// candidate expanded across the known date separators, plus the fixed
    /// non-locale extras, deduplicated in first-seen order.
    pub fn candidate_date_patterns(&self) -> Vec<String> {
        let mut seen = Vec::new();
        let mut push = |pattern: String| {
            if !seen.contains(&pattern) {
                seen.push(pattern);
            }
        };
        for base in &self.date_patterns {
            for separator in CANDIDATE_DATE_SEPARATORS {
                push(base.replace('/', separator));
            }
        }
        for extra in EXTRA_DATE_PATTERNS {
            for separator in CANDIDATE_DATE_SEPARATORS {
                push(extra.replace('/', separator));
            }
        }
        seen
    }

    /// Returns the defaults plus user-supplied extra literals, lowercased.
    pub fn boolean_literals(&self, extra_true: &str, extra_false: &str) -> (Vec<String>, Vec<String>) {
        let extend = |base: &[String], extra: &str| {
            let mut literals: Vec<String> =
                base.iter().map(|l| l.to_ascii_lowercase()).collect();
            for token in extra.split(LITERAL_DELIMITER) {
                let token = token.trim().to_ascii_lowercase();
                if !token.is_empty() && !literals.contains(&token) {
                    literals.push(token);
                }
            }
            literals
        };
        (
            extend(&self.true_literals, extra_true),
            extend(&self.false_literals, extra_false),
        )
    }
}

static PROCESS_LOCALE: OnceLock<RwLock<LocaleConfig>> = OnceLock::new();

fn process_cell() -> &'static RwLock<LocaleConfig> {
    PROCESS_LOCALE.get_or_init(|| RwLock::new(LocaleConfig::default()))
}

/// Snapshot of the process-wide default locale.
pub fn process_locale() -> LocaleConfig {
    process_cell()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Replaces the process-wide default, e.g. after a preferences change.
pub fn set_process_locale(locale: LocaleConfig) {
    let mut guard = process_cell()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = locale;
}
