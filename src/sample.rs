//! Sample collection: gathers distinct non-null values per column as input
//! for format inference and value clustering.

use anyhow::Result;
use log::debug;

use crate::source::{CancellationToken, RowSource};

/// Scan limits and null policy for one collection pass.
#[derive(Debug, Clone)]
pub struct SampleOptions {
    /// Distinct values kept per column; further distinct values are dropped.
    pub max_distinct_values: usize,
    /// Rows to scan at most; `None` scans to the end of the source.
    pub max_records: Option<usize>,
    /// Literals treated as null in addition to the empty cell, compared
    /// trimmed and case-insensitively (`NULL`, `N/A`, ...).
    pub treat_as_null: Vec<String>,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            max_distinct_values: 200,
            max_records: None,
            treat_as_null: Vec::new(),
        }
    }
}

impl SampleOptions {
    fn is_null(&self, raw: &str) -> bool {
        let trimmed = raw.trim();
        trimmed.is_empty()
            || self
                .treat_as_null
                .iter()
                .any(|literal| literal.trim().eq_ignore_ascii_case(trimmed))
    }
}

/// Distinct values for one column, in first-seen order, plus how many
/// records the pass actually consumed. A cancelled pass returns whatever
/// was gathered so far rather than an error.
#[derive(Debug, Clone, Default)]
pub struct SampleResult {
    pub values: Vec<String>,
    pub records_read: usize,
    pub truncated: bool,
    pub cancelled: bool,
}

impl SampleResult {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Collects samples for a single column. Stops early once the distinct cap
/// is reached.
pub fn collect(
    source: &mut dyn RowSource,
    column: usize,
    options: &SampleOptions,
    cancel: &CancellationToken,
) -> Result<SampleResult> {
    let mut all = collect_columns(source, &[column], options, cancel)?;
    Ok(all.pop().unwrap_or_default())
}

/// Collects samples for every column of the source in one pass.
pub fn collect_all(
    source: &mut dyn RowSource,
    options: &SampleOptions,
    cancel: &CancellationToken,
) -> Result<Vec<SampleResult>> {
    let columns: Vec<usize> = (0..source.field_count()).collect();
    collect_columns(source, &columns, options, cancel)
}

fn collect_columns(
    source: &mut dyn RowSource,
    columns: &[usize],
    options: &SampleOptions,
    cancel: &CancellationToken,
) -> Result<Vec<SampleResult>> {
    let mut results: Vec<SampleResult> = columns.iter().map(|_| SampleResult::default()).collect();
    let mut records_read = 0usize;

    while source.read()? {
        if cancel.is_cancelled() {
            for result in &mut results {
                result.cancelled = true;
            }
            break;
        }
        records_read += 1;

        let mut any_open = false;
        for (slot, &column) in columns.iter().enumerate() {
            let result = &mut results[slot];
            if result.values.len() >= options.max_distinct_values {
                result.truncated = true;
                continue;
            }
            any_open = true;
            let Some(raw) = source.value(column) else { continue };
            if options.is_null(raw) {
                continue;
            }
            if !result.values.iter().any(|seen| seen == raw) {
                result.values.push(raw.to_string());
            }
        }

        if !any_open {
            break;
        }
        if let Some(max) = options.max_records
            && records_read >= max
        {
            break;
        }
    }

    for result in &mut results {
        result.records_read = records_read;
    }
    debug!(
        "sampled {} column(s) over {} record(s)",
        columns.len(),
        records_read
    );
    Ok(results)
}
