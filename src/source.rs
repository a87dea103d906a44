//! The row-source boundary and cooperative cancellation.
//!
//! Everything the engine knows about the file behind the grid goes through
//! [`RowSource`]: ordinal lookup, forward-only reads, and per-cell text
//! access. The CSV-backed implementation is what the CLI and tests use; a
//! viewer would supply its own.

use std::{
    io::Read,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::{Context, Result};
use encoding_rs::Encoding;

use crate::io_utils;

/// Cooperative cancellation flag, checked at least once per row during scans.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Forward-only row access over a delimited text file or an in-memory grid.
///
/// `read` advances one row and returns `false` at end of input; it never
/// rewinds. `value` returns the raw cell text for the current row, `None`
/// for a missing or empty cell.
pub trait RowSource {
    fn ordinal(&self, column_name: &str) -> Option<usize>;
    fn field_count(&self) -> usize;
    fn column_names(&self) -> &[String];
    fn read(&mut self) -> Result<bool>;
    fn value(&self, column_index: usize) -> Option<&str>;
}

/// CSV file reader implementing [`RowSource`].
pub struct CsvRowSource {
    reader: csv::Reader<Box<dyn Read>>,
    encoding: &'static Encoding,
    headers: Vec<String>,
    current: Vec<String>,
}

impl CsvRowSource {
    pub fn open(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Self> {
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter, true)?;
        let header_record = reader
            .byte_headers()
            .with_context(|| format!("Reading headers from {path:?}"))?
            .clone();
        let headers = io_utils::decode_record(&header_record, encoding)?;
        Ok(Self {
            reader,
            encoding,
            headers,
            current: Vec::new(),
        })
    }

    /// Builds an in-memory source over explicit rows, mostly for tests.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> MemoryRowSource {
        MemoryRowSource {
            headers,
            rows,
            cursor: None,
        }
    }
}

impl RowSource for CsvRowSource {
    fn ordinal(&self, column_name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column_name)
    }

    fn field_count(&self) -> usize {
        self.headers.len()
    }

    fn column_names(&self) -> &[String] {
        &self.headers
    }

    fn read(&mut self) -> Result<bool> {
        let mut record = csv::ByteRecord::new();
        if !self
            .reader
            .read_byte_record(&mut record)
            .context("Reading next row")?
        {
            return Ok(false);
        }
        self.current = io_utils::decode_record(&record, self.encoding)?;
        Ok(true)
    }

    fn value(&self, column_index: usize) -> Option<&str> {
        self.current
            .get(column_index)
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }
}

/// In-memory implementation used by tests and the view layer.
pub struct MemoryRowSource {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    cursor: Option<usize>,
}

impl RowSource for MemoryRowSource {
    fn ordinal(&self, column_name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column_name)
    }

    fn field_count(&self) -> usize {
        self.headers.len()
    }

    fn column_names(&self) -> &[String] {
        &self.headers
    }

    fn read(&mut self) -> Result<bool> {
        let next = match self.cursor {
            None => 0,
            Some(current) => current + 1,
        };
        if next >= self.rows.len() {
            return Ok(false);
        }
        self.cursor = Some(next);
        Ok(true)
    }

    fn value(&self, column_index: usize) -> Option<&str> {
        let row = self.cursor.and_then(|idx| self.rows.get(idx))?;
        row.get(column_index)
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }
}
