//! In-memory data view: typed rows bound to column formats, with a visible
//! subset driven by the applied filter expression.

use anyhow::Result;
use log::debug;

use crate::{
    compose::{EngineError, FilterPredicate, FilterTarget},
    format::ValueFormat,
    source::{CsvRowSource, MemoryRowSource, RowSource},
    value::Value,
};

/// Rows loaded from a source and parsed under per-column formats.
///
/// Cells that fail to parse under their column format keep their raw text as
/// a string value; the grid never hides data over a bad format guess.
#[derive(Debug)]
pub struct DataView {
    columns: Vec<String>,
    formats: Vec<Option<ValueFormat>>,
    raw_rows: Vec<Vec<Option<String>>>,
    typed_rows: Vec<Vec<Option<Value>>>,
    visible: Vec<usize>,
    predicate: Option<FilterPredicate>,
}

impl DataView {
    /// Reads the whole source. `formats` is positional; missing entries mean
    /// plain text.
    pub fn load(source: &mut dyn RowSource, formats: Vec<Option<ValueFormat>>) -> Result<Self> {
        let columns = source.column_names().to_vec();
        let mut raw_rows = Vec::new();
        let mut typed_rows = Vec::new();
        while source.read()? {
            let mut raw = Vec::with_capacity(columns.len());
            let mut typed = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                let cell = source.value(index).map(|v| v.to_string());
                let value = match (&cell, formats.get(index).and_then(Option::as_ref)) {
                    (Some(text), Some(format)) => match format.parse(text) {
                        Ok(value) => value,
                        Err(error) => {
                            debug!("cell {text:?} kept as text: {error:#}");
                            Some(Value::String(text.clone()))
                        }
                    },
                    (Some(text), None) => {
                        let trimmed = text.trim();
                        if trimmed.is_empty() {
                            None
                        } else {
                            Some(Value::String(trimmed.to_string()))
                        }
                    }
                    (None, _) => None,
                };
                raw.push(cell);
                typed.push(value);
            }
            raw_rows.push(raw);
            typed_rows.push(typed);
        }
        let visible = (0..typed_rows.len()).collect();
        Ok(Self {
            columns,
            formats,
            raw_rows,
            typed_rows,
            visible,
            predicate: None,
        })
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn formats(&self) -> &[Option<ValueFormat>] {
        &self.formats
    }

    pub fn row_count(&self) -> usize {
        self.typed_rows.len()
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn applied_filter(&self) -> Option<&str> {
        self.predicate.as_ref().map(FilterPredicate::source)
    }

    /// Typed cells of the visible rows, in source order.
    pub fn visible_rows(&self) -> impl Iterator<Item = &[Option<Value>]> {
        self.visible
            .iter()
            .map(|&index| self.typed_rows[index].as_slice())
    }

    /// Display text for one visible row, formatted per column.
    pub fn display_row(&self, visible_index: usize) -> Option<Vec<String>> {
        let &row = self.visible.get(visible_index)?;
        let cells = self
            .typed_rows
            .get(row)?
            .iter()
            .enumerate()
            .map(|(col, value)| match value {
                Some(value) => match self.formats.get(col).and_then(Option::as_ref) {
                    Some(format) => format.format_value(value),
                    None => value.as_display(),
                },
                None => String::new(),
            })
            .collect();
        Some(cells)
    }

    /// The visible rows as a fresh row source, raw text preserved. This is
    /// what value clustering scans, so clusters reflect the applied filter.
    pub fn visible_source(&self) -> MemoryRowSource {
        let rows = self
            .visible
            .iter()
            .map(|&index| {
                self.raw_rows[index]
                    .iter()
                    .map(|cell| cell.clone().unwrap_or_default())
                    .collect()
            })
            .collect();
        CsvRowSource::from_rows(self.columns.clone(), rows)
    }

    fn recompute_visible(&mut self) -> Result<(), EngineError> {
        let mut visible = Vec::with_capacity(self.typed_rows.len());
        for (index, row) in self.typed_rows.iter().enumerate() {
            let keep = match &self.predicate {
                Some(predicate) => predicate.matches(&self.columns, row)?,
                None => true,
            };
            if keep {
                visible.push(index);
            }
        }
        self.visible = visible;
        Ok(())
    }
}

impl FilterTarget for DataView {
    fn apply_filter(&mut self, expression: &str) -> Result<(), EngineError> {
        self.predicate = if expression.trim().is_empty() {
            None
        } else {
            Some(FilterPredicate::parse(expression)?)
        };
        self.recompute_visible()?;
        debug!(
            "filter left {} of {} row(s) visible",
            self.visible.len(),
            self.typed_rows.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::DataKind;

    fn view(headers: &[&str], rows: &[&[&str]], formats: Vec<Option<ValueFormat>>) -> DataView {
        let mut source = CsvRowSource::from_rows(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|v| v.to_string()).collect())
                .collect(),
        );
        DataView::load(&mut source, formats).unwrap()
    }

    #[test]
    fn applying_a_filter_narrows_visible_rows() {
        let mut view = view(
            &["city", "amount"],
            &[&["Oslo", "10"], &["Bergen", "3"], &["Oslo", "7"]],
            vec![None, Some(ValueFormat::new(DataKind::Integer))],
        );
        view.apply_filter("city = 'Oslo' AND amount > 5").unwrap();
        assert_eq!(view.visible_count(), 2);
        view.apply_filter("amount > 8").unwrap();
        assert_eq!(view.visible_count(), 1);
        view.apply_filter("").unwrap();
        assert_eq!(view.visible_count(), 3);
    }

    #[test]
    fn unparsed_cells_stay_visible_as_text() {
        let view = view(
            &["amount"],
            &[&["10"], &["oops"]],
            vec![Some(ValueFormat::new(DataKind::Integer))],
        );
        assert_eq!(view.display_row(1), Some(vec!["oops".to_string()]));
    }

    #[test]
    fn visible_source_reflects_the_filter() {
        let mut view = view(
            &["city"],
            &[&["Oslo"], &["Bergen"], &["Oslo"]],
            vec![None],
        );
        view.apply_filter("city = 'Oslo'").unwrap();
        let mut source = view.visible_source();
        let mut seen = Vec::new();
        while source.read().unwrap() {
            seen.push(source.value(0).unwrap_or_default().to_string());
        }
        assert_eq!(seen, vec!["Oslo", "Oslo"]);
    }
}
