//! Plain-text table rendering for CLI output, with per-column alignment so
//! numeric columns line up the way the grid shows them.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::format::{DataKind, ValueFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Right,
}

impl Alignment {
    /// Numbers read right-aligned; everything else left.
    pub fn for_format(format: Option<&ValueFormat>) -> Self {
        match format.map(|f| f.kind) {
            Some(
                DataKind::Integer
                | DataKind::Numeric
                | DataKind::Double
                | DataKind::Percentage,
            ) => Alignment::Right,
            _ => Alignment::Left,
        }
    }
}

pub fn render_table(headers: &[String], rows: &[Vec<String>], alignments: &[Alignment]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| cell_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(cell_width(cell));
        }
    }
    for width in &mut widths {
        *width = (*width).max(3);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, alignments));
    let separator = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(output, "{separator}");
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, alignments));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>], alignments: &[Alignment]) {
    print!("{}", render_table(headers, rows, alignments));
}

fn format_row(values: &[String], widths: &[usize], alignments: &[Alignment]) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate() {
        let Some(&width) = widths.get(idx) else { break };
        let sanitized = sanitize_cell(value);
        let padding = width.saturating_sub(cell_width(sanitized.as_ref()));
        let alignment = alignments.get(idx).copied().unwrap_or_default();
        let mut cell = String::with_capacity(width);
        match alignment {
            Alignment::Left => {
                cell.push_str(sanitized.as_ref());
                cell.push_str(&" ".repeat(padding));
            }
            Alignment::Right => {
                cell.push_str(&" ".repeat(padding));
                cell.push_str(sanitized.as_ref());
            }
        }
        cells.push(cell);
    }
    let mut line = cells.join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn cell_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(
            value
                .chars()
                .map(|ch| match ch {
                    '\n' | '\r' | '\t' => ' ',
                    other => other,
                })
                .collect(),
        )
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn right_aligns_numeric_columns() {
        let rendered = render_table(
            &strings(&["name", "amount"]),
            &[strings(&["ann", "7"]), strings(&["bo", "120"])],
            &[Alignment::Left, Alignment::Right],
        );
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[2], "ann        7");
        assert_eq!(lines[3], "bo       120");
        // Last digits line up in the same terminal column.
        assert_eq!(lines[2].len(), lines[3].len());
    }

    #[test]
    fn control_characters_are_flattened() {
        let rendered = render_table(
            &strings(&["note"]),
            &[strings(&["a\nb"])],
            &[Alignment::Left],
        );
        assert!(rendered.contains("a b"));
    }
}
