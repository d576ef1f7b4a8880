//! Plain-text rendering of result tables

use crate::invoke::ResultTable;

/// Render the header and every row, each column left-aligned and padded to
/// one more than its widest cell, columns separated by two spaces.
pub fn render_table(table: &ResultTable) -> Vec<String> {
    let widths = table.column_widths();
    std::iter::once(&table.columns)
        .chain(&table.rows)
        .map(|row| render_row(row, &widths))
        .collect()
}

fn render_row(row: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (cell, width) in row.iter().zip(widths) {
        let width = width + 1;
        line.push_str(&format!("{cell:<width$}  "));
    }
    line.trim_end().to_string()
}
