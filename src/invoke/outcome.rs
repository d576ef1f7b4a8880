//! Invocation outcomes and tabular results

use serde::Serialize;

/// Uniform tabular result of a row-returning call: a header of column
/// labels plus data rows, every cell already rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    pub fn new(columns: Vec<String>) -> Self {
        ResultTable {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a data row. Rows narrower or wider than the header are
    /// padded or truncated to the header width.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Builder form of `push_row`
    #[must_use]
    pub fn with_row<I, S>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_row(row.into_iter().map(Into::into).collect());
        self
    }

    /// True when there are no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Widest cell per column, header included, counted in chars
    pub fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        widths
    }
}

/// Result of dispatching one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// A query returned at least one row
    Rows { table: ResultTable },
    /// A query returned no rows
    Empty { columns: Vec<String> },
    /// A mutation completed; `generated_id` is set for id-returning inserts
    Success { generated_id: Option<i32> },
    /// Execution failed
    Failure {
        message: String,
        #[serde(skip)]
        connection_lost: bool,
    },
}

impl Outcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Outcome::Failure {
            message: message.into(),
            connection_lost: false,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure { .. })
    }

    /// Short label for logs
    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Rows { .. } => "rows",
            Outcome::Empty { .. } => "empty",
            Outcome::Success { .. } => "success",
            Outcome::Failure { .. } => "failure",
        }
    }
}
