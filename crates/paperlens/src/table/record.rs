use std::sync::Arc;

use crate::sanitize;

/// Longest identifier used in log lines for a row.
const TITLE_MAX_CHARS: usize = 50;

/// One input row: column names (shared by every row of a table) and values.
///
/// Column order follows the header row. If a header name repeats, lookups
/// return the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    columns: Arc<[String]>,
    values: Vec<String>,
}

impl Record {
    /// Builds a record, padding missing trailing cells with empty strings and
    /// dropping cells beyond the header width.
    pub fn new(columns: Arc<[String]>, mut values: Vec<String>) -> Self {
        values.resize(columns.len(), String::new());
        Self { columns, values }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let (columns, values): (Vec<String>, Vec<String>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i].as_str())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .zip(self.values.iter())
            .map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True if every cell is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(|v| v.trim().is_empty())
    }

    /// Short human-readable identifier for log lines: the `title` column if it
    /// has a value, otherwise the first non-empty cell.
    pub fn title(&self) -> String {
        let raw = self
            .get("title")
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.values.iter().map(String::as_str).find(|v| !v.trim().is_empty()))
            .unwrap_or("<untitled>");

        sanitize::preview(raw, TITLE_MAX_CHARS)
    }
}
