use std::path::{Path, PathBuf};

use log::{debug, info};
use rust_xlsxwriter::{Format, Workbook};
use serde_json::Value;

use crate::error::WriterError;
use crate::pipeline::RowOutcome;
use crate::response::JsonObject;
use crate::sanitize;

use super::record::Record;
use super::source::TableFormat;

/// Longest string a spreadsheet cell accepts.
const XLSX_MAX_CELL_CHARS: usize = 32_767;

/// Writes Success outcomes as one row each, projected onto a column list.
#[derive(Debug, Clone, Default)]
pub struct ResultWriter {
    columns: Vec<String>,
}

impl ResultWriter {
    /// `columns` empty means "every key of the parsed answers".
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Output header for a set of outcomes.
    ///
    /// Without a configured column list this is the union of top-level keys
    /// across all parsed answers, in the order they were first seen.
    pub fn header(&self, outcomes: &[RowOutcome]) -> Vec<String> {
        if !self.columns.is_empty() {
            return self.columns.clone();
        }

        let mut keys: Vec<String> = Vec::new();
        for (_, _, parsed) in outcomes.iter().filter_map(RowOutcome::as_success) {
            for key in parsed.keys() {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
        keys
    }

    /// Writes every Success outcome to `path` and returns the number of data
    /// rows written. The format follows the file extension.
    pub fn write(&self, path: &Path, outcomes: &[RowOutcome]) -> Result<usize, WriterError> {
        let header = self.header(outcomes);
        let rows: Vec<Vec<String>> = outcomes
            .iter()
            .filter_map(RowOutcome::as_success)
            .map(|(_, record, parsed)| project(&header, parsed, record))
            .collect();

        write_table(path, &header, &rows)?;
        info!(
            "Wrote {} result rows to {}",
            rows.len(),
            sanitize::redact_path(path)
        );
        Ok(rows.len())
    }
}

/// Builds one output row: parsed answer first, then the input record, then "".
pub fn project(columns: &[String], parsed: &JsonObject, record: &Record) -> Vec<String> {
    columns
        .iter()
        .map(|column| match parsed.get(column) {
            Some(value) if !value.is_null() => json_cell(value),
            _ => record.get(column).unwrap_or_default().to_string(),
        })
        .collect()
}

/// Renders a JSON value as cell text. Strings are written without quotes,
/// nested values as compact JSON.
pub fn json_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Writes Failed outcomes (row number, title, error, raw response) for
/// debugging. Returns the number of rows written.
pub fn write_failures(path: &Path, outcomes: &[RowOutcome]) -> Result<usize, WriterError> {
    let header: Vec<String> = ["row", "title", "error", "raw_response"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let rows: Vec<Vec<String>> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            RowOutcome::Failed {
                row_index,
                record,
                error,
            } => Some(vec![
                (row_index + 1).to_string(),
                record.title(),
                error.to_string(),
                error.raw().unwrap_or_default().to_string(),
            ]),
            _ => None,
        })
        .collect();

    write_table(path, &header, &rows)?;
    info!(
        "Wrote {} failed rows to {}",
        rows.len(),
        sanitize::redact_path(path)
    );
    Ok(rows.len())
}

fn write_table(path: &Path, header: &[String], rows: &[Vec<String>]) -> Result<(), WriterError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| WriterError::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    match TableFormat::from_path(path) {
        TableFormat::Spreadsheet => write_xlsx(path, header, rows),
        TableFormat::Delimited { delimiter } => write_delimited(path, delimiter, header, rows),
    }
}

fn write_error(path: &Path, reason: impl std::fmt::Display) -> WriterError {
    WriterError::Write {
        path: PathBuf::from(path),
        reason: reason.to_string(),
    }
}

fn write_delimited(
    path: &Path,
    delimiter: u8,
    header: &[String],
    rows: &[Vec<String>],
) -> Result<(), WriterError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| write_error(path, e))?;

    if !header.is_empty() {
        writer.write_record(header).map_err(|e| write_error(path, e))?;
    }
    for row in rows {
        writer.write_record(row).map_err(|e| write_error(path, e))?;
    }
    writer.flush().map_err(|e| write_error(path, e))?;
    Ok(())
}

fn write_xlsx(path: &Path, header: &[String], rows: &[Vec<String>]) -> Result<(), WriterError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    for (col, name) in header.iter().enumerate() {
        let col = sheet_col(path, col)?;
        sheet
            .write_string_with_format(0, col, fit_cell(name), &bold)
            .map_err(|e| write_error(path, e))?;
    }

    for (i, row) in rows.iter().enumerate() {
        let row_number = u32::try_from(i + 1).map_err(|_| write_error(path, "too many rows"))?;
        for (col, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let col = sheet_col(path, col)?;
            sheet
                .write_string(row_number, col, fit_cell(value))
                .map_err(|e| write_error(path, e))?;
        }
    }

    workbook.save(path).map_err(|e| write_error(path, e))?;
    debug!("Saved workbook with {} rows", rows.len());
    Ok(())
}

fn sheet_col(path: &Path, col: usize) -> Result<u16, WriterError> {
    u16::try_from(col).map_err(|_| write_error(path, "too many columns"))
}

fn fit_cell(value: &str) -> &str {
    match value.char_indices().nth(XLSX_MAX_CELL_CHARS) {
        Some((cut, _)) => &value[..cut],
        None => value,
    }
}
