use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use calamine::{open_workbook_auto, Data, Reader};
use log::debug;

use crate::error::SourceError;

use super::record::Record;

/// How a table file is laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Delimited text with a header line.
    Delimited { delimiter: u8 },
    /// Workbook (`.xlsx`, `.xls`, `.xlsm`, `.xlsb`, `.ods`); the first sheet is read.
    Spreadsheet,
}

impl TableFormat {
    /// Picks a format from the file extension. Unknown extensions are read as
    /// comma-separated text.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("xlsx" | "xls" | "xlsm" | "xlsb" | "ods") => TableFormat::Spreadsheet,
            Some("tsv" | "tab") => TableFormat::Delimited { delimiter: b'\t' },
            _ => TableFormat::Delimited { delimiter: b',' },
        }
    }
}

enum Rows {
    Delimited(csv::StringRecordsIntoIter<File>),
    Spreadsheet(std::vec::IntoIter<Vec<String>>),
}

/// Lazy, single-pass reader yielding one [`Record`] per data row.
///
/// The first row is the header. Rows whose cells are all blank are skipped.
pub struct RowSource {
    path: PathBuf,
    columns: Arc<[String]>,
    rows: Rows,
    /// 1-based line of the next data row, counting the header as line 1.
    line: usize,
}

impl std::fmt::Debug for RowSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowSource")
            .field("path", &self.path)
            .field("columns", &self.columns)
            .field("line", &self.line)
            .finish()
    }
}

impl RowSource {
    pub fn open(path: impl AsRef<Path>, format: TableFormat) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        ensure_exists(&path)?;

        let (header, rows) = match format {
            TableFormat::Delimited { delimiter } => {
                let mut reader = delimited_reader(&path, delimiter)?;
                let header: Vec<String> = reader
                    .headers()
                    .map_err(|e| malformed(&path, e))?
                    .iter()
                    .map(str::to_string)
                    .collect();
                (header, Rows::Delimited(reader.into_records()))
            }
            TableFormat::Spreadsheet => {
                let mut grid = read_first_sheet(&path)?.into_iter();
                let header = grid.next().unwrap_or_default();
                (header, Rows::Spreadsheet(grid))
            }
        };

        let columns = normalize_header(&path, header)?;
        debug!(
            "Opened table {:?} with {} columns",
            path.file_name().unwrap_or_default(),
            columns.len()
        );

        Ok(Self {
            path,
            columns: columns.into(),
            rows,
            line: 2,
        })
    }

    /// Opens `path` with the format implied by its extension.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        Self::open(path, TableFormat::from_path(path))
    }

    /// Reads only the header row.
    pub fn headers(path: impl AsRef<Path>, format: TableFormat) -> Result<Vec<String>, SourceError> {
        Ok(Self::open(path, format)?.columns.to_vec())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn next_values(&mut self) -> Option<Result<Vec<String>, SourceError>> {
        match &mut self.rows {
            Rows::Delimited(records) => records.next().map(|row| {
                row.map(|r| r.iter().map(str::to_string).collect())
                    .map_err(|e| SourceError::Read {
                        path: self.path.clone(),
                        row: self.line,
                        reason: e.to_string(),
                    })
            }),
            Rows::Spreadsheet(rows) => rows.next().map(Ok),
        }
    }
}

impl Iterator for RowSource {
    type Item = Result<Record, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let values = match self.next_values()? {
                Ok(values) => values,
                Err(e) => return Some(Err(e)),
            };
            self.line += 1;

            let record = Record::new(Arc::clone(&self.columns), values);
            if record.is_blank() {
                continue;
            }
            return Some(Ok(record));
        }
    }
}

fn ensure_exists(path: &Path) -> Result<(), SourceError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SourceError::FileNotFound(path.to_path_buf()))
    }
}

fn malformed(path: &Path, reason: impl std::fmt::Display) -> SourceError {
    SourceError::MalformedInput {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn delimited_reader(path: &Path, delimiter: u8) -> Result<csv::Reader<File>, SourceError> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| malformed(path, e))
}

fn read_first_sheet(path: &Path) -> Result<Vec<Vec<String>>, SourceError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| malformed(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| malformed(path, "workbook has no sheets"))?
        .map_err(|e| malformed(path, e))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Trims header names, strips a UTF-8 BOM and names blank headers by
/// position. A header row with no names at all is malformed.
fn normalize_header(path: &Path, header: Vec<String>) -> Result<Vec<String>, SourceError> {
    if header.iter().all(|h| h.trim().trim_start_matches('\u{feff}').is_empty()) {
        return Err(malformed(path, "header row is empty"));
    }

    Ok(header
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let name = name.trim_start_matches('\u{feff}').trim();
            if name.is_empty() {
                format!("column_{}", i + 1)
            } else {
                name.to_string()
            }
        })
        .collect())
}
