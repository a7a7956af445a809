use crate::table::Record;

/// One data row waiting for a worker.
#[derive(Debug, Clone)]
pub struct RowJob {
    /// 0-based position among the input's data rows.
    pub row_index: usize,
    pub record: Record,
}

impl RowJob {
    pub fn new(row_index: usize, record: Record) -> Self {
        Self { row_index, record }
    }
}

/// Sent by a worker once it is done with a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowFinished {
    pub row_index: usize,
    /// False when the row was dropped because the run was cancelled.
    pub landed: bool,
}
