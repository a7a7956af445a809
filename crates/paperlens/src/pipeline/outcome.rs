use crate::response::JsonObject;
use crate::table::Record;

use super::error::RowError;

/// Terminal state of one row. `row_index` is the 0-based position among the
/// input's data rows; outcomes arrive in completion order.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Success {
        row_index: usize,
        record: Record,
        parsed: JsonObject,
    },
    Skipped {
        row_index: usize,
    },
    Failed {
        row_index: usize,
        record: Record,
        error: RowError,
    },
}

impl RowOutcome {
    pub fn row_index(&self) -> usize {
        match self {
            RowOutcome::Success { row_index, .. }
            | RowOutcome::Skipped { row_index }
            | RowOutcome::Failed { row_index, .. } => *row_index,
        }
    }

    pub fn as_success(&self) -> Option<(usize, &Record, &JsonObject)> {
        match self {
            RowOutcome::Success {
                row_index,
                record,
                parsed,
            } => Some((*row_index, record, parsed)),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RowOutcome::Success { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RowOutcome::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RowOutcome::Failed { .. })
    }
}
