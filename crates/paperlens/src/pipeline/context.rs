use crate::completion::CompletionResult;
use crate::table::Record;

pub struct RowContext {
    // Input
    pub row_index: usize,
    pub record: Record,

    // Shown in logs instead of the full row
    pub title: String,

    // Step 1 result
    pub prompt: Option<String>,

    // Step 3 result
    pub completion: Option<CompletionResult>,
}

impl RowContext {
    pub fn new(row_index: usize, record: Record) -> Self {
        let title = record.title();
        Self {
            row_index,
            record,
            title,
            prompt: None,
            completion: None,
        }
    }

    /// "Row N (title)" with N 1-based.
    pub fn label(&self) -> String {
        format!("Row {} ({})", self.row_index + 1, self.title)
    }
}
