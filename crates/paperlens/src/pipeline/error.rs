use thiserror::Error;

use crate::error::CompletionError;
use crate::response::ParseFailure;

/// Why a row ended up Failed. Never aborts the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Could not recover JSON from response: {message}")]
    ParseRecoveryExhausted { message: String, raw: String },
}

impl RowError {
    /// Raw response snippet, for parse failures.
    pub fn raw(&self) -> Option<&str> {
        match self {
            RowError::Network(_) => None,
            RowError::ParseRecoveryExhausted { raw, .. } => Some(raw),
        }
    }
}

impl From<CompletionError> for RowError {
    fn from(e: CompletionError) -> Self {
        RowError::Network(e.to_string())
    }
}

impl From<ParseFailure> for RowError {
    fn from(f: ParseFailure) -> Self {
        RowError::ParseRecoveryExhausted {
            message: f.message,
            raw: f.raw,
        }
    }
}
