//! Broadcasting modules for real-time event streaming.
//!
//! Log lines and run progress are published on tokio broadcast channels so
//! any presentation layer (the CLI today) can subscribe without the pipeline
//! knowing who is listening or on which thread.

pub mod log_broadcaster;
pub mod run_progress;

pub use log_broadcaster::{LogBroadcaster, LogEvent, LogLevel};
pub use run_progress::{RunProgressBroadcaster, RunProgressEvent};
