pub mod config;
pub mod context;
pub mod error;
pub mod outcome;
pub mod progress;
pub mod runner;
pub mod state;

pub use config::RunConfig;
pub use context::RowContext;
pub use error::RowError;
pub use outcome::RowOutcome;
pub use progress::{
    BroadcastProgress, CallbackProgress, NoopProgress, ProgressEvent, ProgressReporter,
    ProgressUpdate,
};
pub use runner::RowPipeline;
pub use state::RunState;
