pub mod broadcast;
pub mod completion;
pub mod config;
pub mod error;
pub mod monitor;
pub mod pipeline;
pub mod remote;
pub mod response;
pub mod sanitize;
pub mod secrets;
pub mod session;
pub mod table;
pub mod worker;

pub use broadcast::{LogBroadcaster, LogLevel, RunProgressBroadcaster};
pub use completion::{build_completer, Completer, CompletionRequest, CompletionResult};
pub use config::{load_config, Config, PromptTemplate};
pub use error::{
    CompletionError, ConfigError, PaperlensError, ProbeError, Result, SourceError, WorkerError,
    WriterError,
};
pub use monitor::{UsageMonitor, UsageSnapshot};
pub use pipeline::{ProgressReporter, RowOutcome, RunConfig, RunState};
pub use remote::{CommandExecutor, CommandOutput};
pub use response::parse_response;
pub use secrets::{resolve_api_key, SecretError};
pub use session::TableSession;
pub use table::{Record, RowSource};
pub use worker::{Dispatcher, RunReport};

/// Identifier for one run, attached to its progress events.
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
