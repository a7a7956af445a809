//! One table run from input file to output file.

use std::sync::Arc;

use log::{info, warn};
use secrecy::SecretString;

use crate::broadcast::LogLevel;
use crate::completion::{build_completer, BackendKind, Completer};
use crate::config::{ApiMode, Config};
use crate::error::Result;
use crate::pipeline::{ProgressEvent, ProgressReporter, RunConfig, RunState};
use crate::sanitize;
use crate::secrets::{self, SecretError};
use crate::table::{write_failures, ResultWriter, RowSource, TableFormat};
use crate::worker::{Dispatcher, RunReport};

/// The hosted API key, resolved from the configured source. Ollama needs none.
pub fn api_key_for(config: &Config) -> std::result::Result<Option<SecretString>, SecretError> {
    match config.api_mode {
        ApiMode::Online => {
            let online = &config.online_api;
            secrets::resolve_api_key(
                online.api_key.as_deref(),
                online.api_key_file.as_deref(),
                online.api_key_env.as_deref(),
            )
            .map(Some)
        }
        ApiMode::Ollama => Ok(None),
    }
}

pub struct TableSession {
    config: Arc<RunConfig>,
    completer: Arc<dyn Completer>,
}

impl TableSession {
    /// Validates `config`, resolves the API key and builds the backend.
    /// Every failure here is fatal and happens before any row is read.
    pub fn prepare(config: &Config) -> Result<Self> {
        let run_config = RunConfig::from_config(config)?;

        let completer = build_completer(&run_config.completion, api_key_for(config)?)?;

        Ok(Self::new(Arc::new(run_config), completer))
    }

    pub fn new(config: Arc<RunConfig>, completer: Arc<dyn Completer>) -> Self {
        Self { config, completer }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Reads every row, processes them concurrently and writes the results.
    ///
    /// A cancelled run still writes the outcomes that landed.
    pub fn run(&self, state: RunState, progress: Arc<dyn ProgressReporter>) -> Result<RunReport> {
        let config = &self.config;
        let input = sanitize::redact_path(&config.input_file);

        let source = RowSource::open(&config.input_file, TableFormat::from_path(&config.input_file))?;
        let columns = source.columns().to_vec();
        info!("Reading {} ({} columns)", input, columns.len());

        let unmatched = config.prompt.unmatched_placeholders(&columns);
        if !unmatched.is_empty() {
            let message = format!(
                "Prompt placeholders without a matching column are left as-is: {}",
                unmatched.join(", ")
            );
            warn!("{}", message);
            progress.report(ProgressEvent::log(LogLevel::Warn, message));
        }

        let records = source.collect::<std::result::Result<Vec<_>, _>>()?;
        progress.report(ProgressEvent::log(
            LogLevel::Info,
            format!("Loaded {} rows from {}", records.len(), input),
        ));
        if let BackendKind::Hosted(_) = config.completion.backend {
            info!(
                "Using {} at {}",
                config.completion.model,
                sanitize::redact_url(&config.completion.endpoint)
            );
        }

        let dispatcher = Dispatcher::new(
            Arc::clone(config),
            Arc::clone(&self.completer),
            state,
        );
        let mut report = dispatcher.run(records, Arc::clone(&progress))?;
        if config.sort_by_row {
            report.sort_by_row();
        }

        let writer = ResultWriter::new(config.output_columns.clone());
        let written = writer.write(&config.output_file, &report.outcomes)?;
        progress.report(ProgressEvent::log(
            LogLevel::Success,
            format!(
                "Wrote {} rows to {}",
                written,
                sanitize::redact_path(&config.output_file)
            ),
        ));

        if let Some(failures_file) = &config.failures_file {
            if report.failed > 0 {
                let count = write_failures(failures_file, &report.outcomes)?;
                progress.report(ProgressEvent::log(
                    LogLevel::Warn,
                    format!(
                        "Wrote {} failed rows to {}",
                        count,
                        sanitize::redact_path(failures_file)
                    ),
                ));
            }
        }

        Ok(report)
    }
}
