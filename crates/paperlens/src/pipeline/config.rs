use std::path::PathBuf;
use std::time::Duration;

use crate::completion::{BackendKind, CompletionSettings, SamplingParams};
use crate::config::{parse_column_list, ApiMode, Config, PromptTemplate};
use crate::error::ConfigError;
use crate::monitor::UsageLimits;
use crate::secrets;

/// Immutable settings for one table run, shared by every worker.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub failures_file: Option<PathBuf>,
    /// Empty means "every key of the parsed answers".
    pub output_columns: Vec<String>,
    pub prompt: PromptTemplate,
    pub max_workers: usize,
    /// Pause before each request.
    pub api_delay: Duration,
    pub sort_by_row: bool,
    pub completion: CompletionSettings,
    pub monitor_enabled: bool,
    pub limits: UsageLimits,
}

impl RunConfig {
    /// Validates everything a run needs before the first row is read.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let table = &config.table;

        if config.prompt.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "prompt" });
        }
        if table.input_file.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "table.input_file",
            });
        }
        if table.output_file.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "table.output_file",
            });
        }
        if table.max_workers == 0 {
            return Err(ConfigError::Validation {
                message: "table.max_workers must be at least 1".to_string(),
            });
        }
        let api_delay = Duration::try_from_secs_f64(table.api_delay).map_err(|_| {
            ConfigError::Validation {
                message: format!("table.api_delay is not a valid delay: {}", table.api_delay),
            }
        })?;

        Ok(Self {
            input_file: PathBuf::from(&table.input_file),
            output_file: PathBuf::from(&table.output_file),
            failures_file: table
                .failures_file
                .as_deref()
                .filter(|f| !f.trim().is_empty())
                .map(PathBuf::from),
            output_columns: parse_column_list(&table.output_columns),
            prompt: PromptTemplate::new(config.prompt.clone()),
            max_workers: table.max_workers,
            api_delay,
            sort_by_row: table.sort_by_row,
            completion: completion_settings(config)?,
            monitor_enabled: config.monitor.enabled,
            limits: UsageLimits::from(&config.monitor),
        })
    }
}

/// Backend, endpoint and model for the configured API mode.
pub fn completion_settings(config: &Config) -> Result<CompletionSettings, ConfigError> {
    let sampling = SamplingParams::from(&config.online_api);

    match config.api_mode {
        ApiMode::Online => {
            let online = &config.online_api;
            if online.api_url.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: "online_api.api_url",
                });
            }
            if online.model.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: "online_api.model",
                });
            }
            if !secrets::has_key_source(
                online.api_key.as_deref(),
                online.api_key_file.as_deref(),
                online.api_key_env.as_deref(),
            ) {
                return Err(ConfigError::MissingField {
                    field: "online_api.api_key",
                });
            }

            Ok(CompletionSettings {
                backend: BackendKind::Hosted(online.provider),
                endpoint: online.api_url.trim().to_string(),
                model: online.model.trim().to_string(),
                sampling,
            })
        }
        ApiMode::Ollama => {
            if config.ollama.model.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: "ollama.model",
                });
            }

            Ok(CompletionSettings {
                backend: BackendKind::Ollama,
                endpoint: config.ollama.base_url(),
                model: config.ollama.full_model_name(),
                sampling,
            })
        }
    }
}
