//! Subcommand implementations.
//!
//! - `run`: full table run
//! - `inspect`: column listing and prompt scaffold
//! - `backend`: connection probe and model listing

pub mod backend;
pub mod inspect;
pub mod run;

pub use backend::{models, probe};
pub use inspect::{columns, scaffold};
pub use run::run;

use std::path::PathBuf;

use log::info;
use paperlens::error::ConfigError;
use paperlens::{load_config, sanitize, Config};

use crate::cli::ConfigArgs;

/// Exit status of a subcommand that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// Stopped by Ctrl-C.
    Interrupted,
}

/// `<config dir>/paperlens/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("paperlens").join("config.json"))
}

pub fn load(args: &ConfigArgs) -> Result<Config, ConfigError> {
    let path = args
        .config
        .clone()
        .or_else(default_config_path)
        .ok_or(ConfigError::Validation {
            message: "no --config given and no platform config directory".to_string(),
        })?;

    info!("Loading config from {}", sanitize::redact_path(&path));
    load_config(&path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path_ends_in_app_dir() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("paperlens/config.json"));
        }
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let args = ConfigArgs {
            config: Some(PathBuf::from("/nonexistent/paperlens.json")),
        };
        assert!(matches!(load(&args), Err(ConfigError::ReadFile { .. })));
    }
}
