//! API key resolution for hosted completion endpoints.
//!
//! A key can be given in three ways, checked in priority order:
//!
//! 1. **Inline** - `api_key` in the config file (quick local runs)
//! 2. **File** - `api_key_file`, e.g. a mounted secret or `~/.config/keys/siliconflow`
//! 3. **Environment** - `api_key_env`, the name of a variable holding the key
//!
//! Keys are wrapped in [`SecretString`] as soon as they are read so they never
//! show up in `Debug` output or logs.

use secrecy::SecretString;
use std::fs;

/// Error type for API key resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No API key configured (set one of: api_key, api_key_file, api_key_env)")]
    NoSourceProvided,

    #[error("Failed to read API key from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("API key file '{path}' is empty")]
    EmptyFile { path: String },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Resolves an API key from inline value, file, or environment variable.
///
/// Empty strings are treated as "not configured" so a config file can leave
/// `"api_key": ""` in place while the key comes from the environment.
///
/// ```ignore
/// use paperlens::secrets::resolve_api_key;
///
/// // Inline key wins over everything else
/// let key = resolve_api_key(Some("sk-local"), None, Some("SILICONFLOW_API_KEY"))?;
///
/// // Otherwise the environment is consulted
/// let key = resolve_api_key(None, None, Some("SILICONFLOW_API_KEY"))?;
/// ```
pub fn resolve_api_key(
    inline: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = inline.map(str::trim).filter(|v| !v.is_empty()) {
        return Ok(SecretString::from(value.to_string()));
    }

    if let Some(path) = file_path.filter(|p| !p.is_empty()) {
        let expanded = expand_home(path);
        let content = fs::read_to_string(&expanded).map_err(|e| SecretError::FileReadError {
            path: expanded.clone(),
            source: e,
        })?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(SecretError::EmptyFile { path: expanded });
        }
        return Ok(SecretString::from(trimmed.to_string()));
    }

    if let Some(name) = env_var.filter(|n| !n.is_empty()) {
        return match std::env::var(name) {
            // Trailing newlines are common when keys are exported from files
            Ok(value) if !value.trim().is_empty() => Ok(SecretString::from(value.trim())),
            Ok(_) | Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: name.to_string(),
            }),
        };
    }

    Err(SecretError::NoSourceProvided)
}

/// Returns true if at least one key source is configured (non-empty).
pub fn has_key_source(inline: Option<&str>, file_path: Option<&str>, env_var: Option<&str>) -> bool {
    inline.is_some_and(|s| !s.trim().is_empty())
        || file_path.is_some_and(|s| !s.is_empty())
        || env_var.is_some_and(|s| !s.is_empty())
}

/// Expands a leading `~` to the user's home directory (HOME, then USERPROFILE).
///
/// `~user/path` is not supported.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            if path == "~" {
                return home.to_string_lossy().into_owned();
            }
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
