//! Completion backends.
//!
//! A run talks to exactly one backend, chosen once from the config and used
//! through the [`Completer`] trait by every worker:
//!
//! - [`HostedCompleter`] posts OpenAI-style chat completions to a hosted API
//! - [`OllamaCompleter`] posts to the `/api/generate` endpoint of an Ollama
//!   server reached through a local port
//!
//! Both are blocking. Workers are OS threads, so a call occupies its thread
//! until the response arrives or the timeout fires.

pub mod hosted;
mod http;
pub mod models;
pub mod ollama;
pub mod probe;

use std::sync::Arc;

use secrecy::SecretString;

use crate::config::{OnlineApiConfig, Provider};
use crate::error::CompletionError;

pub use hosted::HostedCompleter;
pub use models::{list_hosted_models, list_ollama_models};
pub use ollama::OllamaCompleter;
pub use probe::{probe_ollama, ProbeOptions};

/// Which backend, and for hosted APIs which payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Hosted(Provider),
    Ollama,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Hosted(Provider::Siliconflow) => write!(f, "hosted (siliconflow)"),
            BackendKind::Hosted(Provider::Custom) => write!(f, "hosted (custom)"),
            BackendKind::Ollama => write!(f, "ollama"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    pub enable_thinking: bool,
    pub thinking_budget: u32,
}

impl From<&OnlineApiConfig> for SamplingParams {
    fn from(config: &OnlineApiConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
            enable_thinking: config.enable_thinking,
            thinking_budget: config.thinking_budget,
        }
    }
}

/// Per-run backend selection. Built once and shared by all workers.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSettings {
    pub backend: BackendKind,
    /// Chat-completions URL for hosted APIs, server base URL for Ollama.
    pub endpoint: String,
    pub model: String,
    pub sampling: SamplingParams,
}

impl CompletionSettings {
    pub fn request(&self, prompt: impl Into<String>) -> CompletionRequest {
        CompletionRequest {
            backend: self.backend,
            model: self.model.clone(),
            sampling: self.sampling,
            prompt: prompt.into(),
        }
    }
}

/// One completion call. Built fresh for every row.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub backend: BackendKind,
    pub model: String,
    pub sampling: SamplingParams,
    pub prompt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionResult {
    /// Trimmed response text; empty when the backend returned no content.
    pub text: String,
    /// Tokens used by the call, 0 if the backend did not say.
    pub tokens: u64,
}

pub trait Completer: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResult, CompletionError>;
}

impl<C: Completer + ?Sized> Completer for Arc<C> {
    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResult, CompletionError> {
        (**self).complete(request)
    }
}

/// Builds the completer for `settings`. Hosted backends need a key.
pub fn build_completer(
    settings: &CompletionSettings,
    api_key: Option<SecretString>,
) -> Result<Arc<dyn Completer>, crate::error::PaperlensError> {
    match settings.backend {
        BackendKind::Hosted(_) => {
            let api_key = api_key.ok_or(crate::error::ConfigError::MissingField {
                field: "online_api.api_key",
            })?;
            Ok(Arc::new(HostedCompleter::new(&settings.endpoint, api_key)?))
        }
        BackendKind::Ollama => Ok(Arc::new(OllamaCompleter::new(&settings.endpoint)?)),
    }
}
