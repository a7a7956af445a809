//! Reachability check run once before a full Ollama run.

use std::time::Duration;

use log::{debug, info};

use crate::broadcast::LogLevel;
use crate::error::ProbeError;
use crate::pipeline::{ProgressEvent, ProgressReporter, RunState};

use super::http;
use super::{Completer, CompletionSettings, OllamaCompleter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOptions {
    /// Tries of `GET /api/tags` before giving up.
    pub attempts: u32,
    pub attempt_timeout: Duration,
    /// Pause between failed tries (interruptible).
    pub pause: Duration,
    /// Timeout of the test generation.
    pub generation_timeout: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            attempts: 5,
            attempt_timeout: Duration::from_secs(5),
            pause: Duration::from_secs(1),
            generation_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// Attempt on which the server answered (1-based).
    pub attempts: u32,
    /// Reply to the test prompt.
    pub reply: String,
    pub tokens: u64,
}

/// Checks that the Ollama server behind `settings.endpoint` answers and that
/// `settings.model` can generate.
pub fn probe_ollama(
    settings: &CompletionSettings,
    options: &ProbeOptions,
    state: &RunState,
    progress: &dyn ProgressReporter,
) -> Result<ProbeReport, ProbeError> {
    let base_url = settings.endpoint.trim_end_matches('/');
    let tags_url = format!("{}/api/tags", base_url);
    let client = http::client(options.attempt_timeout).map_err(|e| ProbeError::Unreachable {
        url: base_url.to_string(),
        attempts: 0,
        last_error: e.to_string(),
    })?;

    let mut answered_on = None;
    let mut last_error = String::new();
    for attempt in 1..=options.attempts {
        if !state.is_running() {
            return Err(ProbeError::Cancelled);
        }

        match client.get(&tags_url).send() {
            Ok(response) if response.status().is_success() => {
                answered_on = Some(attempt);
                break;
            }
            Ok(response) => last_error = format!("HTTP {}", response.status().as_u16()),
            Err(e) => last_error = http::send_error(e, options.attempt_timeout).to_string(),
        }
        debug!("Probe attempt {}/{} failed: {}", attempt, options.attempts, last_error);

        if attempt < options.attempts && !state.sleep_interruptible(options.pause) {
            return Err(ProbeError::Cancelled);
        }
    }

    let attempts = answered_on.ok_or_else(|| {
        progress.report(ProgressEvent::log(
            LogLevel::Error,
            format!("Ollama server at {} is not reachable", base_url),
        ));
        ProbeError::Unreachable {
            url: base_url.to_string(),
            attempts: options.attempts,
            last_error: last_error.clone(),
        }
    })?;
    progress.report(ProgressEvent::log(
        LogLevel::Success,
        format!("Connected to Ollama server at {}", base_url),
    ));

    let generation_error = |source| ProbeError::Generation {
        model: settings.model.clone(),
        source,
    };
    let completer = OllamaCompleter::with_timeout(base_url, options.generation_timeout)
        .map_err(generation_error)?;
    let result = completer
        .complete(&settings.request("Hello"))
        .map_err(|e| {
            progress.report(ProgressEvent::log(
                LogLevel::Error,
                format!("Model {} failed the test generation: {}", settings.model, e),
            ));
            generation_error(e)
        })?;

    info!("Model {} answered the test prompt", settings.model);
    progress.report(ProgressEvent::log(
        LogLevel::Success,
        format!("Model {} is ready", settings.model),
    ));

    Ok(ProbeReport {
        attempts,
        reply: result.text,
        tokens: result.tokens,
    })
}
