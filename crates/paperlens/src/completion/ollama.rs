use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde_json::{json, Value};

use crate::error::CompletionError;

use super::http;
use super::{Completer, CompletionRequest, CompletionResult};

pub const OLLAMA_TIMEOUT: Duration = Duration::from_secs(120);

/// Ollama `generate` endpoint behind a local (usually tunnelled) port.
#[derive(Debug)]
pub struct OllamaCompleter {
    client: Client,
    generate_url: String,
    timeout: Duration,
}

impl OllamaCompleter {
    /// `base_url` is the server root, e.g. `http://localhost:11435`.
    pub fn new(base_url: &str) -> Result<Self, CompletionError> {
        Self::with_timeout(base_url, OLLAMA_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, CompletionError> {
        Ok(Self {
            client: http::client(timeout)?,
            generate_url: format!("{}/api/generate", base_url.trim_end_matches('/')),
            timeout,
        })
    }
}

impl Completer for OllamaCompleter {
    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResult, CompletionError> {
        let payload = json!({
            "model": request.model,
            "prompt": request.prompt,
            "stream": false,
        });
        debug!("POST {} model={}", self.generate_url, request.model);

        let response = self
            .client
            .post(&self.generate_url)
            .json(&payload)
            .send()
            .map_err(|e| http::send_error(e, self.timeout))?;

        let body = http::read_json(response, self.timeout)?;
        Ok(CompletionResult {
            text: body
                .get("response")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            tokens: extract_tokens(&body),
        })
    }
}

/// `usage.total_tokens` if present, otherwise prompt plus completion counts.
pub fn extract_tokens(body: &Value) -> u64 {
    if let Some(total) = body.pointer("/usage/total_tokens").and_then(Value::as_u64) {
        return total;
    }
    let count = |key: &str| body.get(key).and_then(Value::as_u64).unwrap_or(0);
    count("prompt_eval_count") + count("eval_count")
}
