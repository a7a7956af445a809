use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use crate::config::Provider;
use crate::error::CompletionError;
use crate::sanitize;

use super::http;
use super::{BackendKind, Completer, CompletionRequest, CompletionResult};

pub const HOSTED_TIMEOUT: Duration = Duration::from_secs(120);

/// Hosted chat-completions API with bearer-token auth.
pub struct HostedCompleter {
    client: Client,
    api_url: String,
    api_key: SecretString,
    timeout: Duration,
}

impl std::fmt::Debug for HostedCompleter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedCompleter")
            .field("api_url", &sanitize::redact_url(&self.api_url))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HostedCompleter {
    pub fn new(api_url: &str, api_key: SecretString) -> Result<Self, CompletionError> {
        Self::with_timeout(api_url, api_key, HOSTED_TIMEOUT)
    }

    pub fn with_timeout(
        api_url: &str,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        Ok(Self {
            client: http::client(timeout)?,
            api_url: api_url.to_string(),
            api_key,
            timeout,
        })
    }
}

impl Completer for HostedCompleter {
    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResult, CompletionError> {
        let payload = build_payload(request);
        debug!(
            "POST {} model={} prompt_chars={}",
            sanitize::redact_url(&self.api_url),
            request.model,
            request.prompt.chars().count()
        );

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .map_err(|e| http::send_error(e, self.timeout))?;

        let body = http::read_json(response, self.timeout)?;
        Ok(CompletionResult {
            text: extract_content(&body),
            tokens: extract_tokens(&body),
        })
    }
}

/// Request body for the request's provider.
///
/// SiliconFlow gets the extended shape (thinking budget, `min_p`/`top_k`,
/// JSON response format). Everything else gets the plain chat shape, plus
/// `thinking_budget` when thinking is enabled.
pub fn build_payload(request: &CompletionRequest) -> Value {
    let messages = json!([{ "role": "user", "content": request.prompt }]);
    let sampling = &request.sampling;

    match request.backend {
        BackendKind::Hosted(Provider::Siliconflow) => json!({
            "model": request.model,
            "messages": messages,
            "stream": false,
            "max_tokens": sampling.max_tokens,
            "enable_thinking": sampling.enable_thinking,
            "thinking_budget": sampling.thinking_budget,
            "min_p": 0.05,
            "stop": null,
            "temperature": sampling.temperature,
            "top_p": sampling.top_p,
            "top_k": 50,
            "frequency_penalty": 0.5,
            "n": 1,
            "response_format": { "type": "json_object" },
        }),
        _ => {
            let mut payload = json!({
                "model": request.model,
                "messages": messages,
                "temperature": sampling.temperature,
                "max_tokens": sampling.max_tokens,
                "top_p": sampling.top_p,
            });
            if sampling.enable_thinking && sampling.thinking_budget > 0 {
                payload["thinking_budget"] = json!(sampling.thinking_budget);
            }
            payload
        }
    }
}

/// `choices[0].message.content`, trimmed. Missing content is an empty answer.
pub fn extract_content(body: &Value) -> String {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

pub fn extract_tokens(body: &Value) -> u64 {
    body.pointer("/usage/total_tokens")
        .and_then(Value::as_u64)
        .unwrap_or(0)
}
