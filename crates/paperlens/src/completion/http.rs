use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde_json::Value;

use crate::error::CompletionError;
use crate::sanitize::{self, ERROR_BODY_CHARS};

pub(crate) fn client(timeout: Duration) -> Result<Client, CompletionError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("paperlens/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| CompletionError::Client(e.to_string()))
}

pub(crate) fn send_error(error: reqwest::Error, timeout: Duration) -> CompletionError {
    if error.is_timeout() {
        CompletionError::Timeout(timeout.as_secs())
    } else {
        CompletionError::Connect(without_url(error).to_string())
    }
}

/// Non-2xx responses become [`CompletionError::Status`] with a truncated body.
pub(crate) fn read_json(response: Response, timeout: Duration) -> Result<Value, CompletionError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(CompletionError::Status {
            status: status.as_u16(),
            body: sanitize::truncate_chars(body.trim(), ERROR_BODY_CHARS),
        });
    }

    response.json::<Value>().map_err(|e| {
        if e.is_timeout() {
            CompletionError::Timeout(timeout.as_secs())
        } else {
            CompletionError::Decode(without_url(e).to_string())
        }
    })
}

/// Drops the request URL from an error so endpoints with embedded
/// credentials never reach a log line.
fn without_url(error: reqwest::Error) -> reqwest::Error {
    error.without_url()
}
