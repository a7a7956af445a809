use std::time::Duration;

use log::{debug, warn};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::config::Provider;
use crate::error::CompletionError;

use super::http;

pub const SILICONFLOW_MODELS_URL: &str = "https://api.siliconflow.cn/v1/models";

const LIST_TIMEOUT: Duration = Duration::from_secs(10);

/// Models offered by a hosted provider. Only SiliconFlow exposes a listing;
/// other providers yield an empty list.
pub fn list_hosted_models(
    provider: Provider,
    api_key: &SecretString,
) -> Result<Vec<String>, CompletionError> {
    match provider {
        Provider::Siliconflow => fetch_model_ids(SILICONFLOW_MODELS_URL, api_key),
        Provider::Custom => {
            warn!("Model listing is not supported for custom providers");
            Ok(Vec::new())
        }
    }
}

/// `GET url` with bearer auth; returns the non-empty `data[].id` values.
pub fn fetch_model_ids(url: &str, api_key: &SecretString) -> Result<Vec<String>, CompletionError> {
    let response = http::client(LIST_TIMEOUT)?
        .get(url)
        .bearer_auth(api_key.expose_secret())
        .send()
        .map_err(|e| http::send_error(e, LIST_TIMEOUT))?;

    let body = http::read_json(response, LIST_TIMEOUT)?;
    let ids = string_field(&body, "data", "id");
    debug!("Provider lists {} models", ids.len());
    Ok(ids)
}

/// Models installed on an Ollama server (`GET {base}/api/tags`).
pub fn list_ollama_models(base_url: &str) -> Result<Vec<String>, CompletionError> {
    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
    let response = http::client(LIST_TIMEOUT)?
        .get(&url)
        .send()
        .map_err(|e| http::send_error(e, LIST_TIMEOUT))?;

    let body = http::read_json(response, LIST_TIMEOUT)?;
    Ok(string_field(&body, "models", "name"))
}

fn string_field(body: &Value, list: &str, field: &str) -> Vec<String> {
    body.get(list)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(field).and_then(Value::as_str))
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_field_skips_empty_and_missing() {
        let body = json!({"data": [{"id": "a"}, {"id": ""}, {"object": "model"}, {"id": "b"}]});
        assert_eq!(string_field(&body, "data", "id"), vec!["a", "b"]);
        assert!(string_field(&json!({}), "data", "id").is_empty());
    }

    #[test]
    fn test_custom_provider_lists_nothing() {
        let key = SecretString::from("sk-test");
        assert!(list_hosted_models(Provider::Custom, &key).unwrap().is_empty());
    }
}
