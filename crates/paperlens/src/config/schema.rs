use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub api_mode: ApiMode,
    #[serde(default)]
    pub online_api: OnlineApiConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub table: TableConfig,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Which completion backend a run talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    #[default]
    Online,
    Ollama,
}

/// Hosted provider flavour. Decides the request payload shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Extended payload with thinking budget, min_p/top_k and JSON response format.
    #[default]
    Siliconflow,
    /// Plain OpenAI chat-completions payload.
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineApiConfig {
    #[serde(default)]
    pub provider: Provider,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_online_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default)]
    pub enable_thinking: bool,
    #[serde(default = "default_thinking_budget")]
    pub thinking_budget: u32,
}

fn default_api_url() -> String {
    "https://api.siliconflow.cn/v1/chat/completions".to_string()
}

fn default_online_model() -> String {
    "moonshotai/Kimi-K2-Instruct-0905".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_top_p() -> f64 {
    0.7
}

fn default_thinking_budget() -> u32 {
    4096
}

impl Default for OnlineApiConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            api_url: default_api_url(),
            api_key: None,
            api_key_file: None,
            api_key_env: None,
            model: default_online_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            enable_thinking: false,
            thinking_budget: default_thinking_budget(),
        }
    }
}

/// Ollama reached through a local port that an SSH tunnel forwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_host")]
    pub host: String,
    #[serde(default = "default_local_port")]
    pub local_port: u16,
    #[serde(default = "default_ollama_model")]
    pub model: String,
    #[serde(default)]
    pub model_size: Option<String>,
}

fn default_ollama_host() -> String {
    "localhost".to_string()
}

fn default_local_port() -> u16 {
    11435
}

fn default_ollama_model() -> String {
    "deepseek-r1".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            local_port: default_local_port(),
            model: default_ollama_model(),
            model_size: None,
        }
    }
}

impl OllamaConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.local_port)
    }

    /// Model name with the optional size tag, e.g. `qwen2.5:7b`.
    pub fn full_model_name(&self) -> String {
        crate::remote::full_model_name(&self.model, self.model_size.as_deref().unwrap_or(""))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default)]
    pub input_file: String,
    #[serde(default = "default_output_file")]
    pub output_file: String,
    #[serde(default = "default_output_columns")]
    pub output_columns: String,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Seconds to wait before each request.
    #[serde(default = "default_api_delay")]
    pub api_delay: f64,
    #[serde(default)]
    pub failures_file: Option<String>,
    #[serde(default)]
    pub sort_by_row: bool,
}

fn default_output_file() -> String {
    "report.csv".to_string()
}

fn default_output_columns() -> String {
    "title,category,method,team".to_string()
}

fn default_max_workers() -> usize {
    8
}

fn default_api_delay() -> f64 {
    0.5
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            input_file: String::new(),
            output_file: default_output_file(),
            output_columns: default_output_columns(),
            max_workers: default_max_workers(),
            api_delay: default_api_delay(),
            failures_file: None,
            sort_by_row: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rpm_limit")]
    pub rpm_limit: f64,
    #[serde(default = "default_tpm_limit")]
    pub tpm_limit: f64,
    #[serde(default = "default_total_tokens_limit")]
    pub total_tokens_limit: u64,
}

fn default_true() -> bool {
    true
}

fn default_rpm_limit() -> f64 {
    1000.0
}

fn default_tpm_limit() -> f64 {
    100_000.0
}

fn default_total_tokens_limit() -> u64 {
    1_000_000
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rpm_limit: default_rpm_limit(),
            tpm_limit: default_tpm_limit(),
            total_tokens_limit: default_total_tokens_limit(),
        }
    }
}
