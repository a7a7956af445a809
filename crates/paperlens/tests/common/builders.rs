//! Builder patterns for creating test data programmatically.
//!
//! These builders allow creating run configurations and input tables
//! without repetitive boilerplate code.

#![allow(dead_code)]

use paperlens::config::{
    ApiMode, Config, MonitorConfig, OllamaConfig, OnlineApiConfig, Provider, TableConfig,
};

/// Builder for creating `Config` instances.
pub struct ConfigBuilder {
    api_mode: ApiMode,
    online_api: OnlineApiConfig,
    ollama: OllamaConfig,
    table: TableConfig,
    prompt: String,
    monitor: MonitorConfig,
}

impl ConfigBuilder {
    /// Create a new builder with sensible defaults for testing: a custom
    /// hosted provider with an inline key, no delay and 4 workers.
    pub fn new() -> Self {
        Self {
            api_mode: ApiMode::Online,
            online_api: OnlineApiConfig {
                provider: Provider::Custom,
                api_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
                api_key: Some("sk-test".to_string()),
                model: "test-model".to_string(),
                ..OnlineApiConfig::default()
            },
            ollama: OllamaConfig::default(),
            table: TableConfig {
                input_file: "papers.csv".to_string(),
                output_file: "report.csv".to_string(),
                output_columns: String::new(),
                max_workers: 4,
                api_delay: 0.0,
                failures_file: None,
                sort_by_row: false,
            },
            prompt: "Classify {title}".to_string(),
            monitor: MonitorConfig::default(),
        }
    }

    /// Switch to the Ollama backend.
    pub fn ollama(mut self, port: u16, model: &str) -> Self {
        self.api_mode = ApiMode::Ollama;
        self.ollama.host = "127.0.0.1".to_string();
        self.ollama.local_port = port;
        self.ollama.model = model.to_string();
        self
    }

    pub fn provider(mut self, provider: Provider) -> Self {
        self.online_api.provider = provider;
        self
    }

    pub fn api_url(mut self, url: &str) -> Self {
        self.online_api.api_url = url.to_string();
        self
    }

    /// Set the inline API key (None removes it).
    pub fn api_key(mut self, key: Option<&str>) -> Self {
        self.online_api.api_key = key.map(str::to_string);
        self
    }

    pub fn api_key_env(mut self, name: &str) -> Self {
        self.online_api.api_key_env = Some(name.to_string());
        self
    }

    pub fn model(mut self, model: &str) -> Self {
        self.online_api.model = model.to_string();
        self
    }

    pub fn prompt(mut self, prompt: &str) -> Self {
        self.prompt = prompt.to_string();
        self
    }

    pub fn input_file(mut self, path: &str) -> Self {
        self.table.input_file = path.to_string();
        self
    }

    pub fn output_file(mut self, path: &str) -> Self {
        self.table.output_file = path.to_string();
        self
    }

    /// Comma-separated output columns.
    pub fn output_columns(mut self, columns: &str) -> Self {
        self.table.output_columns = columns.to_string();
        self
    }

    pub fn max_workers(mut self, workers: usize) -> Self {
        self.table.max_workers = workers;
        self
    }

    pub fn api_delay(mut self, seconds: f64) -> Self {
        self.table.api_delay = seconds;
        self
    }

    pub fn failures_file(mut self, path: &str) -> Self {
        self.table.failures_file = Some(path.to_string());
        self
    }

    pub fn sort_by_row(mut self, sort: bool) -> Self {
        self.table.sort_by_row = sort;
        self
    }

    pub fn monitor_enabled(mut self, enabled: bool) -> Self {
        self.monitor.enabled = enabled;
        self
    }

    /// Build the Config.
    pub fn build(self) -> Config {
        Config {
            version: "1.0".to_string(),
            api_mode: self.api_mode,
            online_api: self.online_api,
            ollama: self.ollama,
            table: self.table,
            prompt: self.prompt,
            monitor: self.monitor,
        }
    }

    /// Build and serialize to JSON.
    pub fn build_json(self) -> String {
        serde_json::to_string_pretty(&self.build()).expect("Failed to serialize config")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for delimited input tables.
pub struct TableBuilder {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableBuilder {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, values: &[&str]) -> Self {
        self.rows.push(values.iter().map(|v| v.to_string()).collect());
        self
    }

    /// Add `count` rows whose title is "paper {i}".
    pub fn numbered_papers(mut self, count: usize) -> Self {
        for i in 0..count {
            let mut row = vec![String::new(); self.headers.len()];
            if let Some(first) = row.first_mut() {
                *first = format!("paper {}", i);
            }
            self.rows.push(row);
        }
        self
    }

    /// CSV text with proper quoting.
    pub fn to_csv(&self) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.headers)
            .expect("Failed to write header");
        for row in &self.rows {
            writer.write_record(row).expect("Failed to write row");
        }
        String::from_utf8(writer.into_inner().expect("Failed to flush csv"))
            .expect("CSV is not UTF-8")
    }
}
