use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaperlensError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input table error: {0}")]
    Source(#[from] SourceError),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Output error: {0}")]
    Writer(#[from] WriterError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),

    #[error("Connection probe failed: {0}")]
    Probe(#[from] ProbeError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Missing required setting '{field}'")]
    MissingField { field: &'static str },
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Input file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Malformed input '{path}': {reason}")]
    MalformedInput { path: PathBuf, reason: String },

    #[error("Failed to read row {row} of '{path}': {reason}")]
    Read {
        path: PathBuf,
        row: usize,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response body: {0}")]
    Decode(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Server at {url} unreachable after {attempts} attempts: {last_error}")]
    Unreachable {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Test generation with model '{model}' failed: {source}")]
    Generation {
        model: String,
        #[source]
        source: CompletionError,
    },

    #[error("Probe cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("Failed to write '{path}': {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to spawn worker: {0}")]
    SpawnFailed(String),

    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, PaperlensError>;
