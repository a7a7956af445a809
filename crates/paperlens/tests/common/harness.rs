//! Test harness for isolated table runs.
//!
//! The `TestHarness` struct provides an isolated environment for testing the
//! row pipeline end to end, including:
//! - Temporary directories for input/output
//! - A scripted in-memory completion backend
//! - Full session execution with output capture

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use paperlens::error::CompletionError;
use paperlens::pipeline::{NoopProgress, ProgressEvent, ProgressReporter};
use paperlens::{
    Completer, CompletionRequest, CompletionResult, Config, RunConfig, RunReport, RunState,
    TableSession,
};

type ReplyFn = dyn Fn(&str) -> Result<CompletionResult, CompletionError> + Send + Sync;

/// In-memory backend answering each prompt through a closure.
pub struct ScriptedCompleter {
    reply: Box<ReplyFn>,
    latency: Duration,
    calls: AtomicUsize,
    returned: AtomicUsize,
}

impl ScriptedCompleter {
    pub fn new<F>(reply: F) -> Self
    where
        F: Fn(&str) -> Result<CompletionResult, CompletionError> + Send + Sync + 'static,
    {
        Self {
            reply: Box::new(reply),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            returned: AtomicUsize::new(0),
        }
    }

    /// Answers every prompt with the same text and token count.
    pub fn constant(text: &str, tokens: u64) -> Self {
        let text = text.to_string();
        Self::new(move |_| {
            Ok(CompletionResult {
                text: text.clone(),
                tokens,
            })
        })
    }

    /// Sleep this long inside every call, like a slow network.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Calls started so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls that have returned so far.
    pub fn returned(&self) -> usize {
        self.returned.load(Ordering::SeqCst)
    }
}

impl Completer for ScriptedCompleter {
    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResult, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        let result = (self.reply)(&request.prompt);
        self.returned.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// Reporter that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingProgress {
    pub events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl RecordingProgress {
    pub fn log_messages(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Log { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Test harness providing isolated execution environment for integration tests.
pub struct TestHarness {
    /// Temporary directory containing input/output subdirectories.
    temp_dir: TempDir,
    /// Path to the input directory within temp_dir.
    pub input_dir: PathBuf,
    /// Path to the output directory within temp_dir.
    pub output_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input_dir = temp_dir.path().join("input");
        let output_dir = temp_dir.path().join("output");

        std::fs::create_dir_all(&input_dir).expect("Failed to create input dir");
        std::fs::create_dir_all(&output_dir).expect("Failed to create output dir");

        Self {
            temp_dir,
            input_dir,
            output_dir,
        }
    }

    /// Get the base temp directory path.
    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a test input file to the input directory.
    pub fn write_input(&self, filename: &str, content: &str) -> PathBuf {
        let path = self.input_dir.join(filename);
        std::fs::write(&path, content).expect("Failed to write input file");
        path
    }

    /// Path of a (not yet existing) file in the output directory.
    pub fn output_path(&self, filename: &str) -> PathBuf {
        self.output_dir.join(filename)
    }

    /// Write a config file to the temp directory.
    pub fn write_config(&self, filename: &str, config: &Config) -> PathBuf {
        let path = self.temp_dir.path().join(filename);
        let json = serde_json::to_string_pretty(config).expect("Failed to serialize config");
        std::fs::write(&path, json).expect("Failed to write config file");
        path
    }

    /// Point `config` at files inside this harness.
    pub fn localize(&self, mut config: Config, input: &str, output: &str) -> Config {
        config.table.input_file = self.input_dir.join(input).display().to_string();
        config.table.output_file = self.output_path(output).display().to_string();
        if let Some(failures) = config.table.failures_file.take() {
            config.table.failures_file = Some(self.output_path(&failures).display().to_string());
        }
        config
    }

    /// Run a full session against `completer`.
    pub fn run(
        &self,
        config: &Config,
        completer: Arc<dyn Completer>,
        state: RunState,
        progress: Arc<dyn ProgressReporter>,
    ) -> paperlens::Result<RunReport> {
        let run_config = RunConfig::from_config(config)?;
        TableSession::new(Arc::new(run_config), completer).run(state, progress)
    }

    /// Run to completion without observing progress.
    pub fn run_quiet(
        &self,
        config: &Config,
        completer: Arc<dyn Completer>,
    ) -> paperlens::Result<RunReport> {
        self.run(config, completer, RunState::new(), Arc::new(NoopProgress))
    }

    /// Parse a CSV output file into rows (header first).
    pub fn read_csv(&self, path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .expect("Failed to open output");
        reader
            .records()
            .map(|r| r.expect("Bad output row").iter().map(str::to_string).collect())
            .collect()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
