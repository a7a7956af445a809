use std::time::Duration;

use crate::broadcast::{LogBroadcaster, LogLevel, RunProgressBroadcaster, RunProgressEvent};
use crate::monitor::{LimitWarning, UsageSnapshot};

const LOG_TARGET: &str = "paperlens";

/// Throughput numbers after some rows have finished.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub completed: usize,
    pub total: usize,
    pub elapsed: Duration,
}

impl ProgressUpdate {
    /// Finished rows per second.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.completed as f64 / secs
        } else {
            0.0
        }
    }

    /// `(total - completed) / rate`; None until the rate is known.
    pub fn remaining(&self) -> Option<Duration> {
        let rate = self.rate();
        if rate > 0.0 {
            let left = self.total.saturating_sub(self.completed) as f64;
            Some(Duration::from_secs_f64(left / rate))
        } else {
            None
        }
    }

    pub fn message(&self) -> String {
        let percent = if self.total > 0 {
            self.completed as f64 * 100.0 / self.total as f64
        } else {
            100.0
        };
        let remaining = self
            .remaining()
            .map(|d| format!("{:.0}s", d.as_secs_f64()))
            .unwrap_or_else(|| "unknown".to_string());

        format!(
            "Progress {}/{} ({:.1}%) | elapsed {:.1}s | {:.2} rows/s | remaining {}",
            self.completed,
            self.total,
            percent,
            self.elapsed.as_secs_f64(),
            self.rate(),
            remaining
        )
    }
}

/// Events emitted while a table run is in progress.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Log { level: LogLevel, message: String },
    Progress(ProgressUpdate),
    Usage {
        snapshot: UsageSnapshot,
        warnings: Vec<LimitWarning>,
    },
}

impl ProgressEvent {
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        ProgressEvent::Log {
            level,
            message: message.into(),
        }
    }
}

/// Receives pipeline events. Called from worker threads.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

type LogFn = Box<dyn Fn(&str, LogLevel) + Send + Sync>;
type StatusFn = Box<dyn Fn(&str) + Send + Sync>;

/// Bridges events to a `log(message, level)` and a `progress(text)` callback.
pub struct CallbackProgress {
    log: LogFn,
    progress: StatusFn,
}

impl CallbackProgress {
    pub fn new<L, P>(log: L, progress: P) -> Self
    where
        L: Fn(&str, LogLevel) + Send + Sync + 'static,
        P: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            log: Box::new(log),
            progress: Box::new(progress),
        }
    }
}

impl ProgressReporter for CallbackProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Log { level, message } => (self.log)(&message, level),
            ProgressEvent::Progress(update) => (self.progress)(&update.message()),
            ProgressEvent::Usage { snapshot, warnings } => {
                (self.progress)(&format!("Usage: {}", snapshot));
                for warning in warnings {
                    (self.log)(&format!("Usage limit: {}", warning), LogLevel::Warn);
                }
            }
        }
    }
}

/// Publishes events on the log and run-progress broadcast channels.
pub struct BroadcastProgress {
    run_id: String,
    logs: LogBroadcaster,
    runs: RunProgressBroadcaster,
}

impl BroadcastProgress {
    pub fn new(run_id: &str, logs: LogBroadcaster, runs: RunProgressBroadcaster) -> Self {
        Self {
            run_id: run_id.to_string(),
            logs,
            runs,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Log { level, message } => self.logs.log(level, LOG_TARGET, &message),
            ProgressEvent::Progress(update) => {
                let event = RunProgressEvent::new(
                    &self.run_id,
                    update.completed,
                    update.total,
                    &update.message(),
                )
                .with_timing(
                    update.elapsed.as_secs_f64(),
                    update.rate(),
                    update.remaining().map(|d| d.as_secs_f64()),
                );
                self.runs.send(event);
            }
            ProgressEvent::Usage { snapshot, warnings } => {
                for warning in &warnings {
                    self.logs
                        .warn(LOG_TARGET, &format!("Usage limit: {}", warning));
                }
                let message = format!("Usage: {}", snapshot);
                self.runs.send(
                    RunProgressEvent::new(&self.run_id, 0, 0, &message).with_usage(snapshot),
                );
            }
        }
    }
}
