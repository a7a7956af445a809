//! Run progress broadcaster for real-time status streaming.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::monitor::UsageSnapshot;

/// Progress of one table run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunProgressEvent {
    /// Unique run identifier.
    pub run_id: String,
    /// Rows finished so far.
    pub completed: usize,
    /// Rows submitted.
    pub total: usize,
    /// Human-readable status line.
    pub message: String,
    pub elapsed_secs: f64,
    pub rows_per_sec: f64,
    /// Linear estimate; absent until the first row finishes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_secs: Option<f64>,
    /// Usage rates, on usage updates only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageSnapshot>,
    pub timestamp: DateTime<Utc>,
}

impl RunProgressEvent {
    pub fn new(run_id: &str, completed: usize, total: usize, message: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            completed,
            total,
            message: message.to_string(),
            elapsed_secs: 0.0,
            rows_per_sec: 0.0,
            remaining_secs: None,
            usage: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_timing(mut self, elapsed_secs: f64, rows_per_sec: f64, remaining_secs: Option<f64>) -> Self {
        self.elapsed_secs = elapsed_secs;
        self.rows_per_sec = rows_per_sec;
        self.remaining_secs = remaining_secs;
        self
    }

    pub fn with_usage(mut self, usage: UsageSnapshot) -> Self {
        self.usage = Some(usage);
        self
    }
}

#[derive(Clone)]
pub struct RunProgressBroadcaster {
    sender: broadcast::Sender<RunProgressEvent>,
}

impl RunProgressBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn send(&self, event: RunProgressEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunProgressEvent> {
        self.sender.subscribe()
    }
}

impl Default for RunProgressBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}
