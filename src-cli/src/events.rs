//! Event bridge between the paperlens library and the terminal.

use std::time::Duration;

use log::{debug, warn};
use paperlens::broadcast::{LogEvent, LogLevel, RunProgressEvent};
use paperlens::{LogBroadcaster, RunProgressBroadcaster};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// How long to wait for queued events after the run finished.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

pub fn format_log(event: &LogEvent) -> String {
    format!(
        "{} [{:<7}] {}",
        event.timestamp.with_timezone(&chrono::Local).format("%H:%M:%S"),
        event.level.as_str(),
        event.message
    )
}

pub fn format_progress(event: &RunProgressEvent) -> String {
    event.message.clone()
}

/// Printing side of a run. Dropping the broadcasters given to the pipeline
/// closes the channels and ends the bridge.
pub struct EventBridge {
    handles: Vec<JoinHandle<()>>,
}

impl EventBridge {
    /// Subscribes to both broadcasters and prints their events.
    pub fn start(logs: &LogBroadcaster, runs: &RunProgressBroadcaster) -> Self {
        let mut log_rx = logs.subscribe();
        let log_handle = tokio::spawn(async move {
            loop {
                match log_rx.recv().await {
                    Ok(event) => match event.level {
                        LogLevel::Warn | LogLevel::Error => eprintln!("{}", format_log(&event)),
                        _ => println!("{}", format_log(&event)),
                    },
                    Err(RecvError::Lagged(n)) => {
                        warn!("Log event bridge lagged, missed {} events", n);
                    }
                    Err(RecvError::Closed) => {
                        debug!("Log broadcaster closed, stopping log event bridge");
                        break;
                    }
                }
            }
        });

        let mut run_rx = runs.subscribe();
        let run_handle = tokio::spawn(async move {
            loop {
                match run_rx.recv().await {
                    Ok(event) => println!("{}", format_progress(&event)),
                    Err(RecvError::Lagged(n)) => {
                        warn!("Progress event bridge lagged, missed {} events", n);
                    }
                    Err(RecvError::Closed) => {
                        debug!("Progress broadcaster closed, stopping progress event bridge");
                        break;
                    }
                }
            }
        });

        Self {
            handles: vec![log_handle, run_handle],
        }
    }

    /// Waits for the bridge to print what is still queued.
    pub async fn finish(self) {
        for handle in self.handles {
            match tokio::time::timeout(DRAIN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Event bridge task failed: {}", e),
                Err(_) => debug!("Event bridge still open after {:?}", DRAIN_TIMEOUT),
            }
        }
    }
}
