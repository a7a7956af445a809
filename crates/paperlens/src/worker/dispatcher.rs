use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use log::{debug, info, warn};

use crate::broadcast::LogLevel;
use crate::completion::Completer;
use crate::error::WorkerError;
use crate::monitor::UsageSnapshot;
use crate::pipeline::{
    ProgressEvent, ProgressReporter, ProgressUpdate, RowOutcome, RowPipeline, RunConfig, RunState,
};
use crate::table::Record;

use super::aggregator::Aggregator;
use super::job::RowJob;
use super::pool::WorkerPool;

/// Completions between two progress reports.
pub const PROGRESS_EVERY: usize = 10;

const WAIT_STEP: Duration = Duration::from_millis(100);

/// What a run produced. Outcomes are in completion order.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcomes: Vec<RowOutcome>,
    pub total_rows: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub elapsed: Duration,
    pub usage: UsageSnapshot,
}

impl RunReport {
    pub fn new(
        outcomes: Vec<RowOutcome>,
        total_rows: usize,
        cancelled: bool,
        elapsed: Duration,
        usage: UsageSnapshot,
    ) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let skipped = outcomes.iter().filter(|o| o.is_skipped()).count();
        let failed = outcomes.iter().filter(|o| o.is_failed()).count();

        Self {
            outcomes,
            total_rows,
            succeeded,
            skipped,
            failed,
            cancelled,
            elapsed,
            usage,
        }
    }

    /// Rows that reached a terminal state.
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    /// Rows dropped by cancellation or never started.
    pub fn unfinished(&self) -> usize {
        self.total_rows.saturating_sub(self.outcomes.len())
    }

    /// Processed rows per second.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed() as f64 / secs
        } else {
            0.0
        }
    }

    pub fn sort_by_row(&mut self) {
        self.outcomes.sort_by_key(RowOutcome::row_index);
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Processed {}/{} rows in {:.1}s ({:.2} rows/s): {} succeeded, {} skipped, {} failed",
            self.processed(),
            self.total_rows,
            self.elapsed.as_secs_f64(),
            self.throughput(),
            self.succeeded,
            self.skipped,
            self.failed
        );
        if self.cancelled {
            summary.push_str(&format!("; cancelled with {} rows unfinished", self.unfinished()));
        }
        summary
    }
}

/// Fans records out over a worker pool and collects their outcomes.
pub struct Dispatcher {
    config: Arc<RunConfig>,
    completer: Arc<dyn Completer>,
    state: RunState,
}

impl Dispatcher {
    pub fn new(config: Arc<RunConfig>, completer: Arc<dyn Completer>, state: RunState) -> Self {
        Self {
            config,
            completer,
            state,
        }
    }

    /// Processes every record with up to `max_workers` rows in flight.
    ///
    /// On cancellation the call returns as soon as the flag is seen, with the
    /// outcomes that have landed by then. Workers still inside a backend call
    /// finish it in the background and their result is dropped.
    pub fn run(
        &self,
        records: Vec<Record>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Result<RunReport, WorkerError> {
        let started = Instant::now();
        let total = records.len();
        let aggregator = Arc::new(Aggregator::started_at(started));

        if total == 0 {
            progress.report(ProgressEvent::log(LogLevel::Warn, "No data rows to process"));
            return Ok(RunReport::new(
                Vec::new(),
                0,
                false,
                started.elapsed(),
                aggregator.usage_snapshot(),
            ));
        }

        let worker_count = self.config.max_workers.min(total);
        let pipeline = Arc::new(RowPipeline::new(
            Arc::clone(&self.config),
            Arc::clone(&self.completer),
            Arc::clone(&aggregator),
            self.state.clone(),
        ));
        let mut pool = WorkerPool::new(
            pipeline,
            Arc::clone(&aggregator),
            Arc::clone(&progress),
            worker_count,
        )?;

        for (row_index, record) in records.into_iter().enumerate() {
            pool.submit(RowJob::new(row_index, record))?;
        }
        pool.close_queue();

        let message = format!(
            "Processing {} rows with {} workers ({})",
            total, worker_count, self.config.completion.backend
        );
        info!("{}", message);
        progress.report(ProgressEvent::log(LogLevel::Info, message));

        let mut finished = 0;
        let mut cancelled = false;
        while finished < total {
            if !self.state.is_running() {
                cancelled = true;
                break;
            }

            match pool.recv_finished_timeout(WAIT_STEP) {
                Ok(_) => {
                    finished += 1;
                    if finished % PROGRESS_EVERY == 0 || finished == total {
                        self.report_progress(&aggregator, progress.as_ref(), finished, total, started);
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("All workers exited with {} of {} rows finished", finished, total);
                    break;
                }
            }
        }

        if cancelled {
            progress.report(ProgressEvent::log(
                LogLevel::Warn,
                format!("Run cancelled after {} of {} rows", finished, total),
            ));
            pool.detach();
        } else {
            pool.wait();
        }

        let outcomes = aggregator.outcomes_snapshot();
        debug!("{} outcomes landed", outcomes.len());

        let report = RunReport::new(
            outcomes,
            total,
            cancelled,
            started.elapsed(),
            aggregator.usage_snapshot(),
        );
        let summary = report.summary();
        info!("{}", summary);
        progress.report(ProgressEvent::log(
            if report.failed == 0 && !cancelled {
                LogLevel::Success
            } else {
                LogLevel::Warn
            },
            summary,
        ));

        Ok(report)
    }

    fn report_progress(
        &self,
        aggregator: &Aggregator,
        progress: &dyn ProgressReporter,
        completed: usize,
        total: usize,
        started: Instant,
    ) {
        progress.report(ProgressEvent::Progress(ProgressUpdate {
            completed,
            total,
            elapsed: started.elapsed(),
        }));

        if self.config.monitor_enabled {
            let snapshot = aggregator.usage_snapshot();
            let warnings = snapshot.limit_warnings(&self.config.limits);
            progress.report(ProgressEvent::Usage { snapshot, warnings });
        }
    }
}
