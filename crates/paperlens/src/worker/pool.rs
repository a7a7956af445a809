use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info};

use crate::error::WorkerError;
use crate::pipeline::{ProgressReporter, RowContext, RowPipeline};
use crate::worker::aggregator::Aggregator;
use crate::worker::job::{RowFinished, RowJob};

/// How long an idle worker blocks on the queue before re-checking shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct WorkerPool {
    job_sender: Option<Sender<RowJob>>,
    finished_receiver: Receiver<RowFinished>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Starts `worker_count` threads that run rows through `pipeline` and
    /// push their outcomes into `aggregator`.
    pub fn new(
        pipeline: Arc<RowPipeline>,
        aggregator: Arc<Aggregator>,
        progress: Arc<dyn ProgressReporter>,
        worker_count: usize,
    ) -> Result<Self, WorkerError> {
        if worker_count == 0 {
            return Err(WorkerError::SpawnFailed(
                "worker_count must be > 0".to_string(),
            ));
        }

        // Every row is queued up front, so the job queue is unbounded.
        let (job_sender, job_receiver) = unbounded::<RowJob>();
        let (finished_sender, finished_receiver) = unbounded::<RowFinished>();
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let worker = Worker {
                id: worker_id,
                jobs: job_receiver.clone(),
                finished: finished_sender.clone(),
                shutdown: Arc::clone(&shutdown),
                pipeline: Arc::clone(&pipeline),
                aggregator: Arc::clone(&aggregator),
                progress: Arc::clone(&progress),
            };

            let spawned = thread::Builder::new()
                .name(format!("paperlens-worker-{}", worker_id))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    shutdown.store(true, Ordering::Relaxed);
                    return Err(WorkerError::SpawnFailed(e.to_string()));
                }
            }
        }

        info!("Started {} workers", worker_count);

        Ok(Self {
            job_sender: Some(job_sender),
            finished_receiver,
            workers,
            shutdown,
        })
    }

    pub fn submit(&self, job: RowJob) -> Result<(), WorkerError> {
        if self.is_shutdown() {
            return Err(WorkerError::ChannelClosed);
        }

        self.job_sender
            .as_ref()
            .ok_or(WorkerError::ChannelClosed)?
            .send(job)
            .map_err(|_| WorkerError::ChannelClosed)
    }

    /// No more jobs. Workers exit once the queue is drained.
    pub fn close_queue(&mut self) {
        self.job_sender = None;
    }

    pub fn recv_finished_timeout(&self, timeout: Duration) -> Result<RowFinished, RecvTimeoutError> {
        self.finished_receiver.recv_timeout(timeout)
    }

    /// Workers stop taking new jobs. Queued jobs are abandoned.
    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn wait(mut self) {
        self.close_queue();

        for (i, worker) in std::mem::take(&mut self.workers).into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }

    /// Lets workers finish their in-flight call in the background.
    pub fn detach(mut self) {
        self.shutdown();
        self.close_queue();
        let running = std::mem::take(&mut self.workers).len();
        debug!("Detached {} workers", running);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

struct Worker {
    id: usize,
    jobs: Receiver<RowJob>,
    finished: Sender<RowFinished>,
    shutdown: Arc<AtomicBool>,
    pipeline: Arc<RowPipeline>,
    aggregator: Arc<Aggregator>,
    progress: Arc<dyn ProgressReporter>,
}

impl Worker {
    fn run(self) {
        debug!("Worker {} started", self.id);

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                debug!("Worker {} received shutdown signal", self.id);
                break;
            }

            match self.jobs.recv_timeout(POLL_INTERVAL) {
                Ok(job) => {
                    let row_index = job.row_index;
                    debug!("Worker {} processing row {}", self.id, row_index + 1);

                    let ctx = RowContext::new(job.row_index, job.record);
                    let landed = match self.pipeline.run(ctx, self.progress.as_ref()) {
                        Some(outcome) => {
                            self.aggregator.push(outcome);
                            true
                        }
                        None => false,
                    };

                    if self.finished.send(RowFinished { row_index, landed }).is_err() {
                        debug!("Worker {} has no dispatcher left", self.id);
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("Worker {} job channel disconnected", self.id);
                    break;
                }
            }
        }

        debug!("Worker {} stopped", self.id);
    }
}
