use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Granularity of interruptible sleeps.
pub const SLEEP_STEP: Duration = Duration::from_millis(100);

/// Shared `is_running` flag for one run.
///
/// Cancellation is cooperative: workers poll the flag between steps and
/// during delays. A call already on the wire runs to completion (or its
/// timeout) and its result is discarded.
#[derive(Debug, Clone)]
pub struct RunState {
    running: Arc<AtomicBool>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Sleeps for `duration` in [`SLEEP_STEP`] increments. Returns false as
    /// soon as the run is cancelled.
    pub fn sleep_interruptible(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if !self.is_running() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(SLEEP_STEP.min(deadline - now));
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
