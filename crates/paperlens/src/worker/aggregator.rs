use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use crate::monitor::{UsageMonitor, UsageSnapshot};
use crate::pipeline::RowOutcome;

struct Shared {
    outcomes: Vec<RowOutcome>,
    monitor: UsageMonitor,
}

/// Outcomes and usage events of one run, written by every worker.
///
/// A single lock guards both so a snapshot never sees a row's outcome
/// without its usage or the other way round.
pub struct Aggregator {
    shared: Mutex<Shared>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    pub fn started_at(started: Instant) -> Self {
        Self {
            shared: Mutex::new(Shared {
                outcomes: Vec::new(),
                monitor: UsageMonitor::new(started),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        // A worker that panicked mid-push leaves the data consistent enough
        // to keep counting.
        self.shared
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, outcome: RowOutcome) {
        self.lock().outcomes.push(outcome);
    }

    /// One successful backend call.
    pub fn record_usage(&self, tokens: u64) {
        self.lock().monitor.record_event(Instant::now(), tokens);
    }

    pub fn usage_snapshot(&self) -> UsageSnapshot {
        self.lock().monitor.compute_rates(Instant::now())
    }

    /// Outcomes landed so far, in completion order.
    pub fn outcomes_snapshot(&self) -> Vec<RowOutcome> {
        self.lock().outcomes.clone()
    }

    pub fn landed(&self) -> usize {
        self.lock().outcomes.len()
    }

    pub fn into_outcomes(self) -> Vec<RowOutcome> {
        self.shared
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .outcomes
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_concurrent_pushes_all_land() {
        let aggregator = Arc::new(Aggregator::new());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let aggregator = Arc::clone(&aggregator);
                thread::spawn(move || {
                    for i in 0..25 {
                        aggregator.push(RowOutcome::Skipped {
                            row_index: worker * 25 + i,
                        });
                        aggregator.record_usage(10);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(aggregator.landed(), 200);
        let snapshot = aggregator.usage_snapshot();
        assert_eq!(snapshot.total_requests, 200);
        assert_eq!(snapshot.total_tokens, 2000);

        let mut indices: Vec<_> = aggregator
            .outcomes_snapshot()
            .iter()
            .map(RowOutcome::row_index)
            .collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn test_into_outcomes_keeps_completion_order() {
        let aggregator = Aggregator::new();
        aggregator.push(RowOutcome::Skipped { row_index: 3 });
        aggregator.push(RowOutcome::Skipped { row_index: 1 });

        let order: Vec<_> = aggregator
            .into_outcomes()
            .iter()
            .map(RowOutcome::row_index)
            .collect();
        assert_eq!(order, vec![3, 1]);
    }
}
