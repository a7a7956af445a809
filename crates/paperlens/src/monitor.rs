//! Request and token rate tracking.
//!
//! Every successful completion is recorded as a [`UsageEvent`]. Rates are
//! extrapolated from the totals during the first minute of a run and read
//! from a trailing 60 second window afterwards.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::MonitorConfig;

/// Width of the trailing rate window.
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Events older than this are dropped.
pub const RETENTION: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageEvent {
    pub at: Instant,
    pub tokens: u64,
}

/// Rates at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct UsageSnapshot {
    pub rpm: f64,
    pub tpm: f64,
    pub total_requests: u64,
    pub total_tokens: u64,
    pub avg_tokens_per_request: f64,
}

/// Soft limits a presentation layer can compare a snapshot against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageLimits {
    pub rpm_limit: f64,
    pub tpm_limit: f64,
    pub total_tokens_limit: u64,
}

impl From<&MonitorConfig> for UsageLimits {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            rpm_limit: config.rpm_limit,
            tpm_limit: config.tpm_limit,
            total_tokens_limit: config.total_tokens_limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LimitWarning {
    Rpm { current: f64, limit: f64 },
    Tpm { current: f64, limit: f64 },
    TotalTokens { current: u64, limit: u64 },
}

impl fmt::Display for LimitWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitWarning::Rpm { current, limit } => {
                write!(f, "RPM {:.1} exceeds limit {:.0}", current, limit)
            }
            LimitWarning::Tpm { current, limit } => {
                write!(f, "TPM {:.1} exceeds limit {:.0}", current, limit)
            }
            LimitWarning::TotalTokens { current, limit } => {
                write!(f, "total tokens {} exceed limit {}", current, limit)
            }
        }
    }
}

impl UsageSnapshot {
    /// Limits that the snapshot is above. Empty when everything is in range.
    pub fn limit_warnings(&self, limits: &UsageLimits) -> Vec<LimitWarning> {
        let mut warnings = Vec::new();
        if self.rpm > limits.rpm_limit {
            warnings.push(LimitWarning::Rpm {
                current: self.rpm,
                limit: limits.rpm_limit,
            });
        }
        if self.tpm > limits.tpm_limit {
            warnings.push(LimitWarning::Tpm {
                current: self.tpm,
                limit: limits.tpm_limit,
            });
        }
        if self.total_tokens > limits.total_tokens_limit {
            warnings.push(LimitWarning::TotalTokens {
                current: self.total_tokens,
                limit: limits.total_tokens_limit,
            });
        }
        warnings
    }
}

impl fmt::Display for UsageSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RPM {:.1} | TPM {:.1} | requests {} | tokens {} | avg {:.1} tokens/request",
            self.rpm, self.tpm, self.total_requests, self.total_tokens, self.avg_tokens_per_request
        )
    }
}

/// Accumulates usage events for one run. Not synchronized; the owner guards it.
#[derive(Debug, Clone)]
pub struct UsageMonitor {
    started: Instant,
    events: VecDeque<UsageEvent>,
    total_requests: u64,
    total_tokens: u64,
}

impl UsageMonitor {
    pub fn new(started: Instant) -> Self {
        Self {
            started,
            events: VecDeque::new(),
            total_requests: 0,
            total_tokens: 0,
        }
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    /// Records one request and drops events older than the retention window.
    pub fn record_event(&mut self, at: Instant, tokens: u64) {
        self.prune(at);
        self.events.push_back(UsageEvent { at, tokens });
        self.total_requests += 1;
        self.total_tokens += tokens;
    }

    /// Number of retained events.
    pub fn retained(&self) -> usize {
        self.events.len()
    }

    /// Computes rates as of `now` and prunes events past the retention window.
    pub fn compute_rates(&mut self, now: Instant) -> UsageSnapshot {
        self.prune(now);

        let elapsed = now.saturating_duration_since(self.started);
        let (rpm, tpm) = if elapsed < RATE_WINDOW {
            let secs = elapsed.as_secs_f64();
            if secs > 0.0 {
                (
                    self.total_requests as f64 * 60.0 / secs,
                    self.total_tokens as f64 * 60.0 / secs,
                )
            } else {
                (0.0, 0.0)
            }
        } else {
            let cutoff = now.checked_sub(RATE_WINDOW);
            let (requests, tokens) = self
                .events
                .iter()
                .filter(|e| cutoff.map_or(true, |c| e.at > c))
                .fold((0u64, 0u64), |(r, t), e| (r + 1, t + e.tokens));
            (requests as f64, tokens as f64)
        };

        let avg_tokens_per_request = if self.total_requests > 0 {
            self.total_tokens as f64 / self.total_requests as f64
        } else {
            0.0
        };

        UsageSnapshot {
            rpm,
            tpm,
            total_requests: self.total_requests,
            total_tokens: self.total_tokens,
            avg_tokens_per_request,
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(front) = self.events.front() {
            if now.saturating_duration_since(front.at) > RETENTION {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }
}
