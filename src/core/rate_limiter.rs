//! Global send-rate gate shared by every worker.
//!
//! The gate keeps the time of the last admission behind a `parking_lot::Mutex`.
//! Checking the watermark and recording a new admission happen under the same
//! lock, so two workers can never both be admitted off one stale reading.
//! Pacing is open-loop and best-effort: workers that have to wait sleep in
//! short slices and re-check, and admission order under contention is not FIFO.

use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Longest single sleep while waiting for admission.
pub const MAX_WAIT_SLICE: Duration = Duration::from_millis(50);

/// Floor applied to the configured rate before inverting it.
const MIN_RATE: f64 = 1e-9;

/// Shared pacing state: admits at most `rate` operations per second in aggregate.
#[derive(Debug)]
pub struct RateGate {
    min_interval: Duration,
    last_admit: Mutex<Option<Instant>>,
}

impl RateGate {
    /// Create a gate for `rate_per_sec` admissions per second.
    ///
    /// A rate of zero, below zero, or NaN yields an effectively unbounded
    /// interval: the first caller is admitted and later ones wait indefinitely.
    #[must_use]
    pub fn new(rate_per_sec: f64) -> Self {
        let rate = rate_per_sec.max(MIN_RATE);
        let min_interval = Duration::try_from_secs_f64(1.0 / rate).unwrap_or(Duration::MAX);
        Self {
            min_interval,
            last_admit: Mutex::new(None),
        }
    }

    /// Minimum spacing between two admissions.
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Single check-and-advance step.
    ///
    /// Returns `None` when the caller is admitted (and records the admission),
    /// or `Some(wait)` with the time left until the next admission is allowed.
    pub fn try_admit(&self) -> Option<Duration> {
        let mut last_admit = self.last_admit.lock();
        let now = Instant::now();
        match *last_admit {
            Some(last) => {
                let since = now.saturating_duration_since(last);
                if since >= self.min_interval {
                    *last_admit = Some(now);
                    None
                } else {
                    Some(self.min_interval - since)
                }
            }
            None => {
                *last_admit = Some(now);
                None
            }
        }
    }

    /// Block the calling thread until admitted. Returns the total time spent
    /// waiting.
    pub fn admit(&self) -> Duration {
        let started = Instant::now();
        while let Some(wait) = self.try_admit() {
            thread::sleep(wait.min(MAX_WAIT_SLICE));
        }
        started.elapsed()
    }
}
