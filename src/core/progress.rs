//! Progress reporting: periodic throughput snapshots and the final summary.
//!
//! The reporter only reads counters; the scheduler's aggregator owns them.
//! Events go to a [`ProgressSink`], which decides how they are rendered.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::io::Write;
use std::time::{Duration, Instant};

use hdrhistogram::Histogram;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::core::error::ErrorKind;
use crate::util::clock::per_second;

/// What a run is about to do, announced before the first job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunPlan {
    /// Identifier stamped on every message of the run.
    pub run_id: Uuid,
    /// `host:port` of the target server.
    pub target: String,
    /// Number of jobs.
    pub count: u64,
    /// Worker pool size.
    pub concurrency: usize,
    /// Approximate rate ceiling per second.
    pub rate: f64,
}

/// Throughput snapshot emitted every N completions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// Jobs with a terminal outcome so far.
    pub completed: u64,
    /// Jobs in the run.
    pub total: u64,
    /// Successful sends so far.
    pub sent: u64,
    /// Failed sends so far.
    pub failed: u64,
    /// `completed / elapsed` in jobs per second.
    pub average_rate: f64,
    /// Seconds since the run started.
    pub elapsed_secs: f64,
}

/// Final report over the whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Identifier stamped on every message of the run.
    pub run_id: Uuid,
    /// Jobs in the run.
    pub total: u64,
    /// Successful sends.
    pub sent: u64,
    /// Failed sends.
    pub failed: u64,
    /// Wall-clock duration of the run in seconds.
    pub elapsed_secs: f64,
    /// `(sent + failed) / elapsed` in jobs per second.
    pub average_rate: f64,
    /// Failure count per error kind.
    pub failures_by_kind: BTreeMap<ErrorKind, u64>,
    /// Mean time spent in the send executor, in milliseconds.
    pub latency_mean_ms: f64,
    /// 95th percentile time spent in the send executor, in milliseconds.
    pub latency_p95_ms: f64,
}

impl RunSummary {
    /// Jobs with a terminal outcome.
    #[must_use]
    pub const fn completed(&self) -> u64 {
        self.sent + self.failed
    }
}

/// Event delivered to a sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The run is about to start.
    Started(RunPlan),
    /// Periodic snapshot.
    Progress(ProgressSnapshot),
    /// The run finished.
    Finished(RunSummary),
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started(plan) => {
                writeln!(f, "Target SMTP: {}", plan.target)?;
                writeln!(
                    f,
                    "Count: {}, Concurrency: {}, Rate: ~{:.1}/s",
                    plan.count, plan.concurrency, plan.rate
                )?;
                write!(f, "Starting...")
            }
            Self::Progress(snap) => write!(
                f,
                "Progress {}/{} sent={} failed={} avg_rate={:.1}/s",
                snap.completed, snap.total, snap.sent, snap.failed, snap.average_rate
            ),
            Self::Finished(summary) => write!(
                f,
                "Done. sent={} failed={} elapsed={:.1}s avg_rate={:.1}/s",
                summary.sent, summary.failed, summary.elapsed_secs, summary.average_rate
            ),
        }
    }
}

/// Progress sink abstraction.
pub trait ProgressSink: Send {
    /// Record a progress event.
    fn record(&mut self, event: ProgressEvent);
}

/// Human-readable lines on stdout.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl ProgressSink for StdoutSink {
    fn record(&mut self, event: ProgressEvent) {
        let mut out = std::io::stdout().lock();
        // A closed stdout must not take the run down with it.
        let _ = writeln!(out, "{event}");
        let _ = out.flush();
    }
}

/// One JSON object per line on stdout.
#[derive(Debug, Default)]
pub struct JsonSink;

impl ProgressSink for JsonSink {
    fn record(&mut self, event: ProgressEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => {
                let mut out = std::io::stdout().lock();
                let _ = writeln!(out, "{line}");
                let _ = out.flush();
            }
            Err(e) => warn!(error = %e, "Failed to encode progress event"),
        }
    }
}

/// In-memory sink for testing, keeping the most recent events.
#[derive(Debug)]
pub struct InMemoryProgressSink {
    events: VecDeque<ProgressEvent>,
    max_events: usize,
}

impl InMemoryProgressSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(1024)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.iter().cloned().collect()
    }

    /// Periodic snapshots only.
    #[must_use]
    pub fn snapshots(&self) -> Vec<ProgressSnapshot> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::Progress(snap) => Some(snap.clone()),
                _ => None,
            })
            .collect()
    }

    /// The final summary, if the run finished.
    #[must_use]
    pub fn summary(&self) -> Option<RunSummary> {
        self.events.iter().rev().find_map(|event| match event {
            ProgressEvent::Finished(summary) => Some(summary.clone()),
            _ => None,
        })
    }
}

impl ProgressSink for InMemoryProgressSink {
    fn record(&mut self, event: ProgressEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Aggregate counters. Owned and mutated by the scheduler's aggregator only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counters {
    /// Successful sends.
    pub sent: u64,
    /// Failed sends.
    pub failed: u64,
    /// Failure count per error kind.
    pub failures_by_kind: BTreeMap<ErrorKind, u64>,
}

impl Counters {
    /// Count one outcome.
    pub fn record(&mut self, failure: Option<ErrorKind>) {
        match failure {
            None => self.sent += 1,
            Some(kind) => {
                self.failed += 1;
                *self.failures_by_kind.entry(kind).or_insert(0) += 1;
            }
        }
    }

    /// Jobs with a terminal outcome.
    #[must_use]
    pub const fn completed(&self) -> u64 {
        self.sent + self.failed
    }
}

/// Emits snapshots every `every` completions and the final summary.
#[derive(Debug)]
pub struct ProgressReporter {
    every: u64,
    total: u64,
    started: Instant,
}

impl ProgressReporter {
    /// Start the clock for a run of `total` jobs. `every = 0` disables
    /// periodic snapshots.
    #[must_use]
    pub fn new(total: u64, every: u64) -> Self {
        Self {
            every,
            total,
            started: Instant::now(),
        }
    }

    /// Time since the reporter was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Build a snapshot of `counters` at the current instant.
    #[must_use]
    pub fn snapshot(&self, counters: &Counters) -> ProgressSnapshot {
        let elapsed = self.elapsed();
        let completed = counters.completed();
        ProgressSnapshot {
            completed,
            total: self.total,
            sent: counters.sent,
            failed: counters.failed,
            average_rate: per_second(completed, elapsed),
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }

    /// Called after every outcome; emits a snapshot when the completed count
    /// hits a multiple of `every`. Returns whether one was emitted.
    pub fn observe(&self, counters: &Counters, sink: &mut dyn ProgressSink) -> bool {
        let completed = counters.completed();
        if self.every == 0 || completed == 0 || completed % self.every != 0 {
            return false;
        }
        sink.record(ProgressEvent::Progress(self.snapshot(counters)));
        true
    }

    /// Build the final summary and emit it.
    pub fn finish(
        &self,
        run_id: Uuid,
        counters: &Counters,
        latencies: &LatencyRecorder,
        sink: &mut dyn ProgressSink,
    ) -> RunSummary {
        let elapsed = self.elapsed();
        let summary = RunSummary {
            run_id,
            total: self.total,
            sent: counters.sent,
            failed: counters.failed,
            elapsed_secs: elapsed.as_secs_f64(),
            average_rate: per_second(counters.completed(), elapsed),
            failures_by_kind: counters.failures_by_kind.clone(),
            latency_mean_ms: latencies.mean_ms(),
            latency_p95_ms: latencies.p95_ms(),
        };
        sink.record(ProgressEvent::Finished(summary.clone()));
        summary
    }
}

/// Largest latency the histogram resolves; slower sends are clamped to it.
const MAX_TRACKED_LATENCY_MICROS: u64 = 3_600_000_000;

/// Latency samples in constant memory: an exact running mean plus an HDR
/// histogram (3 significant digits, microsecond units) for percentiles.
#[derive(Debug, Clone)]
pub struct LatencyRecorder {
    histogram: Option<Histogram<u64>>,
    total_micros: u128,
    samples: u64,
}

impl Default for LatencyRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyRecorder {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        let histogram = Histogram::new_with_bounds(1, MAX_TRACKED_LATENCY_MICROS, 3)
            .map_err(|e| warn!(error = %e, "Latency histogram unavailable; p95 will read 0"))
            .ok();
        Self {
            histogram,
            total_micros: 0,
            samples: 0,
        }
    }

    /// Add one sample.
    pub fn record(&mut self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.total_micros += u128::from(micros);
        self.samples += 1;
        if let Some(histogram) = self.histogram.as_mut() {
            histogram.saturating_record(micros.max(1));
        }
    }

    /// Number of samples recorded.
    #[must_use]
    pub const fn samples(&self) -> u64 {
        self.samples
    }

    /// Exact mean in milliseconds, 0 when empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_ms(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        self.total_micros as f64 / self.samples as f64 / 1_000.0
    }

    /// 95th percentile in milliseconds, 0 when empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn p95_ms(&self) -> f64 {
        match &self.histogram {
            Some(histogram) if histogram.len() > 0 => histogram.value_at_quantile(0.95) as f64 / 1_000.0,
            _ => 0.0,
        }
    }
}
