//! Fixed-size worker pool for blocking send jobs.
//!
//! Jobs flow in through a bounded channel and outcomes flow back through an
//! unbounded one to a single consumer. Each worker is a dedicated OS thread
//! with its own single-threaded tokio runtime; it blocks on the shared
//! [`RateGate`](crate::core::RateGate) before every send.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use owlmail_loadgen::config::WorkerPoolConfig;
//! use owlmail_loadgen::core::{RateGate, SmtpExecutor, WorkerPool};
//!
//! let gate = Arc::new(RateGate::new(200.0));
//! let pool = WorkerPool::new(
//!     WorkerPoolConfig::new().with_worker_count(4),
//!     gate,
//!     SmtpExecutor::default(),
//! )?;
//!
//! pool.submit(job)?;
//! pool.close();
//! let outcome = pool.recv_outcome()?;
//! ```

mod native;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub use native::WorkerPool;

/// Errors that can occur when using a `WorkerPool`.
#[derive(Debug)]
pub enum PoolError {
    /// The job queue is full; no more jobs can be accepted right now.
    QueueFull,

    /// The pool no longer accepts jobs.
    PoolShutdown,

    /// Every worker has exited; no further outcomes will arrive.
    Disconnected,

    /// Configuration validation failed.
    InvalidConfig(String),

    /// Internal error (thread spawn failure, etc.).
    Internal(String),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "job queue is full"),
            Self::PoolShutdown => write!(f, "pool has been shut down"),
            Self::Disconnected => write!(f, "all workers have exited"),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for PoolError {}

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,

    /// Jobs accepted by `submit`.
    pub submitted_jobs: u64,

    /// Jobs waiting in the queue.
    pub queued_jobs: u64,

    /// Jobs currently between admission and outcome.
    pub active_jobs: u64,

    /// Jobs that finished successfully.
    pub completed_jobs: u64,

    /// Jobs that finished with an error.
    pub failed_jobs: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub submitted_jobs: AtomicU64,
    pub queued_jobs: AtomicU64,
    pub active_jobs: AtomicU64,
    pub completed_jobs: AtomicU64,
    pub failed_jobs: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            submitted_jobs: self.submitted_jobs.load(Ordering::Relaxed),
            queued_jobs: self.queued_jobs.load(Ordering::Relaxed),
            active_jobs: self.active_jobs.load(Ordering::Relaxed),
            completed_jobs: self.completed_jobs.load(Ordering::Relaxed),
            failed_jobs: self.failed_jobs.load(Ordering::Relaxed),
        }
    }
}
