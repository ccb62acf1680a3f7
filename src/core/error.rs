//! Error types for load generation.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::worker_pool::PoolError;

/// Errors that abort a run. These happen before any job is sent or when the
/// scheduler itself cannot account for every job.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Destination rejected by the target validator.
    #[error("refusing to send to non-private host: {0}")]
    Validation(String),
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Worker pool could not be started or failed underneath the scheduler.
    #[error("worker pool error: {0}")]
    Pool(#[from] PoolError),
    /// Workers exited before every job produced an outcome.
    #[error("run incomplete: expected {expected} outcomes, received {received}")]
    Incomplete {
        /// Number of submitted jobs.
        expected: u64,
        /// Number of outcomes actually collected.
        received: u64,
    },
}

/// Failure of a single send attempt. Recovered as a failed outcome, never fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SendError {
    /// Could not reach the server or the connection dropped mid-session.
    #[error("connect error: {0}")]
    Connect(String),
    /// The transaction did not finish within the configured timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// The server rejected the transaction or replied with garbage.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The executor panicked while handling the job.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SendError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Connect(_) => ErrorKind::Connect,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Coarse classification of per-job failures, used for aggregate reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`SendError::Connect`].
    Connect,
    /// See [`SendError::Timeout`].
    Timeout,
    /// See [`SendError::Protocol`].
    Protocol,
    /// See [`SendError::Internal`].
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Protocol => "protocol",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
