//! Units of work and their terminal results.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use crate::core::error::{ErrorKind, SendError};
use crate::core::message::{synthesize_with_rng, Payload};

/// Where and how long to try delivering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Server address or hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Budget for one whole transaction (connect through QUIT).
    pub timeout: Duration,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Envelope identities and run id shared by every job of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Sender identity.
    pub sender: String,
    /// Recipient identity.
    pub recipient: String,
    /// Identifier stamped on every message of the run.
    pub run_id: Uuid,
}

/// One message to send. Immutable once submitted.
#[derive(Debug, Clone)]
pub struct Job {
    /// 1-based position in the run.
    pub index: u64,
    /// Destination shared across the run.
    pub target: Arc<Target>,
    /// Envelope shared across the run.
    pub envelope: Arc<Envelope>,
    /// Seed for this job's filler text.
    pub seed: u64,
}

impl Job {
    /// Synthesize this job's message.
    #[must_use]
    pub fn payload(&self) -> Payload {
        let mut rng = StdRng::seed_from_u64(self.seed);
        synthesize_with_rng(
            self.index,
            &self.envelope.sender,
            &self.envelope.recipient,
            &mut rng,
        )
        .with_header("X-Loadtest-Run", self.envelope.run_id.to_string())
    }
}

/// Lifecycle of a job inside the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Waiting in the queue.
    Queued,
    /// Passed the rate gate.
    Admitted,
    /// Send in progress.
    Executing,
    /// Terminal.
    Completed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Queued => "queued",
            Self::Admitted => "admitted",
            Self::Executing => "executing",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Terminal result of exactly one job.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Index of the job this outcome belongs to.
    pub index: u64,
    /// `None` on success.
    pub error: Option<SendError>,
    /// Time spent in the send executor.
    pub latency: Duration,
}

impl Outcome {
    /// Whether the send succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Failure classification, if the send failed.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(SendError::kind)
    }
}
