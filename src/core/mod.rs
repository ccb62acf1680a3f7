//! Pacing-and-concurrency core: jobs, the rate gate, the worker pool and the
//! scheduler, plus the collaborators they drive.

pub mod error;
pub mod executor;
pub mod job;
pub mod message;
pub mod progress;
pub mod rate_limiter;
pub mod scheduler;
pub mod smtp;
pub mod validator;
pub mod worker_pool;

pub use error::{AppResult, ErrorKind, LoadError, SendError};
pub use executor::SendExecutor;
pub use job::{Envelope, Job, JobState, Outcome, Target};
pub use message::{synthesize, synthesize_with_rng, Payload};
pub use progress::{
    Counters, InMemoryProgressSink, JsonSink, LatencyRecorder, ProgressEvent, ProgressReporter,
    ProgressSink, ProgressSnapshot, RunPlan, RunSummary, StdoutSink,
};
pub use rate_limiter::RateGate;
pub use scheduler::Scheduler;
pub use smtp::SmtpExecutor;
pub use validator::{check_target, is_eligible};
pub use worker_pool::{PoolError, PoolStats, WorkerPool};
