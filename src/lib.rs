//! # OwlMail load generator
//!
//! Concurrent, rate-limited SMTP load generation for private test mail servers.
//!
//! The crate synthesizes a configurable number of unique messages and delivers
//! them to one target server through a fixed pool of worker threads. A single
//! shared [`RateGate`](crate::core::RateGate) keeps the aggregate send rate under an
//! approximate ceiling, and a single aggregator counts outcomes so that
//! `sent + failed` always equals the number of jobs.
//!
//! ## Pieces
//!
//! - **Target validation**: only private/reserved IP literals are accepted
//!   unless explicitly overridden
//! - **Message synthesis**: every message is unique (index, timestamp, filler)
//! - **Rate gate**: lock-guarded check-and-advance watermark, sliced sleeps
//! - **Worker pool**: dedicated OS threads, bounded job queue, outcome channel
//! - **Scheduler**: feeder + aggregator, periodic progress, final summary
//!
//! ## Example
//!
//! ```rust,ignore
//! use owlmail_loadgen::config::LoadConfig;
//! use owlmail_loadgen::core::{Scheduler, SmtpExecutor};
//!
//! let config = LoadConfig::new()
//!     .with_target("192.168.1.20", 1025)
//!     .with_count(1_000)
//!     .with_concurrency(16)
//!     .with_rate(100.0);
//!
//! let scheduler = Scheduler::new(config, SmtpExecutor::default())?;
//! let summary = scheduler.run()?;
//! assert_eq!(summary.sent + summary.failed, 1_000);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Configuration models for runs and worker pools.
pub mod config;
/// Pacing-and-concurrency core and its collaborators.
pub mod core;
/// Shared utilities.
pub mod util;
