//! Run orchestration: feed every job to the pool, collect exactly one outcome
//! per job, and keep the counters.
//!
//! A feeder thread submits jobs `1..=count` (blocking while the queue is full)
//! and closes the pool when done. The calling thread is the single aggregator:
//! it is the only place counters change, so no lock guards them.

use std::sync::Arc;
use std::thread;

use rand::Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::LoadConfig;
use crate::core::error::LoadError;
use crate::core::executor::SendExecutor;
use crate::core::job::{Envelope, Job, Target};
use crate::core::progress::{
    Counters, LatencyRecorder, ProgressEvent, ProgressReporter, ProgressSink, RunPlan, RunSummary,
    StdoutSink,
};
use crate::core::rate_limiter::RateGate;
use crate::core::validator::check_target;
use crate::core::worker_pool::{PoolError, WorkerPool};

/// Drives one load run against one target.
pub struct Scheduler<E>
where
    E: SendExecutor,
{
    config: LoadConfig,
    executor: E,
    run_id: Uuid,
}

impl<E> Scheduler<E>
where
    E: SendExecutor,
{
    /// Apply the destination gate, then validate `config`.
    ///
    /// The gate comes first: a refused host is reported as such even when
    /// other options are also invalid.
    ///
    /// # Errors
    ///
    /// - `LoadError::Validation` if the host is not private and the override
    ///   is not set
    /// - `LoadError::InvalidConfig` if the configuration does not validate
    pub fn new(config: LoadConfig, executor: E) -> Result<Self, LoadError> {
        check_target(&config.host, config.allow_non_private)?;
        config.validate().map_err(LoadError::InvalidConfig)?;
        Ok(Self {
            config,
            executor,
            run_id: Uuid::new_v4(),
        })
    }

    /// Identifier stamped on every message of this run.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Run to completion, printing progress to stdout.
    ///
    /// # Errors
    ///
    /// See [`Scheduler::run_with_sink`].
    pub fn run(&self) -> Result<RunSummary, LoadError> {
        self.run_with_sink(&mut StdoutSink)
    }

    /// Run to completion, reporting to `sink`.
    ///
    /// Individual send failures never fail the run; they are counted.
    ///
    /// # Errors
    ///
    /// - `LoadError::Pool` if the worker pool cannot start
    /// - `LoadError::Incomplete` if workers vanish before every job reports
    pub fn run_with_sink(&self, sink: &mut dyn ProgressSink) -> Result<RunSummary, LoadError> {
        let cfg = &self.config;
        let target = Arc::new(cfg.target());
        let envelope = Arc::new(Envelope {
            sender: cfg.from.clone(),
            recipient: cfg.to.clone(),
            run_id: self.run_id,
        });

        sink.record(ProgressEvent::Started(RunPlan {
            run_id: self.run_id,
            target: target.to_string(),
            count: cfg.count,
            concurrency: cfg.concurrency,
            rate: cfg.rate,
        }));
        info!(
            run_id = %self.run_id,
            target = %target,
            count = cfg.count,
            concurrency = cfg.concurrency,
            rate = cfg.rate,
            "Starting load run"
        );

        let gate = Arc::new(RateGate::new(cfg.rate));
        let pool = WorkerPool::new(cfg.pool_config(), gate, self.executor.clone())?;
        let reporter = ProgressReporter::new(cfg.count, cfg.progress_every);

        let mut counters = Counters::default();
        let mut latencies = LatencyRecorder::new();

        thread::scope(|scope| {
            let pool = &pool;
            let feeder = thread::Builder::new()
                .name("loadgen-feeder".into())
                .spawn_scoped(scope, move || feed(pool, cfg.count, &target, &envelope));
            if let Err(e) = feeder {
                warn!(error = %e, "Failed to spawn feeder thread");
                pool.close();
                return;
            }

            while counters.completed() < cfg.count {
                match pool.recv_outcome() {
                    Ok(outcome) => {
                        counters.record(outcome.kind());
                        latencies.record(outcome.latency);
                        reporter.observe(&counters, sink);
                    }
                    Err(PoolError::Disconnected) => {
                        warn!(received = counters.completed(), "Workers exited before the run finished");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "Unexpected pool error while collecting outcomes");
                        break;
                    }
                }
            }
        });

        pool.shutdown();

        let received = counters.completed();
        if received != cfg.count {
            return Err(LoadError::Incomplete {
                expected: cfg.count,
                received,
            });
        }

        let summary = reporter.finish(self.run_id, &counters, &latencies, sink);
        info!(
            run_id = %self.run_id,
            sent = summary.sent,
            failed = summary.failed,
            elapsed_secs = summary.elapsed_secs,
            "Load run finished"
        );
        Ok(summary)
    }
}

/// Submit jobs `1..=count`, then close intake so workers drain and exit.
///
/// A submission that finds the queue full falls back to a blocking submit and
/// is counted as a stall.
fn feed<E>(pool: &WorkerPool<E>, count: u64, target: &Arc<Target>, envelope: &Arc<Envelope>)
where
    E: SendExecutor,
{
    let mut rng = rand::rng();
    let mut stalls = 0_u64;
    for index in 1..=count {
        let job = Job {
            index,
            target: Arc::clone(target),
            envelope: Arc::clone(envelope),
            seed: rng.random(),
        };
        let submitted = match pool.try_submit(job.clone()) {
            Err(PoolError::QueueFull) => {
                stalls += 1;
                pool.submit(job)
            }
            other => other,
        };
        if let Err(e) = submitted {
            warn!(index = index, error = %e, "Stopped submitting jobs");
            break;
        }
    }
    pool.close();
    debug!(count = count, queue_full_stalls = stalls, "All jobs submitted");
}
