//! Native implementation of `WorkerPool` using OS threads.
//!
//! Each worker thread owns a single-threaded tokio runtime and drives the send
//! executor with `block_on`, so a worker is busy for exactly one job at a time
//! and the pool size bounds the number of open connections.
//!
//! # Design Principles
//!
//! - **No polling**: workers block on channel recv; waiting for admission uses
//!   bounded sleep slices inside the rate gate
//! - **Single aggregator**: outcomes go to one receiver, never to shared counters
//! - **Clean shutdown**: dropping the sender lets workers drain and exit

use std::any::Any;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tokio::runtime::Runtime;
use tracing::{debug, error, info, trace, warn};

use crate::config::WorkerPoolConfig;
use crate::core::error::SendError;
use crate::core::executor::SendExecutor;
use crate::core::job::{Job, JobState, Outcome};
use crate::core::rate_limiter::RateGate;

use super::{PoolCounters, PoolError, PoolStats};

/// Worker pool with dedicated OS threads for blocking send jobs.
///
/// # Design
///
/// - **Bounded intake**: `submit` blocks once `max_queue_depth` jobs are waiting
/// - **Exactly one outcome per job**: executor errors and panics are turned
///   into failed outcomes at the worker boundary
/// - **Lock-free stats**: atomic counters, snapshot on demand
pub struct WorkerPool<E>
where
    E: SendExecutor,
{
    /// Pool configuration.
    config: WorkerPoolConfig,

    /// Job sender (to workers). Option allows closing intake by dropping.
    job_tx: Mutex<Option<Sender<Job>>>,

    /// Outcome receiver. Only workers hold senders, so it disconnects once
    /// every worker has exited.
    outcome_rx: Receiver<Outcome>,

    /// Pool statistics counters (lock-free atomics).
    counters: Arc<PoolCounters>,

    /// Shutdown flag (lock-free atomic).
    shutdown: Arc<AtomicBool>,

    /// Worker thread handles.
    workers: Mutex<Vec<JoinHandle<()>>>,

    _executor: PhantomData<E>,
}

impl<E> WorkerPool<E>
where
    E: SendExecutor,
{
    /// Create a new worker pool that paces every job through `gate`.
    ///
    /// This spawns `config.worker_count` OS threads, each with its own
    /// single-threaded tokio runtime for driving `executor`.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidConfig` if the configuration is invalid, or
    /// `PoolError::Internal` if a worker thread cannot be spawned.
    pub fn new(config: WorkerPoolConfig, gate: Arc<RateGate>, executor: E) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let (job_tx, job_rx) = bounded::<Job>(config.max_queue_depth);
        let (outcome_tx, outcome_rx) = unbounded::<Outcome>();
        let counters = Arc::new(PoolCounters::default());
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            let context = WorkerContext {
                worker_id,
                job_rx: job_rx.clone(),
                outcome_tx: outcome_tx.clone(),
                gate: Arc::clone(&gate),
                counters: Arc::clone(&counters),
                shutdown: Arc::clone(&shutdown),
                executor: executor.clone(),
            };
            match spawn_worker(context, config.thread_stack_size) {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // Let the workers already started exit on their own.
                    shutdown.store(true, Ordering::Release);
                    return Err(PoolError::Internal(format!(
                        "failed to spawn worker {worker_id}: {e}"
                    )));
                }
            }
        }

        info!(
            worker_count = config.worker_count,
            max_queue_depth = config.max_queue_depth,
            min_interval_us = u64::try_from(gate.min_interval().as_micros()).unwrap_or(u64::MAX),
            "WorkerPool initialized with dedicated OS threads"
        );

        Ok(Self {
            config,
            job_tx: Mutex::new(Some(job_tx)),
            outcome_rx,
            counters,
            shutdown,
            workers: Mutex::new(workers),
            _executor: PhantomData,
        })
    }

    /// Submit a job, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// `PoolError::PoolShutdown` if intake has been closed or every worker has
    /// exited.
    pub fn submit(&self, job: Job) -> Result<(), PoolError> {
        let job_tx = self.sender()?;
        let index = job.index;

        self.counters.queued_jobs.fetch_add(1, Ordering::Relaxed);
        if job_tx.send(job).is_err() {
            self.counters.queued_jobs.fetch_sub(1, Ordering::Relaxed);
            return Err(PoolError::PoolShutdown);
        }
        self.counters.submitted_jobs.fetch_add(1, Ordering::Relaxed);
        trace!(index = index, state = %JobState::Queued, "Job submitted to worker pool");
        Ok(())
    }

    /// Submit a job without blocking.
    ///
    /// # Errors
    ///
    /// - `PoolError::QueueFull` if the queue is at `max_queue_depth`
    /// - `PoolError::PoolShutdown` if intake has been closed
    pub fn try_submit(&self, job: Job) -> Result<(), PoolError> {
        let job_tx = self.sender()?;

        self.counters.queued_jobs.fetch_add(1, Ordering::Relaxed);
        match job_tx.try_send(job) {
            Ok(()) => {
                self.counters.submitted_jobs.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.counters.queued_jobs.fetch_sub(1, Ordering::Relaxed);
                trace!("Worker pool queue is full");
                Err(PoolError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => {
                self.counters.queued_jobs.fetch_sub(1, Ordering::Relaxed);
                Err(PoolError::PoolShutdown)
            }
        }
    }

    /// Wait for the next outcome.
    ///
    /// # Errors
    ///
    /// `PoolError::Disconnected` once every worker has exited and all
    /// outcomes have been received.
    pub fn recv_outcome(&self) -> Result<Outcome, PoolError> {
        self.outcome_rx.recv().map_err(|_| PoolError::Disconnected)
    }

    /// Stop accepting jobs. Workers finish everything already queued, then exit.
    pub fn close(&self) {
        let mut job_tx = self.job_tx.lock();
        if job_tx.take().is_some() {
            debug!("Worker pool intake closed");
        }
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.config.worker_count)
    }

    /// Shut down the pool gracefully with timeout.
    ///
    /// Queued jobs that no worker has picked up yet are abandoned. Each worker
    /// gets up to 2 seconds to finish its current job; workers that don't exit
    /// in time are detached.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        info!("Shutting down worker pool");
        self.close();

        let mut workers = self.workers.lock();
        let worker_count = workers.len();

        for (idx, worker) in workers.drain(..).enumerate() {
            let (tx, rx) = std::sync::mpsc::channel();
            let join_thread = thread::spawn(move || {
                let result = worker.join();
                let _ = tx.send(result.is_ok());
            });

            match rx.recv_timeout(Duration::from_secs(2)) {
                Ok(true) => debug!(worker_id = idx, "Worker joined successfully"),
                Ok(false) => warn!(worker_id = idx, "Worker panicked"),
                Err(_) => {
                    warn!(worker_id = idx, "Worker did not exit within timeout - detaching");
                    continue;
                }
            }
            let _ = join_thread.join();
        }

        info!(worker_count = worker_count, "Worker pool shut down complete");
    }

    fn sender(&self) -> Result<Sender<Job>, PoolError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(PoolError::PoolShutdown);
        }
        // Clone out of the lock so a blocking send never holds it.
        self.job_tx.lock().clone().ok_or(PoolError::PoolShutdown)
    }
}

impl<E> Drop for WorkerPool<E>
where
    E: SendExecutor,
{
    fn drop(&mut self) {
        // Signal shutdown but don't join: a worker may be inside a long send.
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            self.job_tx.lock().take();
            debug!("WorkerPool dropped without explicit shutdown - workers will be detached");
        }
    }
}

/// Everything a worker thread owns.
struct WorkerContext<E> {
    worker_id: usize,
    job_rx: Receiver<Job>,
    outcome_tx: Sender<Outcome>,
    gate: Arc<RateGate>,
    counters: Arc<PoolCounters>,
    shutdown: Arc<AtomicBool>,
    executor: E,
}

/// Spawn a worker thread.
fn spawn_worker<E>(context: WorkerContext<E>, stack_size: usize) -> std::io::Result<JoinHandle<()>>
where
    E: SendExecutor,
{
    thread::Builder::new()
        .name(format!("loadgen-worker-{}", context.worker_id))
        .stack_size(stack_size)
        .spawn(move || worker_loop(&context))
}

fn worker_loop<E>(ctx: &WorkerContext<E>)
where
    E: SendExecutor,
{
    let worker_id = ctx.worker_id;
    debug!(worker_id = worker_id, "Worker thread started");

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(worker_id = worker_id, error = %e, "Failed to create worker runtime");
            return;
        }
    };

    // recv() fails once the sender is dropped and the queue is drained.
    while let Ok(job) = ctx.job_rx.recv() {
        if ctx.shutdown.load(Ordering::Acquire) {
            debug!(worker_id = worker_id, "Worker shutdown requested, exiting");
            break;
        }
        ctx.counters.queued_jobs.fetch_sub(1, Ordering::Relaxed);

        let waited = ctx.gate.admit();
        ctx.counters.active_jobs.fetch_add(1, Ordering::Relaxed);
        trace!(
            worker_id = worker_id,
            index = job.index,
            waited_us = u64::try_from(waited.as_micros()).unwrap_or(u64::MAX),
            state = %JobState::Admitted,
            "Job admitted"
        );

        let outcome = execute_job(&rt, &ctx.executor, &job, worker_id);

        ctx.counters.active_jobs.fetch_sub(1, Ordering::Relaxed);
        if outcome.is_success() {
            ctx.counters.completed_jobs.fetch_add(1, Ordering::Relaxed);
        } else {
            ctx.counters.failed_jobs.fetch_add(1, Ordering::Relaxed);
        }

        if ctx.outcome_tx.send(outcome).is_err() {
            debug!(worker_id = worker_id, "Outcome receiver gone, exiting");
            break;
        }
    }

    debug!(worker_id = worker_id, "Worker thread exiting");
}

/// Run one job to a terminal outcome. Never unwinds.
fn execute_job<E>(rt: &Runtime, executor: &E, job: &Job, worker_id: usize) -> Outcome
where
    E: SendExecutor,
{
    trace!(worker_id = worker_id, index = job.index, state = %JobState::Executing, "Sending");
    let started = Instant::now();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let payload = job.payload();
        rt.block_on(executor.send(&job.target, &payload))
    }));
    let error = match result {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e),
        Err(panic) => Some(SendError::Internal(panic_message(panic.as_ref()))),
    };

    let latency = started.elapsed();
    match &error {
        None => trace!(
            worker_id = worker_id,
            index = job.index,
            state = %JobState::Completed,
            "Send succeeded"
        ),
        Some(e) => debug!(
            worker_id = worker_id,
            index = job.index,
            kind = %e.kind(),
            error = %e,
            state = %JobState::Completed,
            "Send failed"
        ),
    }

    Outcome {
        index: job.index,
        error,
        latency,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "executor panicked".to_string()
    }
}
