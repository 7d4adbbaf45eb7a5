//! Native `WorkerPool` using dedicated OS threads.
//!
//! # Design Principles
//!
//! - **No polling**: workers block on the bounded queue's `recv`
//! - **Backpressure**: blocking submission waits for queue room instead of growing
//! - **Clean shutdown**: dropping the sender lets workers drain the queue and exit

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::{SubmissionMode, WorkerPoolConfig};
use crate::core::error::{PluginError, SchedulerError};
use crate::core::plugin::{invoke, plugin_name};

use super::{PoolCounters, PoolStats, WorkerTask};

/// Fixed-size pool of worker threads executing plugin invocations.
///
/// Owned by exactly one threaded scheduler. Size and queue capacity are fixed
/// at construction.
pub struct WorkerPool<E, R> {
    /// Pool configuration.
    config: WorkerPoolConfig,

    /// Task sender (to workers). Option allows clean shutdown by dropping.
    task_tx: Mutex<Option<Sender<WorkerTask<E, R>>>>,

    /// Pool statistics counters (lock-free atomics).
    counters: Arc<PoolCounters>,

    /// Shutdown flag (lock-free atomic).
    shutdown: AtomicBool,

    /// Worker thread handles.
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl<E, R> WorkerPool<E, R>
where
    E: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Create a pool and spawn `config.worker_count` worker threads.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::InvalidConfig` if the configuration is invalid
    /// - `SchedulerError::Internal` if a worker thread cannot be spawned
    pub fn new(config: WorkerPoolConfig) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;

        let (task_tx, task_rx) = bounded::<WorkerTask<E, R>>(config.max_queue_depth);
        let counters = Arc::new(PoolCounters::default());

        let pool = Self {
            config,
            task_tx: Mutex::new(Some(task_tx)),
            counters,
            shutdown: AtomicBool::new(false),
            workers: Mutex::new(Vec::new()),
        };

        for worker_id in 0..pool.config.worker_count {
            match spawn_worker(
                worker_id,
                task_rx.clone(),
                Arc::clone(&pool.counters),
                pool.config.thread_stack_size,
            ) {
                Ok(handle) => pool.workers.lock().push(handle),
                Err(e) => {
                    error!(worker_id = worker_id, error = %e, "Failed to spawn worker thread");
                    pool.shutdown();
                    return Err(SchedulerError::Internal(format!(
                        "failed to spawn worker {worker_id}: {e}"
                    )));
                }
            }
        }

        info!(
            worker_count = pool.config.worker_count,
            max_queue_depth = pool.config.max_queue_depth,
            submission = ?pool.config.submission,
            "WorkerPool initialized with dedicated OS threads"
        );

        Ok(pool)
    }

    /// Clone the task sender for one dispatch's submissions.
    ///
    /// The lock is held only for the clone, so a submitter blocked on
    /// backpressure never blocks `shutdown` or other dispatches.
    pub(crate) fn sender(&self) -> Result<Sender<WorkerTask<E, R>>, SchedulerError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(SchedulerError::PoolShutdown);
        }
        self.task_tx
            .lock()
            .as_ref()
            .cloned()
            .ok_or(SchedulerError::PoolShutdown)
    }

    /// Enqueue one task through `tx` according to the configured submission mode.
    ///
    /// On failure the task is dropped, which reports `Abandoned` to its slot.
    pub(crate) fn submit(
        &self,
        tx: &Sender<WorkerTask<E, R>>,
        task: WorkerTask<E, R>,
    ) -> Result<(), SchedulerError> {
        // Count before sending so a fast worker never decrements below zero.
        self.counters.queued_tasks.fetch_add(1, Ordering::Relaxed);
        let sent = match self.config.submission {
            SubmissionMode::Blocking => tx.send(task).map_err(|_| SchedulerError::PoolShutdown),
            SubmissionMode::NonBlocking => match tx.try_send(task) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(_)) => {
                    warn!("Worker pool queue is full");
                    Err(SchedulerError::QueueFull)
                }
                Err(TrySendError::Disconnected(_)) => Err(SchedulerError::PoolShutdown),
            },
        };
        match sent {
            Ok(()) => {
                self.counters.submitted_tasks.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                self.counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.config.worker_count)
    }

    /// Number of worker threads.
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.config.worker_count
    }

    /// True once `shutdown` has been called or the pool was dropped.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Shut down the pool gracefully.
    ///
    /// Drops the task sender so workers drain already-queued tasks and exit,
    /// then joins every worker, waiting at most `shutdown_timeout_ms` for each.
    /// Workers that do not exit in time are detached.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        info!("Shutting down worker pool");

        {
            let mut task_tx = self.task_tx.lock();
            *task_tx = None;
        }

        let timeout = Duration::from_millis(self.config.shutdown_timeout_ms);
        let mut workers = self.workers.lock();
        let worker_count = workers.len();

        for (idx, worker) in workers.drain(..).enumerate() {
            let (tx, rx) = std::sync::mpsc::channel();
            let joiner = thread::spawn(move || {
                let _ = tx.send(worker.join().is_ok());
            });

            match rx.recv_timeout(timeout) {
                Ok(true) => debug!(worker_id = idx, "Worker joined successfully"),
                Ok(false) => warn!(worker_id = idx, "Worker panicked"),
                Err(_) => {
                    warn!(worker_id = idx, "Worker did not exit within timeout - detaching");
                    continue;
                }
            }
            let _ = joiner.join();
        }

        info!(worker_count = worker_count, "Worker pool shut down complete");
    }
}

impl<E, R> Drop for WorkerPool<E, R> {
    fn drop(&mut self) {
        // Signal workers but do not join: explicit shutdown() is the graceful path.
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            let mut task_tx = self.task_tx.lock();
            *task_tx = None;
            debug!("WorkerPool dropped without explicit shutdown - workers will be detached");
        }
    }
}

/// Spawn a worker thread.
fn spawn_worker<E, R>(
    worker_id: usize,
    task_rx: Receiver<WorkerTask<E, R>>,
    counters: Arc<PoolCounters>,
    stack_size: usize,
) -> io::Result<JoinHandle<()>>
where
    E: Send + Sync + 'static,
    R: Send + 'static,
{
    thread::Builder::new()
        .name(format!("dispatch-worker-{worker_id}"))
        .stack_size(stack_size)
        .spawn(move || {
            debug!(worker_id = worker_id, "Worker thread started");

            // Returns Err once every sender is gone and the queue is empty.
            while let Ok(task) = task_rx.recv() {
                counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);
                run_task(worker_id, task, &counters);
            }

            debug!(worker_id = worker_id, "Worker thread exiting");
        })
}

fn run_task<E, R>(worker_id: usize, task: WorkerTask<E, R>, counters: &PoolCounters) {
    let WorkerTask {
        event,
        dispatch,
        reporter,
    } = task;
    let slot = reporter.slot();

    if dispatch.is_cancelled() {
        counters.cancelled_tasks.fetch_add(1, Ordering::Relaxed);
        let plugin = plugin_name::<E, R, _>(reporter.plugin().as_ref());
        debug!(worker_id = worker_id, dispatch_id = %dispatch.id, plugin_id = %slot, "Skipping task of cancelled dispatch");
        reporter.report(Err(PluginError::Cancelled { plugin }));
        return;
    }

    counters.active_tasks.fetch_add(1, Ordering::Relaxed);
    debug!(worker_id = worker_id, dispatch_id = %dispatch.id, plugin_id = %slot, "Worker executing plugin");

    let result = invoke(reporter.plugin().as_ref(), event.as_ref());

    match &result {
        Ok(_) => {}
        Err(PluginError::Panicked { .. }) => {
            counters.failed_tasks.fetch_add(1, Ordering::Relaxed);
            counters.panicked_tasks.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            counters.failed_tasks.fetch_add(1, Ordering::Relaxed);
            debug!(worker_id = worker_id, dispatch_id = %dispatch.id, plugin_id = %slot, error = %e, "Plugin returned an error");
        }
    }

    // Counters settle before the barrier sees the result.
    counters.active_tasks.fetch_sub(1, Ordering::Relaxed);
    counters.completed_tasks.fetch_add(1, Ordering::Relaxed);

    reporter.report(result);
}
