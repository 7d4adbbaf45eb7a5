//! Threaded scheduler: parallel dispatch on a fixed-size worker pool.
//!
//! Each dispatch submits one task per plugin to the pool's bounded queue and
//! then waits on a dispatch-scoped completion barrier: a channel with one slot
//! per plugin. Workers finish out of order, so every result carries its slot
//! index (the plugin's registration index) and is placed there, never appended.
//! The outcome buffer itself is owned by the dispatching thread; only the
//! completion channel is shared.

use std::sync::Arc;

use crossbeam_channel::bounded;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::WorkerPoolConfig;
use crate::core::error::{PluginError, PluginResult, SchedulerError};
use crate::core::outcome::DispatchOutcome;
use crate::core::plugin::{plugin_name, PluginId};
use crate::core::registry::PluginRegistry;
use crate::core::scheduler::Scheduler;
use crate::core::worker_pool::{
    DispatchState, PoolStats, SlotReporter, SlotResult, WorkerPool, WorkerTask,
};

/// Shared dispatch machinery; cloned into blocking tasks by `dispatch_async`.
struct Dispatcher<E, R> {
    registry: Arc<PluginRegistry<E, R>>,
    pool: Arc<WorkerPool<E, R>>,
    /// Serializes dispatches unless overlapping dispatch is enabled.
    gate: Arc<Mutex<()>>,
    allow_overlap: bool,
}

impl<E, R> Clone for Dispatcher<E, R> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            pool: Arc::clone(&self.pool),
            gate: Arc::clone(&self.gate),
            allow_overlap: self.allow_overlap,
        }
    }
}

impl<E, R> Dispatcher<E, R>
where
    E: Send + Sync + 'static,
    R: Send + 'static,
{
    fn run(&self, event: Arc<E>) -> Result<DispatchOutcome<R>, SchedulerError> {
        let _serialized = (!self.allow_overlap).then(|| self.gate.lock());

        let plugins = self.registry.plugins();
        let count = plugins.len();
        let tx = self.pool.sender()?;
        let dispatch = Arc::new(DispatchState::new());
        let (slot_tx, slot_rx) = bounded::<SlotResult<R>>(count.max(1));

        debug!(dispatch_id = %dispatch.id, plugins = count, "Threaded dispatch started");

        for (idx, plugin) in plugins.iter().enumerate() {
            let task = WorkerTask {
                event: Arc::clone(&event),
                dispatch: Arc::clone(&dispatch),
                reporter: SlotReporter::new(PluginId(idx), Arc::clone(plugin), slot_tx.clone()),
            };
            if let Err(e) = self.pool.submit(&tx, task) {
                // Tasks already queued for this dispatch are skipped; running ones finish.
                dispatch.cancel();
                warn!(
                    dispatch_id = %dispatch.id,
                    submitted = idx,
                    plugins = count,
                    error = %e,
                    "Dispatch aborted during submission"
                );
                return Err(e);
            }
        }
        drop(tx);
        drop(slot_tx);

        let mut slots: Vec<Option<PluginResult<R>>> = std::iter::repeat_with(|| None).take(count).collect();
        // Each reporter sends exactly once, so this ends after `count` messages.
        for (slot, result) in slot_rx.iter().take(count) {
            slots[slot] = Some(result);
        }

        let results: Vec<PluginResult<R>> = slots
            .into_iter()
            .zip(plugins)
            .map(|(slot, plugin)| {
                slot.unwrap_or_else(|| {
                    Err(PluginError::Abandoned {
                        plugin: plugin_name::<E, R, _>(plugin.as_ref()),
                    })
                })
            })
            .collect();
        let outcome = DispatchOutcome::from_results(results);

        debug!(
            dispatch_id = %dispatch.id,
            plugins = count,
            failed = outcome.failure_count(),
            "Threaded dispatch complete"
        );
        Ok(outcome)
    }
}

/// Parallel scheduler backed by a fixed-size [`WorkerPool`].
///
/// Wall time of a dispatch is roughly the plugins' handling time spread over
/// `ceil(N / W)` waves plus per-task submission overhead. `dispatch` blocks the
/// caller until every plugin reported; `dispatch_async` suspends instead.
pub struct ThreadedScheduler<E, R> {
    inner: Dispatcher<E, R>,
    config: WorkerPoolConfig,
}

impl<E, R> ThreadedScheduler<E, R>
where
    E: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Freeze `registry` and start a worker pool sized by `config`.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` for an invalid configuration and
    /// `SchedulerError::Internal` if worker threads cannot be spawned.
    pub fn new(registry: PluginRegistry<E, R>, config: WorkerPoolConfig) -> Result<Self, SchedulerError> {
        let pool = WorkerPool::new(config.clone())?;
        debug!(
            plugins = registry.len(),
            workers = config.worker_count,
            overlap = config.allow_overlapping_dispatch,
            "Threaded scheduler created"
        );
        Ok(Self {
            inner: Dispatcher {
                registry: Arc::new(registry),
                pool: Arc::new(pool),
                gate: Arc::new(Mutex::new(())),
                allow_overlap: config.allow_overlapping_dispatch,
            },
            config,
        })
    }

    /// Dispatch without blocking the async runtime: the barrier wait runs on
    /// tokio's blocking thread pool.
    ///
    /// # Errors
    ///
    /// Same as [`Scheduler::dispatch`], plus `SchedulerError::Internal` if the
    /// blocking task itself failed.
    #[cfg(feature = "tokio-runtime")]
    pub async fn dispatch_async(&self, event: Arc<E>) -> Result<DispatchOutcome<R>, SchedulerError> {
        let dispatcher = self.inner.clone();
        tokio::task::spawn_blocking(move || dispatcher.run(event))
            .await
            .map_err(|e| SchedulerError::Internal(format!("dispatch task failed: {e}")))?
    }

    /// Pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.inner.pool.stats()
    }

    /// Number of worker threads.
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.config.worker_count
    }

    /// Pool configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    /// Stop accepting dispatches, drain queued tasks, and join the workers.
    ///
    /// Later dispatches fail with `SchedulerError::PoolShutdown`.
    pub fn shutdown(&self) {
        self.inner.pool.shutdown();
    }
}

impl<E, R> Scheduler<E, R> for ThreadedScheduler<E, R>
where
    E: Send + Sync + 'static,
    R: Send + 'static,
{
    fn dispatch(&self, event: Arc<E>) -> Result<DispatchOutcome<R>, SchedulerError> {
        self.inner.run(event)
    }

    fn registry(&self) -> &PluginRegistry<E, R> {
        &self.inner.registry
    }

    fn kind(&self) -> &'static str {
        "threaded"
    }
}
