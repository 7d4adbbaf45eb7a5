//! Fixed-size worker pool backing the threaded scheduler.
//!
//! Workers are dedicated OS threads pulling plugin invocations from one bounded
//! queue. Every task carries a [`SlotReporter`] that delivers exactly one result
//! to its dispatch's completion barrier: the plugin's result when the task runs,
//! `Cancelled` when its dispatch was cancelled before it started, or `Abandoned`
//! when the task is dropped without running.

mod native;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use uuid::Uuid;

use crate::core::error::{PluginError, PluginResult};
use crate::core::plugin::{plugin_name, PluginId};
use crate::core::registry::SharedPlugin;

pub use native::WorkerPool;

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Currently executing plugin invocations.
    pub active_tasks: u64,
    /// Tasks waiting in the queue.
    pub queued_tasks: u64,
    /// Total tasks submitted.
    pub submitted_tasks: u64,
    /// Total invocations that ran to completion (successful or not).
    pub completed_tasks: u64,
    /// Invocations that returned an error (panics included).
    pub failed_tasks: u64,
    /// Invocations that panicked.
    pub panicked_tasks: u64,
    /// Tasks skipped because their dispatch was cancelled.
    pub cancelled_tasks: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_tasks: AtomicU64,
    pub queued_tasks: AtomicU64,
    pub submitted_tasks: AtomicU64,
    pub completed_tasks: AtomicU64,
    pub failed_tasks: AtomicU64,
    pub panicked_tasks: AtomicU64,
    pub cancelled_tasks: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            active_tasks: self.active_tasks.load(Ordering::Relaxed),
            queued_tasks: self.queued_tasks.load(Ordering::Relaxed),
            submitted_tasks: self.submitted_tasks.load(Ordering::Relaxed),
            completed_tasks: self.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.failed_tasks.load(Ordering::Relaxed),
            panicked_tasks: self.panicked_tasks.load(Ordering::Relaxed),
            cancelled_tasks: self.cancelled_tasks.load(Ordering::Relaxed),
        }
    }
}

/// State shared by every task of one dispatch.
#[derive(Debug)]
pub(crate) struct DispatchState {
    pub id: Uuid,
    cancelled: AtomicBool,
}

impl DispatchState {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Stop not-yet-started tasks of this dispatch. Running invocations finish.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Result message delivered to a dispatch's completion barrier.
pub(crate) type SlotResult<R> = (usize, PluginResult<R>);

/// Delivers exactly one result for one outcome slot.
///
/// Dropping a reporter that never reported sends `PluginError::Abandoned`, so a
/// dispatch barrier can never wait on a task that will not run.
pub(crate) struct SlotReporter<E, R> {
    slot: PluginId,
    plugin: SharedPlugin<E, R>,
    tx: Sender<SlotResult<R>>,
    reported: bool,
}

impl<E, R> SlotReporter<E, R> {
    pub fn new(slot: PluginId, plugin: SharedPlugin<E, R>, tx: Sender<SlotResult<R>>) -> Self {
        Self {
            slot,
            plugin,
            tx,
            reported: false,
        }
    }

    pub const fn slot(&self) -> PluginId {
        self.slot
    }

    pub fn plugin(&self) -> &SharedPlugin<E, R> {
        &self.plugin
    }

    /// Deliver the slot's result. A closed barrier (dispatch gave up) is ignored.
    pub fn report(mut self, result: PluginResult<R>) {
        self.reported = true;
        let _ = self.tx.send((self.slot.index(), result));
    }
}

impl<E, R> Drop for SlotReporter<E, R> {
    fn drop(&mut self) {
        if !self.reported {
            let plugin = plugin_name::<E, R, _>(self.plugin.as_ref());
            let _ = self
                .tx
                .send((self.slot.index(), Err(PluginError::Abandoned { plugin })));
        }
    }
}

/// One plugin invocation queued on the pool.
pub(crate) struct WorkerTask<E, R> {
    pub event: Arc<E>,
    pub dispatch: Arc<DispatchState>,
    pub reporter: SlotReporter<E, R>,
}
