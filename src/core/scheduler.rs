//! Scheduler abstraction and the sequential (basic) strategy.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::core::error::SchedulerError;
use crate::core::outcome::DispatchOutcome;
use crate::core::plugin::invoke;
use crate::core::registry::PluginRegistry;

/// Delivers one event to every registered plugin and collects one result per plugin.
///
/// Implementations own a frozen [`PluginRegistry`]. The returned outcome always
/// has exactly `registry().len()` slots, in registration order, no matter how many
/// plugins fail. `Err` is reserved for scheduler-level failures where the dispatch
/// could not be attempted at all.
pub trait Scheduler<E, R>: Send + Sync {
    /// Dispatch `event` to every plugin.
    ///
    /// # Errors
    ///
    /// Returns a [`SchedulerError`] only when the dispatch as a whole could not
    /// be attempted (pool shut down, queue full under non-blocking submission).
    fn dispatch(&self, event: Arc<E>) -> Result<DispatchOutcome<R>, SchedulerError>;

    /// The registry this scheduler dispatches to.
    fn registry(&self) -> &PluginRegistry<E, R>;

    /// Short strategy name for logs.
    fn kind(&self) -> &'static str;
}

/// Sequential scheduler: invokes plugins one after another on the calling thread.
///
/// Plugin `i + 1` starts only after plugin `i` returned, so side effects are
/// strictly ordered. Wall time is the sum of all plugins' handling times.
pub struct BasicScheduler<E, R> {
    registry: Arc<PluginRegistry<E, R>>,
}

impl<E, R> BasicScheduler<E, R> {
    /// Freeze `registry` behind a basic scheduler.
    #[must_use]
    pub fn new(registry: PluginRegistry<E, R>) -> Self {
        debug!(plugins = registry.len(), "Basic scheduler created");
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Dispatch without the `Arc` wrapper; the basic scheduler never shares the
    /// event across threads.
    #[must_use]
    pub fn dispatch_ref(&self, event: &E) -> DispatchOutcome<R> {
        let results: Vec<_> = self
            .registry
            .plugins()
            .iter()
            .map(|plugin| invoke(plugin.as_ref(), event))
            .collect();
        let outcome = DispatchOutcome::from_results(results);
        trace!(
            plugins = outcome.len(),
            failed = outcome.failure_count(),
            "Basic dispatch complete"
        );
        outcome
    }
}

impl<E, R> Scheduler<E, R> for BasicScheduler<E, R> {
    fn dispatch(&self, event: Arc<E>) -> Result<DispatchOutcome<R>, SchedulerError> {
        Ok(self.dispatch_ref(&event))
    }

    fn registry(&self) -> &PluginRegistry<E, R> {
        &self.registry
    }

    fn kind(&self) -> &'static str {
        "basic"
    }
}
