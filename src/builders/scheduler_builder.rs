//! Builders to construct schedulers from registries and configuration.

use tracing::info;

use crate::config::{SchedulerConfig, SchedulerKind, WorkerPoolConfig};
use crate::core::{BasicScheduler, PluginRegistry, Scheduler, SchedulerError, ThreadedScheduler};

/// Sequential scheduler over `registry`.
#[must_use]
pub fn new_basic_scheduler<E, R>(registry: PluginRegistry<E, R>) -> BasicScheduler<E, R> {
    BasicScheduler::new(registry)
}

/// Threaded scheduler over `registry` with `worker_count` workers and default
/// pool settings otherwise.
///
/// # Errors
///
/// Returns `SchedulerError::InvalidConfig` when `worker_count` is zero and
/// `SchedulerError::Internal` if the workers cannot be started.
pub fn new_threaded_scheduler<E, R>(
    registry: PluginRegistry<E, R>,
    worker_count: usize,
) -> Result<ThreadedScheduler<E, R>, SchedulerError>
where
    E: Send + Sync + 'static,
    R: Send + 'static,
{
    ThreadedScheduler::new(registry, WorkerPoolConfig::new().with_worker_count(worker_count))
}

/// Build the scheduler selected by `cfg`.
///
/// # Errors
///
/// Returns `SchedulerError::InvalidConfig` when `cfg` fails validation, or any
/// error from starting the worker pool.
pub fn build_scheduler<E, R>(
    cfg: &SchedulerConfig,
    registry: PluginRegistry<E, R>,
) -> Result<Box<dyn Scheduler<E, R>>, SchedulerError>
where
    E: Send + Sync + 'static,
    R: Send + 'static,
{
    cfg.validate().map_err(SchedulerError::InvalidConfig)?;

    let scheduler: Box<dyn Scheduler<E, R>> = match cfg.kind {
        SchedulerKind::Basic => Box::new(BasicScheduler::new(registry)),
        SchedulerKind::Threaded => Box::new(ThreadedScheduler::new(registry, cfg.pool.clone())?),
    };
    info!(
        kind = scheduler.kind(),
        plugins = scheduler.registry().len(),
        "Scheduler built"
    );
    Ok(scheduler)
}
