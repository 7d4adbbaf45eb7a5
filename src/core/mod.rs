//! Plugin contract, registries, and the dispatch strategies.

pub mod delegating;
pub mod error;
pub mod outcome;
pub mod plugin;
pub mod pump;
pub mod registry;
pub mod scheduler;
pub mod threaded;
pub mod worker_pool;

pub use delegating::{Concat, DelegatingPlugin, DelegatingPluginBuilder, Reducer};
pub use error::{CompositeError, InnerFailure, PluginError, PluginResult, SchedulerError};
pub use outcome::DispatchOutcome;
pub use plugin::{invoke, plugin_name, FnPlugin, Plugin, PluginId, PluginInfo, UNKNOWN_PLUGIN};
pub use pump::pump;
pub use registry::{PluginRegistry, SharedPlugin};
pub use scheduler::{BasicScheduler, Scheduler};
pub use threaded::ThreadedScheduler;
pub use worker_pool::{PoolStats, WorkerPool};
