//! # Prometheus Plugin Dispatch
//!
//! A small event-dispatch core for bot-style applications: a fixed, ordered set of
//! plugins receives every incoming event, and each plugin's response (or failure)
//! comes back in a per-dispatch outcome.
//!
//! ## Core Pieces
//!
//! - **Plugin**: anything implementing [`core::Plugin`]: handle one event, return
//!   a response or a [`core::PluginError`]. Panics are caught and reported as
//!   failures of that plugin only.
//! - **Delegating plugin**: a composite that forwards each event to inner plugins
//!   and reduces their responses into one. Composites nest freely.
//! - **Registry**: an ordered list of plugins, frozen once a scheduler owns it.
//! - **Schedulers**: the sequential [`core::BasicScheduler`] and the parallel
//!   [`core::ThreadedScheduler`], which fans invocations out to a fixed-size
//!   worker pool with a bounded queue and waits on a per-dispatch barrier.
//!
//! Both schedulers return a [`core::DispatchOutcome`] with exactly one slot per
//! registered plugin, in registration order.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use prometheus_plugin_dispatch::builders::new_threaded_scheduler;
//! use prometheus_plugin_dispatch::core::{FnPlugin, PluginRegistry, PluginResult, Scheduler};
//!
//! let mut registry = PluginRegistry::new();
//! registry.register(FnPlugin::new("upper", |s: &String| -> PluginResult<String> {
//!     Ok(s.to_uppercase())
//! }))?;
//! registry.register(FnPlugin::new("len", |s: &String| -> PluginResult<String> {
//!     Ok(s.len().to_string())
//! }))?;
//!
//! let scheduler = new_threaded_scheduler(registry, 2)?;
//! let outcome = scheduler.dispatch(Arc::new("hello".to_string()))?;
//! assert_eq!(outcome[0], Ok("HELLO".to_string()));
//! assert_eq!(outcome[1], Ok("5".to_string()));
//! scheduler.shutdown();
//! # Ok::<(), prometheus_plugin_dispatch::core::SchedulerError>(())
//! ```
//!
//! ## Configuration
//!
//! [`config::SchedulerConfig`] selects the strategy and sizes the pool. It can be
//! parsed from JSON or read from `DISPATCH_*` environment variables, and
//! [`builders::build_scheduler`] turns it into a boxed scheduler.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Builders to construct schedulers from registries and configuration.
pub mod builders;
/// Configuration models for schedulers and worker pools.
pub mod config;
/// Plugin contract, registries, and dispatch strategies.
pub mod core;
/// Shared utilities.
pub mod util;
