//! Builders to construct schedulers from registries and configuration.

pub mod scheduler_builder;

pub use scheduler_builder::{build_scheduler, new_basic_scheduler, new_threaded_scheduler};
