//! Configuration models for schedulers and worker pools.

pub mod pool;

pub use pool::{SchedulerConfig, SchedulerKind, SubmissionMode, WorkerPoolConfig};
