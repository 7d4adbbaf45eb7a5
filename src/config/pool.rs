//! Scheduler and worker pool configuration.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Upper bound applied to the default worker count.
pub const MAX_DEFAULT_WORKERS: usize = 64;

/// What `dispatch` does when the task queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMode {
    /// Block the submitting thread until the queue has room (backpressure).
    #[default]
    Blocking,
    /// Fail the dispatch with `SchedulerError::QueueFull`.
    NonBlocking,
}

impl FromStr for SubmissionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blocking" => Ok(Self::Blocking),
            "non_blocking" | "non-blocking" | "nonblocking" => Ok(Self::NonBlocking),
            other => Err(format!("unknown submission mode `{other}`")),
        }
    }
}

/// Which dispatch strategy to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerKind {
    /// Sequential dispatch on the calling thread.
    #[default]
    Basic,
    /// Parallel dispatch on a fixed-size worker pool.
    Threaded,
}

impl FromStr for SchedulerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "threaded" => Ok(Self::Threaded),
            other => Err(format!("unknown scheduler kind `{other}`")),
        }
    }
}

/// Worker pool configuration for the threaded scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Number of worker threads. Fixed for the pool's lifetime.
    pub worker_count: usize,
    /// Capacity of the task queue shared by all workers.
    pub max_queue_depth: usize,
    /// Stack size of each worker thread, in bytes.
    pub thread_stack_size: usize,
    /// Behavior when the queue is full.
    pub submission: SubmissionMode,
    /// Allow concurrent `dispatch` calls on one scheduler. When false, dispatches
    /// are serialized.
    pub allow_overlapping_dispatch: bool,
    /// How long `shutdown` waits for each worker to exit, in milliseconds.
    pub shutdown_timeout_ms: u64,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get().clamp(1, MAX_DEFAULT_WORKERS),
            max_queue_depth: 1024,
            thread_stack_size: 2 * 1024 * 1024,
            submission: SubmissionMode::Blocking,
            allow_overlapping_dispatch: false,
            shutdown_timeout_ms: 2_000,
        }
    }
}

impl WorkerPoolConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the task queue capacity.
    #[must_use]
    pub const fn with_max_queue_depth(mut self, max_queue_depth: usize) -> Self {
        self.max_queue_depth = max_queue_depth;
        self
    }

    /// Set the worker thread stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, thread_stack_size: usize) -> Self {
        self.thread_stack_size = thread_stack_size;
        self
    }

    /// Set the submission mode.
    #[must_use]
    pub const fn with_submission(mut self, submission: SubmissionMode) -> Self {
        self.submission = submission;
        self
    }

    /// Allow or forbid overlapping dispatches.
    #[must_use]
    pub const fn with_overlapping_dispatch(mut self, allow: bool) -> Self {
        self.allow_overlapping_dispatch = allow;
        self
    }

    /// Set the per-worker shutdown timeout.
    #[must_use]
    pub const fn with_shutdown_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.shutdown_timeout_ms = timeout_ms;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.max_queue_depth == 0 {
            return Err("max_queue_depth must be greater than 0".into());
        }
        if self.thread_stack_size < 64 * 1024 {
            return Err("thread_stack_size must be at least 64 KiB".into());
        }
        if self.shutdown_timeout_ms == 0 {
            return Err("shutdown_timeout_ms must be greater than 0".into());
        }
        Ok(())
    }
}

/// Root configuration: which scheduler to build and how to size its pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Dispatch strategy.
    pub kind: SchedulerKind,
    /// Pool settings; ignored by the basic scheduler.
    pub pool: WorkerPoolConfig,
}

impl SchedulerConfig {
    /// Validate the configuration. Pool settings are only checked for the
    /// threaded scheduler.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        match self.kind {
            SchedulerKind::Basic => Ok(()),
            SchedulerKind::Threaded => self.pool.validate().map_err(|e| format!("pool invalid: {e}")),
        }
    }

    /// Parse configuration from a JSON string and validate it.
    ///
    /// # Errors
    ///
    /// Returns parse or validation failures as text.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment, loading a `.env` file
    /// first if present. Unset variables keep their defaults.
    ///
    /// Reads `DISPATCH_SCHEDULER`, `DISPATCH_WORKERS`, `DISPATCH_QUEUE_DEPTH`,
    /// `DISPATCH_SUBMISSION`, `DISPATCH_ALLOW_OVERLAP` and
    /// `DISPATCH_SHUTDOWN_TIMEOUT_MS`.
    ///
    /// # Errors
    ///
    /// Returns a description of the first malformed variable or invalid value.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (used by `from_env`).
    ///
    /// # Errors
    ///
    /// Returns a description of the first malformed variable or invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(kind) = parse_var(&lookup, "DISPATCH_SCHEDULER")? {
            cfg.kind = kind;
        }
        if let Some(workers) = parse_var(&lookup, "DISPATCH_WORKERS")? {
            cfg.pool.worker_count = workers;
        }
        if let Some(depth) = parse_var(&lookup, "DISPATCH_QUEUE_DEPTH")? {
            cfg.pool.max_queue_depth = depth;
        }
        if let Some(mode) = parse_var(&lookup, "DISPATCH_SUBMISSION")? {
            cfg.pool.submission = mode;
        }
        if let Some(allow) = parse_var(&lookup, "DISPATCH_ALLOW_OVERLAP")? {
            cfg.pool.allow_overlapping_dispatch = allow;
        }
        if let Some(timeout) = parse_var(&lookup, "DISPATCH_SHUTDOWN_TIMEOUT_MS")? {
            cfg.pool.shutdown_timeout_ms = timeout;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| raw.trim().parse::<T>().map_err(|e| format!("{key}: {e}")))
        .transpose()
}
