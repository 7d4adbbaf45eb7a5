//! Error types for plugin invocation and scheduler operations.

use std::fmt;

use thiserror::Error;

/// Failure of a single plugin invocation.
///
/// These are always contained in the plugin's outcome slot; they never abort a
/// dispatch or affect sibling plugins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    /// The plugin rejected the event.
    #[error("plugin failed: {msg}")]
    Failed {
        /// Human-readable cause.
        msg: String,
    },
    /// The event carried the wrong number of arguments for the plugin.
    #[error("invalid argument count: {found} (expected {expected})")]
    InvalidArgumentCount {
        /// Arguments the plugin expects.
        expected: usize,
        /// Arguments found in the event.
        found: usize,
    },
    /// The plugin panicked; the panic was caught at the invocation boundary.
    #[error("plugin `{plugin}` panicked: {message}")]
    Panicked {
        /// Name of the plugin that panicked.
        plugin: String,
        /// Panic payload rendered as text.
        message: String,
    },
    /// One or more inner plugins of a delegating plugin failed.
    #[error(transparent)]
    Composite(#[from] CompositeError),
    /// The task was dropped before it could run (pool shut down underneath it).
    #[error("plugin `{plugin}` was abandoned before it ran")]
    Abandoned {
        /// Name of the plugin whose task was dropped.
        plugin: String,
    },
    /// The dispatch was cancelled before this plugin started.
    #[error("plugin `{plugin}` was skipped because its dispatch was cancelled")]
    Cancelled {
        /// Name of the skipped plugin.
        plugin: String,
    },
}

impl From<String> for PluginError {
    fn from(msg: String) -> Self {
        Self::Failed { msg }
    }
}

impl From<&str> for PluginError {
    fn from(msg: &str) -> Self {
        Self::Failed {
            msg: msg.to_string(),
        }
    }
}

/// A single failing inner plugin of a delegating plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerFailure {
    /// Name of the failing plugin.
    pub plugin: String,
    /// The plugin's own error. Never `PluginError::Composite`: nested composites are
    /// flattened into their parent.
    pub error: PluginError,
}

impl fmt::Display for InnerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`: {}", self.plugin, self.error)
    }
}

/// Every failure produced by the inner plugins of a delegating plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeError {
    failures: Vec<InnerFailure>,
}

impl CompositeError {
    /// Build from a non-empty list of inner failures.
    #[must_use]
    pub const fn new(failures: Vec<InnerFailure>) -> Self {
        Self { failures }
    }

    /// All inner failures, in inner-plugin order (nested composites flattened).
    #[must_use]
    pub fn failures(&self) -> &[InnerFailure] {
        &self.failures
    }

    /// Names of the failing inner plugins, in order.
    #[must_use]
    pub fn failed_plugins(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.plugin.as_str()).collect()
    }

    /// Number of failing inner plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// True if no failure was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Consume into the list of failures.
    #[must_use]
    pub fn into_failures(self) -> Vec<InnerFailure> {
        self.failures
    }
}

impl fmt::Display for CompositeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} inner plugin(s) failed: [", self.failures.len())?;
        for (idx, failure) in self.failures.iter().enumerate() {
            if idx > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{failure}")?;
        }
        write!(f, "]")
    }
}

impl std::error::Error for CompositeError {}

/// Errors that prevent a dispatch (or registration) as a whole.
///
/// Distinct from [`PluginError`]: a scheduler error means the dispatch could not be
/// attempted, not that a plugin failed.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Non-blocking submission was requested and the task queue is full.
    #[error("task queue is full")]
    QueueFull,
    /// The scheduler's worker pool has been shut down.
    #[error("worker pool has been shut down")]
    PoolShutdown,
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The registry could not grow to hold another plugin.
    #[error("registry exhausted: {0}")]
    RegistryExhausted(String),
    /// Internal failure (worker spawn failed, blocking task lost, etc.).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result of a single plugin invocation.
pub type PluginResult<R> = Result<R, PluginError>;
