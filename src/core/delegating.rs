//! Delegating (composite) plugin: several plugins presented as one.
//!
//! A [`DelegatingPlugin`] forwards each event to its inner plugins in order, on
//! the calling thread, and folds their responses with a [`Reducer`]. Failures
//! never stop the remaining inner plugins; the composite reports every failing
//! inner plugin at once. Nested composites are flattened when reporting
//! failures, so nesting one delegating plugin inside another yields the same
//! failure set as a single flat delegating plugin over the same leaves.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::debug;

use crate::core::error::{CompositeError, InnerFailure, PluginError, PluginResult};
use crate::core::plugin::{invoke, plugin_name, Plugin, PluginInfo};
use crate::core::registry::{PluginRegistry, SharedPlugin};

/// Folds the successful inner responses of a delegating plugin into one.
///
/// For nesting to be equivalent to flattening, the reducer must be associative:
/// `reduce([reduce([a, b]), c]) == reduce([a, reduce([b, c])]) == reduce([a, b, c])`.
/// Closures `Fn(Vec<R>) -> R` are reducers too.
pub trait Reducer<R>: Send + Sync {
    /// Combine responses, given in inner-plugin order.
    fn reduce(&self, responses: Vec<R>) -> R;
}

impl<R, F> Reducer<R> for F
where
    F: Fn(Vec<R>) -> R + Send + Sync,
{
    fn reduce(&self, responses: Vec<R>) -> R {
        self(responses)
    }
}

/// Concatenates list responses, keeping inner-plugin order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Concat;

impl<T> Reducer<Vec<T>> for Concat {
    fn reduce(&self, responses: Vec<Vec<T>>) -> Vec<T> {
        responses.into_iter().flatten().collect()
    }
}

/// A plugin that forwards every event to an ordered list of inner plugins.
pub struct DelegatingPlugin<E, R> {
    info: PluginInfo,
    inner: Vec<SharedPlugin<E, R>>,
    reducer: Arc<dyn Reducer<R>>,
}

impl<E, R> DelegatingPlugin<E, R> {
    /// Start building a delegating plugin named `name` that folds with `reducer`.
    pub fn builder(
        name: impl Into<String>,
        reducer: impl Reducer<R> + 'static,
    ) -> DelegatingPluginBuilder<E, R> {
        DelegatingPluginBuilder {
            info: PluginInfo::new(name, env!("CARGO_PKG_VERSION")),
            inner: Vec::new(),
            reducer: Arc::new(reducer),
        }
    }

    /// Turn a whole registry into a single plugin.
    pub fn from_registry(
        info: PluginInfo,
        registry: PluginRegistry<E, R>,
        reducer: impl Reducer<R> + 'static,
    ) -> Self {
        let inner = registry.into_plugins();
        let info = merge_commands(info, &inner);
        Self {
            info,
            inner,
            reducer: Arc::new(reducer),
        }
    }

    /// Number of inner plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True if there are no inner plugins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Inner plugins in delegation order.
    #[must_use]
    pub fn inner(&self) -> &[SharedPlugin<E, R>] {
        &self.inner
    }
}

impl<E, T> DelegatingPlugin<E, Vec<T>> {
    /// Builder for list responses, concatenated in inner-plugin order.
    pub fn concat(name: impl Into<String>) -> DelegatingPluginBuilder<E, Vec<T>> {
        Self::builder(name, Concat)
    }
}

impl<E, R> Plugin<E, R> for DelegatingPlugin<E, R> {
    fn handle(&self, event: &E) -> PluginResult<R> {
        let mut responses = Vec::with_capacity(self.inner.len());
        let mut failures = Vec::new();

        for plugin in &self.inner {
            match invoke(plugin.as_ref(), event) {
                Ok(response) => responses.push(response),
                Err(PluginError::Composite(nested)) => failures.extend(nested.into_failures()),
                Err(error) => failures.push(InnerFailure {
                    plugin: plugin_name::<E, R, _>(plugin.as_ref()),
                    error,
                }),
            }
        }

        if failures.is_empty() {
            Ok(self.reducer.reduce(responses))
        } else {
            debug!(
                plugin = %self.info.name,
                failed = failures.len(),
                inner = self.inner.len(),
                "Delegating plugin finished with inner failures"
            );
            Err(CompositeError::new(failures).into())
        }
    }

    fn info(&self) -> PluginInfo {
        self.info.clone()
    }
}

impl<E, R> fmt::Debug for DelegatingPlugin<E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatingPlugin")
            .field("name", &self.info.name)
            .field(
                "inner",
                &self
                    .inner
                    .iter()
                    .map(|p| plugin_name::<E, R, _>(p.as_ref()))
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Builder for [`DelegatingPlugin`].
pub struct DelegatingPluginBuilder<E, R> {
    info: PluginInfo,
    inner: Vec<SharedPlugin<E, R>>,
    reducer: Arc<dyn Reducer<R>>,
}

impl<E, R> DelegatingPluginBuilder<E, R> {
    /// Replace the composite's own info. Inner commands are still merged in.
    #[must_use]
    pub fn with_info(mut self, info: PluginInfo) -> Self {
        self.info = info;
        self
    }

    /// Append an inner plugin.
    #[must_use]
    pub fn with_plugin<P>(self, plugin: P) -> Self
    where
        P: Plugin<E, R> + 'static,
    {
        self.with_shared(Arc::new(plugin))
    }

    /// Append an already shared inner plugin.
    #[must_use]
    pub fn with_shared(mut self, plugin: SharedPlugin<E, R>) -> Self {
        self.inner.push(plugin);
        self
    }

    /// Finish the composite.
    #[must_use]
    pub fn build(self) -> DelegatingPlugin<E, R> {
        let info = merge_commands(self.info, &self.inner);
        DelegatingPlugin {
            info,
            inner: self.inner,
            reducer: self.reducer,
        }
    }
}

fn merge_commands<E, R>(mut info: PluginInfo, inner: &[SharedPlugin<E, R>]) -> PluginInfo {
    for plugin in inner {
        // A plugin whose `info` panics contributes no commands.
        let commands = catch_unwind(AssertUnwindSafe(|| plugin.info().commands)).unwrap_or_default();
        for command in commands {
            if !info.commands.contains(&command) {
                info.commands.push(command);
            }
        }
    }
    info
}
