//! Ordered plugin registry.
//!
//! A registry is built up front and then handed to a scheduler, which freezes it
//! behind an `Arc`. There is no removal: reconfiguring means building a new
//! registry and a new scheduler around it, so the dispatch read path never locks.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::core::error::SchedulerError;
use crate::core::plugin::{plugin_name, Plugin, PluginId, PluginInfo};

/// Shared handle to a registered plugin.
pub type SharedPlugin<E, R> = Arc<dyn Plugin<E, R>>;

/// Ordered collection of plugins; registration order is dispatch order.
pub struct PluginRegistry<E, R> {
    plugins: Vec<SharedPlugin<E, R>>,
}

impl<E, R> PluginRegistry<E, R> {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Create an empty registry with room for `capacity` plugins.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            plugins: Vec::with_capacity(capacity),
        }
    }

    /// Append a plugin and return its stable id.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::RegistryExhausted` if the registry cannot grow.
    pub fn register<P>(&mut self, plugin: P) -> Result<PluginId, SchedulerError>
    where
        P: Plugin<E, R> + 'static,
    {
        self.register_shared(Arc::new(plugin))
    }

    /// Append an already shared plugin and return its stable id.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::RegistryExhausted` if the registry cannot grow.
    pub fn register_shared(
        &mut self,
        plugin: SharedPlugin<E, R>,
    ) -> Result<PluginId, SchedulerError> {
        self.plugins
            .try_reserve(1)
            .map_err(|e| SchedulerError::RegistryExhausted(e.to_string()))?;
        let id = PluginId(self.plugins.len());
        debug!(plugin_id = %id, plugin = %plugin_name::<E, R, _>(plugin.as_ref()), "Plugin registered");
        self.plugins.push(plugin);
        Ok(id)
    }

    /// Registered plugins in registration order.
    #[must_use]
    pub fn plugins(&self) -> &[SharedPlugin<E, R>] {
        &self.plugins
    }

    /// Look up a plugin by id.
    #[must_use]
    pub fn get(&self, id: PluginId) -> Option<&SharedPlugin<E, R>> {
        self.plugins.get(id.index())
    }

    /// Info of every plugin, in registration order.
    #[must_use]
    pub fn infos(&self) -> Vec<PluginInfo> {
        self.plugins.iter().map(|p| p.info()).collect()
    }

    /// Number of registered plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// True if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Iterate over `(id, plugin)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (PluginId, &SharedPlugin<E, R>)> {
        self.plugins
            .iter()
            .enumerate()
            .map(|(idx, plugin)| (PluginId(idx), plugin))
    }

    pub(crate) fn into_plugins(self) -> Vec<SharedPlugin<E, R>> {
        self.plugins
    }
}

impl<E, R> Default for PluginRegistry<E, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, R> FromIterator<SharedPlugin<E, R>> for PluginRegistry<E, R> {
    fn from_iter<I: IntoIterator<Item = SharedPlugin<E, R>>>(iter: I) -> Self {
        Self {
            plugins: iter.into_iter().collect(),
        }
    }
}

impl<E, R> fmt::Debug for PluginRegistry<E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|p| plugin_name::<E, R, _>(p.as_ref())))
            .finish()
    }
}
