//! Per-dispatch outcome: one result slot per registered plugin.

use std::ops::Index;

use crate::core::error::{PluginError, PluginResult};
use crate::core::plugin::PluginId;

/// Ordered, slot-indexed results of one dispatch.
///
/// Slot `i` always holds the result of the plugin registered with id `i`, and
/// the outcome always has exactly as many slots as the registry has plugins.
/// A partially failed dispatch is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome<R> {
    results: Vec<PluginResult<R>>,
}

impl<R> DispatchOutcome<R> {
    pub(crate) const fn from_results(results: Vec<PluginResult<R>>) -> Self {
        Self { results }
    }

    /// Number of slots (equals the registry size).
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// True for a dispatch over an empty registry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Result of the plugin with `id`.
    #[must_use]
    pub fn get(&self, id: PluginId) -> Option<&PluginResult<R>> {
        self.results.get(id.index())
    }

    /// Iterate over slots in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, PluginResult<R>> {
        self.results.iter()
    }

    /// Successful responses with their plugin ids.
    pub fn successes(&self) -> impl Iterator<Item = (PluginId, &R)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(idx, r)| r.as_ref().ok().map(|resp| (PluginId(idx), resp)))
    }

    /// Failures with their plugin ids.
    pub fn failures(&self) -> impl Iterator<Item = (PluginId, &PluginError)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(idx, r)| r.as_ref().err().map(|err| (PluginId(idx), err)))
    }

    /// Number of failed slots.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_err()).count()
    }

    /// True if every plugin succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.results.iter().all(Result::is_ok)
    }

    /// Consume into the raw slot vector.
    #[must_use]
    pub fn into_results(self) -> Vec<PluginResult<R>> {
        self.results
    }
}

impl<R> Index<usize> for DispatchOutcome<R> {
    type Output = PluginResult<R>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.results[index]
    }
}

impl<R> IntoIterator for DispatchOutcome<R> {
    type Item = PluginResult<R>;
    type IntoIter = std::vec::IntoIter<PluginResult<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a, R> IntoIterator for &'a DispatchOutcome<R> {
    type Item = &'a PluginResult<R>;
    type IntoIter = std::slice::Iter<'a, PluginResult<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
