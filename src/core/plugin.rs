//! The plugin capability and the invocation boundary every scheduler goes through.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::{PluginError, PluginResult};
use crate::util::panic::panic_message;

/// Identifies a plugin by its registration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PluginId(pub usize);

impl PluginId {
    /// Registration index, which is also the plugin's outcome slot.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Describes a plugin: name, authorship, and the commands it answers to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Plugin name, used in logs and error reports.
    pub name: String,
    /// Plugin version.
    pub version: String,
    /// Authors, free form.
    pub authors: String,
    /// Source repository, if published.
    pub repo: Option<String>,
    /// Commands the plugin handles.
    pub commands: Vec<String>,
}

impl PluginInfo {
    /// Create info with a name and version; everything else empty.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            authors: String::new(),
            repo: None,
            commands: Vec::new(),
        }
    }

    /// Set authors.
    #[must_use]
    pub fn with_authors(mut self, authors: impl Into<String>) -> Self {
        self.authors = authors.into();
        self
    }

    /// Set the source repository.
    #[must_use]
    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = Some(repo.into());
        self
    }

    /// Add a handled command.
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.commands.push(command.into());
        self
    }
}

impl fmt::Display for PluginInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.name, self.version)?;
        if let Some(repo) = &self.repo {
            write!(f, " [{repo}]")?;
        }
        writeln!(f)?;
        writeln!(f, "Authors: {}", self.authors)?;
        if self.commands.is_empty() {
            write!(f, "Commands: None")
        } else {
            write!(f, "Commands: [{}]", self.commands.join(", "))
        }
    }
}

/// Handles a single event and returns its response.
///
/// Plugins are shared between threads by the threaded scheduler, so `handle`
/// takes `&self`; any mutable state is the plugin's own concern and must be
/// synchronized by the plugin. The event is shared read-only with every other
/// plugin of the same dispatch.
///
/// # Example
///
/// ```rust
/// use prometheus_plugin_dispatch::core::{Plugin, PluginInfo, PluginResult};
///
/// struct Echo;
///
/// impl Plugin<String, Vec<String>> for Echo {
///     fn handle(&self, event: &String) -> PluginResult<Vec<String>> {
///         Ok(vec![event.clone()])
///     }
///
///     fn info(&self) -> PluginInfo {
///         PluginInfo::new("echo", "0.1.0").with_command("!echo")
///     }
/// }
///
/// assert_eq!(Echo.handle(&"hi".to_string()).unwrap(), vec!["hi".to_string()]);
/// ```
pub trait Plugin<E, R>: Send + Sync {
    /// Handle one event.
    ///
    /// # Errors
    ///
    /// Returns a [`PluginError`] when the plugin cannot handle the event. Panics
    /// are also tolerated: schedulers convert them into [`PluginError::Panicked`].
    fn handle(&self, event: &E) -> PluginResult<R>;

    /// Describe the plugin. Defaults to the implementing type's name.
    fn info(&self) -> PluginInfo {
        PluginInfo::new(std::any::type_name::<Self>(), "0.0.0")
    }
}

impl<E, R, P> Plugin<E, R> for std::sync::Arc<P>
where
    P: Plugin<E, R> + ?Sized,
{
    fn handle(&self, event: &E) -> PluginResult<R> {
        (**self).handle(event)
    }

    fn info(&self) -> PluginInfo {
        (**self).info()
    }
}

/// Plugin backed by a closure.
pub struct FnPlugin<F> {
    info: PluginInfo,
    handler: F,
}

impl<F> FnPlugin<F> {
    /// Wrap `handler` as a plugin named `name`.
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            info: PluginInfo::new(name, env!("CARGO_PKG_VERSION")),
            handler,
        }
    }

    /// Replace the generated info.
    #[must_use]
    pub fn with_info(mut self, info: PluginInfo) -> Self {
        self.info = info;
        self
    }
}

impl<E, R, F> Plugin<E, R> for FnPlugin<F>
where
    F: Fn(&E) -> PluginResult<R> + Send + Sync,
{
    fn handle(&self, event: &E) -> PluginResult<R> {
        (self.handler)(event)
    }

    fn info(&self) -> PluginInfo {
        self.info.clone()
    }
}

impl<F> fmt::Debug for FnPlugin<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPlugin").field("info", &self.info).finish_non_exhaustive()
    }
}

/// Invoke `plugin` behind a panic boundary.
///
/// A panic inside the plugin becomes [`PluginError::Panicked`]; nothing unwinds
/// into the caller.
///
/// # Errors
///
/// Returns the plugin's own error, or `Panicked` if it panicked.
pub fn invoke<E, R, P>(plugin: &P, event: &E) -> PluginResult<R>
where
    P: Plugin<E, R> + ?Sized,
{
    match catch_unwind(AssertUnwindSafe(|| plugin.handle(event))) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            let name = plugin_name::<E, R, P>(plugin);
            warn!(plugin = %name, panic = %message, "Plugin panicked; converted to error");
            Err(PluginError::Panicked {
                plugin: name,
                message,
            })
        }
    }
}

/// Name from `plugin.info()`, behind the same panic boundary as `handle`.
///
/// Falls back to [`UNKNOWN_PLUGIN`] if `info` panics.
pub fn plugin_name<E, R, P>(plugin: &P) -> String
where
    P: Plugin<E, R> + ?Sized,
{
    catch_unwind(AssertUnwindSafe(|| plugin.info().name)).unwrap_or_else(|payload| {
        warn!(panic = %panic_message(payload.as_ref()), "Plugin info panicked");
        UNKNOWN_PLUGIN.to_string()
    })
}

/// Name reported for a plugin whose `info` panicked.
pub const UNKNOWN_PLUGIN: &str = "<unknown>";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_display_with_repo_and_commands() {
        let info = PluginInfo::new("greeter", "1.2.0")
            .with_authors("alice")
            .with_repo("https://example.com/greeter")
            .with_command("!hi")
            .with_command("!bye");
        assert_eq!(
            info.to_string(),
            "greeter v1.2.0 [https://example.com/greeter]\nAuthors: alice\nCommands: [!hi, !bye]"
        );
    }

    #[test]
    fn test_info_display_without_commands() {
        let info = PluginInfo::new("quiet", "0.1.0");
        assert_eq!(info.to_string(), "quiet v0.1.0\nAuthors: \nCommands: None");
    }

    #[test]
    fn test_invoke_converts_panic() {
        let plugin = FnPlugin::new("bomb", |_: &u32| -> PluginResult<u32> { panic!("kaboom") });
        let err = invoke(&plugin, &1).unwrap_err();
        assert_eq!(
            err,
            PluginError::Panicked {
                plugin: "bomb".into(),
                message: "kaboom".into(),
            }
        );
    }

    #[test]
    fn test_invoke_passes_result_through() {
        let plugin = FnPlugin::new("double", |n: &u32| -> PluginResult<u32> { Ok(n * 2) });
        assert_eq!(invoke(&plugin, &21), Ok(42));
    }

    #[test]
    fn test_default_info_uses_type_name() {
        struct Unnamed;
        impl Plugin<(), ()> for Unnamed {
            fn handle(&self, _event: &()) -> PluginResult<()> {
                Ok(())
            }
        }
        assert!(Unnamed.info().name.ends_with("Unnamed"));
    }

    struct Broken;

    impl Plugin<u32, u32> for Broken {
        fn handle(&self, _event: &u32) -> PluginResult<u32> {
            panic!("handle failed")
        }

        fn info(&self) -> PluginInfo {
            panic!("info failed")
        }
    }

    #[test]
    fn test_panicking_info_is_contained() {
        assert_eq!(plugin_name::<u32, u32, _>(&Broken), UNKNOWN_PLUGIN);
        assert_eq!(
            invoke(&Broken, &1),
            Err(PluginError::Panicked {
                plugin: UNKNOWN_PLUGIN.into(),
                message: "handle failed".into(),
            })
        );
    }
}
