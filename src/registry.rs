//! Named runtime registry with environment-driven auto-detection.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::runtime::external::ExternalRuntime;
use crate::runtime::Runtime;

/// Environment variable naming the runtime to prefer during auto-detect.
pub const ENV_RUNTIME: &str = "EXECJS_RUNTIME";

/// An explicit, read-mostly collection of named runtimes.
///
/// Insertion order is preserved and is the fallback search order during
/// auto-detection. Availability is probed lazily at call time, never at
/// registration.
pub struct Registry {
    order: Vec<String>,
    entries: HashMap<String, Arc<dyn Runtime>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Registry {
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }

    /// The standard set of external runtimes.
    pub fn with_defaults() -> Self {
        let mut registry = Registry::new();
        registry.register("Node", Arc::new(ExternalRuntime::node()));
        registry.register("JavaScriptCore", Arc::new(ExternalRuntime::javascript_core()));
        registry.register("SpiderMonkey", Arc::new(ExternalRuntime::spidermonkey()));
        registry.register("PhantomJS", Arc::new(ExternalRuntime::phantomjs()));
        registry.register("SlimerJS", Arc::new(ExternalRuntime::slimerjs()));
        registry
    }

    /// Register a runtime under `name`, overwriting any previous entry.
    ///
    /// Re-registering a name keeps its original position in the search
    /// order.
    pub fn register(&mut self, name: impl Into<String>, runtime: Arc<dyn Runtime>) {
        let name = name.into();
        if self.entries.insert(name.clone(), runtime).is_none() {
            self.order.push(name);
        }
    }

    /// Return an appropriate runtime.
    ///
    /// With a name, look it up and require it to be available. Without
    /// one, auto-detect: honor [`ENV_RUNTIME`] strictly when set, else
    /// scan registered runtimes in insertion order for the first
    /// available one.
    pub fn get(&self, name: Option<&str>) -> Result<Arc<dyn Runtime>> {
        match name {
            Some(name) => self.lookup(name),
            None => self.auto_detect(),
        }
    }

    /// The runtime named in [`ENV_RUNTIME`], if the variable is set and
    /// non-empty. An unknown or unavailable name is an error, not a
    /// fallthrough.
    pub fn from_environment(&self) -> Option<Result<Arc<dyn Runtime>>> {
        match env::var(ENV_RUNTIME) {
            Ok(name) if !name.is_empty() => Some(self.lookup(&name)),
            _ => None,
        }
    }

    /// All registered runtimes, in insertion order.
    pub fn runtimes(&self) -> Vec<Arc<dyn Runtime>> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name))
            .map(Arc::clone)
            .collect()
    }

    /// The registered runtimes that are usable on this system.
    pub fn available_runtimes(&self) -> Vec<Arc<dyn Runtime>> {
        self.runtimes()
            .into_iter()
            .filter(|rt| rt.is_available())
            .collect()
    }

    fn lookup(&self, name: &str) -> Result<Arc<dyn Runtime>> {
        let runtime = self.entries.get(name).ok_or_else(|| {
            Error::RuntimeUnavailable(format!("{} runtime is not defined", name))
        })?;
        if !runtime.is_available() {
            return Err(Error::RuntimeUnavailable(format!(
                "{} runtime is not available on this system",
                runtime.name()
            )));
        }
        Ok(Arc::clone(runtime))
    }

    fn auto_detect(&self) -> Result<Arc<dyn Runtime>> {
        // An explicit override is honored for determinism: it either
        // resolves or the whole detection fails.
        if let Some(from_env) = self.from_environment() {
            return from_env;
        }
        for name in &self.order {
            if let Some(runtime) = self.entries.get(name) {
                if runtime.is_available() {
                    return Ok(Arc::clone(runtime));
                }
            }
        }
        Err(Error::RuntimeUnavailable(
            "Could not find a JavaScript runtime.".to_string(),
        ))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}
