//! Runtime capability interface and compiled contexts.

pub mod external;
pub(crate) mod which;

use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::protocol;

/// A JavaScript runtime: an external interpreter program (or any other
/// engine) capable of executing source text.
///
/// Implementations are effectively immutable after construction; the only
/// mutation allowed is idempotent caching of probe results, so a single
/// runtime can be shared freely across threads.
pub trait Runtime: Send + Sync {
    /// Human-readable name, also the registry key.
    fn name(&self) -> &str;

    /// Whether the runtime can execute code on this system right now.
    ///
    /// Probed lazily on first use and memoized for the process lifetime;
    /// calling this twice yields the same answer without re-probing.
    fn is_available(&self) -> bool;

    /// Retain `source` for later execution. Nothing is run.
    fn compile(self: Arc<Self>, source: &str) -> Result<Context>;

    /// Execute `source` as a function body and return whatever it returns.
    ///
    /// A snippet without an explicit `return` produces [`Value::Null`].
    fn exec(&self, source: &str) -> Result<Value>;

    /// Evaluate `source` as a single expression.
    ///
    /// Defined as `exec("return (" + source + ")")`, so statement-only
    /// snippets are rejected with [`Error::Program`].
    fn eval(&self, source: &str) -> Result<Value>;
}

/// A handle bound to previously compiled (retained) source.
///
/// Further calls are concatenated after the retained source and executed
/// together inside one function scope, so declarations in the context
/// source are visible to the call body.
pub struct Context {
    runtime: Arc<dyn Runtime>,
    source: String,
}

impl Context {
    pub(crate) fn new(runtime: Arc<dyn Runtime>, source: &str) -> Self {
        Context {
            runtime,
            source: source.to_string(),
        }
    }

    /// The source this context was compiled against.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Execute `source` as a function body, with the context source in scope.
    pub fn exec(&self, source: &str) -> Result<Value> {
        let combined = if self.source.trim().is_empty() {
            source.to_string()
        } else {
            // Context source first, call body second. Order is load-bearing.
            format!("{};\n{}", self.source, source)
        };
        self.runtime.exec(&combined)
    }

    /// Evaluate `source` as a single expression, with the context source
    /// in scope.
    pub fn eval(&self, source: &str) -> Result<Value> {
        if source.trim().is_empty() {
            return Ok(Value::Null);
        }
        self.exec(&format!("return ({})", source))
    }

    /// Call the function named `identifier` with the given arguments.
    pub fn call(&self, identifier: &str, args: &[Value]) -> Result<Value> {
        let encoded = protocol::encode_args(args)?;
        self.eval(&format!("{}.apply(this, {})", identifier, encoded))
    }
}

/// A placeholder runtime that is never available.
///
/// Useful for keeping a registry slot for an engine this build cannot
/// drive; every operation fails with [`Error::RuntimeUnavailable`].
pub struct UnavailableRuntime {
    name: String,
}

impl UnavailableRuntime {
    pub fn new(name: impl Into<String>) -> Self {
        UnavailableRuntime { name: name.into() }
    }

    fn unavailable(&self) -> Error {
        Error::RuntimeUnavailable(format!(
            "{} runtime is not available on this system",
            self.name
        ))
    }
}

impl Runtime for UnavailableRuntime {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        false
    }

    fn compile(self: Arc<Self>, _source: &str) -> Result<Context> {
        Err(self.unavailable())
    }

    fn exec(&self, _source: &str) -> Result<Value> {
        Err(self.unavailable())
    }

    fn eval(&self, _source: &str) -> Result<Value> {
        Err(self.unavailable())
    }
}
