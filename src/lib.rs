//! Run JavaScript code from Rust.
//!
//! execjs picks the best JavaScript runtime installed on the machine,
//! executes your program against it as a subprocess, and returns the
//! result as a [`Value`]. The caller never needs to know which
//! interpreter that is.
//!
//! ```no_run
//! let words = execjs::eval("'red yellow blue'.split(' ')")?;
//! assert_eq!(words, serde_json::json!(["red", "yellow", "blue"]));
//!
//! let ctx = execjs::compile("function add(x, y) { return x + y; }")?;
//! let sum = ctx.call("add", &[1.into(), 2.into()])?;
//! assert_eq!(sum, serde_json::json!(3));
//! # Ok::<(), execjs::Error>(())
//! ```
//!
//! Execution is synchronous and single-shot: one call spawns one
//! interpreter process and blocks until it exits. Runtime selection can
//! be pinned with the `EXECJS_RUNTIME` environment variable.

mod error;
mod escape;
mod protocol;
mod registry;
mod runtime;

pub use error::{Error, Result};
pub use registry::{Registry, ENV_RUNTIME};
pub use runtime::external::{runner_source, Delivery, ExternalRuntime};
pub use runtime::{Context, Runtime, UnavailableRuntime};
pub use serde_json::Value;

use std::sync::{Arc, OnceLock};

static DEFAULT_REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry of standard runtimes, built on first use and
/// immutable thereafter. Construct your own [`Registry`] to register
/// custom runtimes.
pub fn default_registry() -> &'static Registry {
    DEFAULT_REGISTRY.get_or_init(Registry::with_defaults)
}

/// Return an appropriate runtime from the default registry: by name, or
/// auto-detected when `name` is `None`.
pub fn get(name: Option<&str>) -> Result<Arc<dyn Runtime>> {
    default_registry().get(name)
}

/// Evaluate a JavaScript expression against the auto-detected runtime.
pub fn eval(source: &str) -> Result<Value> {
    get(None)?.eval(source)
}

/// Execute a JavaScript function body against the auto-detected runtime.
pub fn exec(source: &str) -> Result<Value> {
    get(None)?.exec(source)
}

/// Retain `source` as a [`Context`] for later calls. Nothing is run.
pub fn compile(source: &str) -> Result<Context> {
    get(None)?.compile(source)
}

/// All registered runtimes, in detection order.
pub fn runtimes() -> Vec<Arc<dyn Runtime>> {
    default_registry().runtimes()
}

/// The registered runtimes that are usable on this system.
pub fn available_runtimes() -> Vec<Arc<dyn Runtime>> {
    default_registry().available_runtimes()
}
