//! Error taxonomy for the runtime bridge.

use std::fmt;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while executing JavaScript.
///
/// The three kinds are deliberately distinct so callers can tell
/// "no interpreter" from "my code is malformed" from "my code threw".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No usable JavaScript runtime, or the named runtime is unknown or
    /// not installed on this system. Fatal to the call, never retried.
    RuntimeUnavailable(String),
    /// The snippet failed to parse.
    Program(String),
    /// The snippet parsed but threw during execution, or the subprocess
    /// itself broke down (unparseable output, missing protocol line).
    Runtime(String),
}

impl Error {
    /// Diagnostic text carried by the error, without the kind label.
    pub fn message(&self) -> &str {
        match self {
            Error::RuntimeUnavailable(m) | Error::Program(m) | Error::Runtime(m) => m,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::RuntimeUnavailable(m) => write!(f, "runtime unavailable: {}", m),
            Error::Program(m) => write!(f, "program error: {}", m),
            Error::Runtime(m) => write!(f, "runtime error: {}", m),
        }
    }
}

impl std::error::Error for Error {}
