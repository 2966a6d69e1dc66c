//! Wire protocol: argument marshalling and harness output decoding.
//!
//! A conforming wrapper script writes exactly one line to stdout: a JSON
//! object with a `status` key (`"ok"` or `"error"`) and either a `value`
//! payload or an `error` diagnostic string. Everything else the process
//! prints is ignored for success/failure determination.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Marker the harness puts in front of every compile-phase failure.
///
/// Classification relies on this prefix being written by our own wrapper
/// script, not on interpreter-specific message formats.
const SYNTAX_ERROR_MARKER: &str = "SyntaxError";

#[derive(Debug, Deserialize)]
struct ProtocolLine {
    status: String,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// JSON-encode call arguments for embedding into wrapper script text.
pub fn encode_args(args: &[Value]) -> Result<String> {
    serde_json::to_string(args)
        .map_err(|e| Error::Runtime(format!("could not encode call arguments: {}", e)))
}

/// Decode captured subprocess output into a value or a classified error.
///
/// The exit code is advisory only: many interpreters exit 0 even when the
/// script failed internally, so correctness comes from the protocol line.
pub fn extract_result(stdout: &str, stderr: &str, exit_code: Option<i32>) -> Result<Value> {
    let normalized = stdout.replace("\r\n", "\n").replace('\r', "\n");
    let line = normalized.lines().rev().find(|l| !l.trim().is_empty());

    let parsed = line.and_then(|l| serde_json::from_str::<ProtocolLine>(l).ok());
    let outcome = match parsed {
        Some(o) => o,
        None => return Err(Error::Runtime(breakdown_diagnostic(stdout, stderr, exit_code))),
    };

    match outcome.status.as_str() {
        "ok" => Ok(outcome.value.unwrap_or(Value::Null)),
        "error" => {
            let message = outcome.error.unwrap_or_else(|| "unknown error".to_string());
            if message.starts_with(SYNTAX_ERROR_MARKER) {
                Err(Error::Program(message))
            } else {
                Err(Error::Runtime(message))
            }
        }
        other => Err(Error::Runtime(format!(
            "unexpected protocol status {:?}: {}",
            other, stdout
        ))),
    }
}

fn breakdown_diagnostic(stdout: &str, stderr: &str, exit_code: Option<i32>) -> String {
    let code = exit_code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string());
    let mut text = format!("interpreter produced no protocol line (exit code: {})", code);
    if !stdout.trim().is_empty() {
        text.push_str("\nstdout: ");
        text.push_str(stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        text.push_str("\nstderr: ");
        text.push_str(stderr.trim_end());
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_with_value() {
        let v = extract_result("{\"status\":\"ok\",\"value\":3}\n", "", Some(0)).unwrap();
        assert_eq!(v, json!(3));
    }

    #[test]
    fn test_ok_with_missing_value_decodes_to_null() {
        let v = extract_result("{\"status\":\"ok\"}\n", "", Some(0)).unwrap();
        assert_eq!(v, Value::Null);
    }

    #[test]
    fn test_last_nonempty_line_wins() {
        let stdout = "hello from the snippet\n\n{\"status\":\"ok\",\"value\":[1,2]}\n";
        let v = extract_result(stdout, "", Some(0)).unwrap();
        assert_eq!(v, json!([1, 2]));
    }

    #[test]
    fn test_crlf_output_is_normalized() {
        let v = extract_result("{\"status\":\"ok\",\"value\":true}\r\n", "", Some(0)).unwrap();
        assert_eq!(v, json!(true));
    }

    #[test]
    fn test_error_with_syntax_marker_is_program_error() {
        let stdout = "{\"status\":\"error\",\"error\":\"SyntaxError: Unexpected token ')'\"}\n";
        match extract_result(stdout, "", Some(0)) {
            Err(Error::Program(m)) => assert!(m.contains("Unexpected token")),
            other => panic!("expected Program error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_without_marker_is_runtime_error() {
        let stdout = "{\"status\":\"error\",\"error\":\"Error: boom\"}\n";
        match extract_result(stdout, "", Some(0)) {
            Err(Error::Runtime(m)) => assert!(m.contains("boom")),
            other => panic!("expected Runtime error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_protocol_line_carries_diagnostics() {
        match extract_result("", "node: command crashed\n", Some(1)) {
            Err(Error::Runtime(m)) => {
                assert!(m.contains("no protocol line"));
                assert!(m.contains("command crashed"));
                assert!(m.contains("exit code: 1"));
            }
            other => panic!("expected Runtime error, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_stdout_is_runtime_error() {
        let res = extract_result("not json at all\n", "", Some(0));
        assert!(matches!(res, Err(Error::Runtime(_))));
    }

    #[test]
    fn test_nonzero_exit_is_advisory_when_line_present() {
        // Some interpreters exit non-zero even after a clean protocol line.
        let v = extract_result("{\"status\":\"ok\",\"value\":\"x\"}\n", "warning\n", Some(3)).unwrap();
        assert_eq!(v, json!("x"));
    }

    #[test]
    fn test_encode_args_round_trips_through_json() {
        let args = vec![json!(1), json!("two"), json!([3.5, null])];
        let text = encode_args(&args).unwrap();
        let back: Vec<Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, args);
    }
}
