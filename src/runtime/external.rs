//! Subprocess-backed runtimes: wrapper script construction and invocation.

use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::escape::encode_unicode_codepoints;
use crate::protocol;

use super::which::which;
use super::{Context, Runtime};

/// Splice point for the encoded program inside a runner template.
const SOURCE_MARKER: &str = "#{encoded_source}";

/// Shared harness skeleton. Per-runtime variation is limited to how a
/// line is written to stdout (`#{write}`) and an optional trailing
/// statement such as `phantom.exit();` (`#{epilogue}`).
///
/// The harness runs in two phases. The compile phase materializes the
/// program with `eval` of a function expression; any throw there is
/// reported with a leading `SyntaxError` marker, which is the stable
/// convention the decoder classifies on. The run phase invokes the
/// program and reports throws with message plus stack text when the
/// interpreter provides one. Exactly one protocol line is written.
const RUNNER_TEMPLATE: &str = r#"(function() {
  var write = function(string) { #{write} };
  var describe = function(err) {
    var message = '' + err;
    if (err && err.stack) {
      var stack = '' + err.stack;
      if (stack.indexOf(message) === 0) { return stack; }
      return message + '\n' + stack;
    }
    return message;
  };
  var strip = function(key, value) {
    if (typeof value === 'function' || typeof value === 'undefined') { return undefined; }
    return value;
  };
  var emit = function(outcome) {
    var line;
    try {
      line = JSON.stringify(outcome, strip);
    } catch (err) {
      line = JSON.stringify({ status: 'error', error: describe(err) });
    }
    write(line);
  };
  var program;
  try {
    program = eval(#{encoded_source});
  } catch (err) {
    var message = describe(err);
    if (message.indexOf('SyntaxError') !== 0) { message = 'SyntaxError: ' + message; }
    emit({ status: 'error', error: message });
    return;
  }
  try {
    emit({ status: 'ok', value: program() });
  } catch (err) {
    emit({ status: 'error', error: describe(err) });
  }
})();
#{epilogue}"#;

/// Build a runner template from a per-runtime write statement and an
/// optional epilogue.
pub fn runner_source(write_statement: &str, epilogue: &str) -> String {
    RUNNER_TEMPLATE
        .replace("#{write}", write_statement)
        .replace("#{epilogue}", epilogue)
}

/// How the wrapper script reaches the interpreter.
///
/// Fixed per descriptor, never chosen per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Write the script to a temporary `.js` file and append its path to
    /// the interpreter's argv.
    TempFile,
    /// Pipe the script into the interpreter's standard input.
    Stdin,
}

/// A JavaScript runtime driven as an external interpreter subprocess.
pub struct ExternalRuntime {
    name: String,
    commands: Vec<Vec<String>>,
    runner_template: String,
    delivery: Delivery,
    // Resolved argv, computed at most once per process. Concurrent first
    // probes may both resolve, but agree on the answer.
    binary: OnceLock<Option<Vec<String>>>,
}

impl ExternalRuntime {
    /// Create a descriptor from argv candidate templates and a runner
    /// template containing the `#{encoded_source}` marker.
    ///
    /// Candidates are tried in order; the first whose program resolves on
    /// this system wins.
    pub fn new(
        name: impl Into<String>,
        commands: Vec<Vec<String>>,
        runner_template: String,
        delivery: Delivery,
    ) -> Self {
        ExternalRuntime {
            name: name.into(),
            commands,
            runner_template,
            delivery,
            binary: OnceLock::new(),
        }
    }

    pub fn node() -> Self {
        ExternalRuntime::new(
            "Node",
            vec![argv(&["node"]), argv(&["nodejs"])],
            runner_source("process.stdout.write('' + string + '\\n');", ""),
            Delivery::TempFile,
        )
    }

    pub fn javascript_core() -> Self {
        ExternalRuntime::new(
            "JavaScriptCore",
            vec![
                argv(&[
                    "/System/Library/Frameworks/JavaScriptCore.framework/Versions/Current/Resources/jsc",
                ]),
                argv(&["jsc"]),
            ],
            runner_source("print('' + string);", ""),
            Delivery::TempFile,
        )
    }

    pub fn spidermonkey() -> Self {
        ExternalRuntime::new(
            "SpiderMonkey",
            vec![argv(&["js"])],
            runner_source("print('' + string);", ""),
            Delivery::TempFile,
        )
    }

    pub fn phantomjs() -> Self {
        ExternalRuntime::new(
            "PhantomJS",
            vec![argv(&["phantomjs"])],
            runner_source("console.log('' + string);", "phantom.exit();"),
            Delivery::TempFile,
        )
    }

    pub fn slimerjs() -> Self {
        ExternalRuntime::new(
            "SlimerJS",
            vec![argv(&["slimerjs"])],
            runner_source("console.log('' + string);", "phantom.exit();"),
            Delivery::TempFile,
        )
    }

    /// Argv with the program resolved to an absolute path, or `None` when
    /// no candidate is installed. Memoized for the process lifetime.
    fn resolved_command(&self) -> Option<&[String]> {
        self.binary.get_or_init(|| self.locate()).as_deref()
    }

    fn locate(&self) -> Option<Vec<String>> {
        for candidate in &self.commands {
            let Some((program, rest)) = candidate.split_first() else {
                continue;
            };
            if let Some(path) = which(program) {
                let mut resolved = vec![path.to_string_lossy().into_owned()];
                resolved.extend(rest.iter().cloned());
                return Some(resolved);
            }
        }
        None
    }

    /// Embed `source` into this runtime's harness.
    ///
    /// The snippet goes verbatim into the body of a function expression,
    /// Unicode-escaped and JSON-string-encoded so the script text stays
    /// ASCII; the harness compiles it with `eval` and invokes it.
    fn build_wrapper(&self, source: &str) -> Result<String> {
        let escaped = encode_unicode_codepoints(source);
        let function_expr = format!("(function(){{ {} }})", escaped);
        let encoded = serde_json::to_string(&function_expr)
            .map_err(|e| Error::Runtime(format!("could not encode source: {}", e)))?;
        Ok(self.runner_template.replace(SOURCE_MARKER, &encoded))
    }

    fn invoke(&self, argv: &[String], script: &str) -> Result<Output> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::Runtime(format!("{} has an empty command line", self.name)))?;

        match self.delivery {
            Delivery::TempFile => {
                let mut file = tempfile::Builder::new()
                    .prefix("execjs")
                    .suffix(".js")
                    .tempfile()
                    .map_err(|e| {
                        Error::Runtime(format!("could not create temporary script: {}", e))
                    })?;
                file.write_all(script.as_bytes())
                    .map_err(|e| Error::Runtime(format!("could not write script: {}", e)))?;
                // The tempfile is removed when `file` drops, on every path.
                Command::new(program)
                    .args(args)
                    .arg(file.path())
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .output()
                    .map_err(|e| Error::Runtime(format!("failed to run {}: {}", program, e)))
            }
            Delivery::Stdin => {
                let mut child = Command::new(program)
                    .args(args)
                    .stdin(Stdio::piped())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .spawn()
                    .map_err(|e| Error::Runtime(format!("failed to run {}: {}", program, e)))?;
                if let Some(mut stdin) = child.stdin.take() {
                    // An interpreter that exits early closes the pipe; the
                    // protocol line (or its absence) decides the outcome.
                    stdin.write_all(script.as_bytes()).ok();
                }
                child
                    .wait_with_output()
                    .map_err(|e| Error::Runtime(format!("failed to run {}: {}", program, e)))
            }
        }
    }

    fn exec_source(&self, source: &str) -> Result<Value> {
        let argv = self.resolved_command().ok_or_else(|| {
            Error::RuntimeUnavailable(format!(
                "{} runtime is not available on this system",
                self.name
            ))
        })?;
        let script = self.build_wrapper(source)?;
        let output = self.invoke(argv, &script)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        protocol::extract_result(&stdout, &stderr, output.status.code())
    }
}

impl Runtime for ExternalRuntime {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.resolved_command().is_some()
    }

    fn compile(self: Arc<Self>, source: &str) -> Result<Context> {
        Ok(Context::new(self, source))
    }

    fn exec(&self, source: &str) -> Result<Value> {
        self.exec_source(source)
    }

    fn eval(&self, source: &str) -> Result<Value> {
        if source.trim().is_empty() {
            return Ok(Value::Null);
        }
        self.exec_source(&format!("return ({})", source))
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub(name: &str, commands: Vec<Vec<String>>) -> ExternalRuntime {
        ExternalRuntime::new(
            name,
            commands,
            runner_source("print('' + string);", ""),
            Delivery::TempFile,
        )
    }

    #[test]
    fn test_wrapper_embeds_snippet_as_encoded_function_expression() {
        let rt = stub("Stub", vec![argv(&["sh"])]);
        let wrapper = rt.build_wrapper("return 1 + 2;").unwrap();
        assert!(wrapper.contains("\"(function(){ return 1 + 2; })\""));
        assert!(!wrapper.contains(SOURCE_MARKER));
    }

    #[test]
    fn test_wrapper_escapes_non_ascii_before_encoding() {
        let rt = stub("Stub", vec![argv(&["sh"])]);
        let wrapper = rt.build_wrapper("return '\u{221a}';").unwrap();
        // The escaper produces √; JSON encoding doubles the backslash.
        assert!(wrapper.contains("\\\\u221a"));
        assert!(wrapper.is_ascii());
    }

    #[test]
    fn test_runner_source_substitutes_write_and_epilogue() {
        let template = runner_source("console.log('' + string);", "phantom.exit();");
        assert!(template.contains("console.log('' + string);"));
        assert!(template.trim_end().ends_with("phantom.exit();"));
        assert!(template.contains(SOURCE_MARKER));
    }

    #[test]
    fn test_unresolvable_command_is_runtime_unavailable() {
        let rt = stub("Ghost", vec![argv(&["definitely-not-a-real-interpreter-xyz"])]);
        assert!(!rt.is_available());
        match rt.exec("1") {
            Err(Error::RuntimeUnavailable(m)) => assert!(m.contains("Ghost")),
            other => panic!("expected RuntimeUnavailable, got {:?}", other),
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_first_resolvable_candidate_wins() {
        let rt = stub(
            "Stub",
            vec![
                argv(&["definitely-not-a-real-interpreter-xyz"]),
                argv(&["sh", "-e"]),
            ],
        );
        let resolved = rt.resolved_command().expect("sh should resolve");
        assert!(resolved[0].ends_with("sh"));
        assert_eq!(resolved[1], "-e");
    }

    #[test]
    fn test_availability_is_memoized_and_stable() {
        let rt = stub("Ghost", vec![argv(&["definitely-not-a-real-interpreter-xyz"])]);
        assert_eq!(rt.is_available(), rt.is_available());
        assert!(rt.binary.get().is_some());
    }
}
