//! Pass/fail combination
//!
//! Two independent signals decide a case: the client's exit code and the
//! faults drained from the server-under-test. Both are always inspected so
//! a failure message carries every piece of evidence at once.

use serde::Serialize;

use crate::runner::ProcessOutcome;
use crate::sink::ServerFault;
use crate::suite::CaseDescriptor;

/// Final decision for one case
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub passed: bool,
    pub message: String,
}

/// Combine exit code and drained faults into a verdict
///
/// Passes only when the exit code is 0 AND no faults were drained. The
/// failure message includes the script identifier, the captured
/// stdout+stderr text when the exit code is non-zero, and every fault's
/// rendered form whenever faults are present, regardless of the exit code.
pub fn evaluate(
    descriptor: &CaseDescriptor,
    outcome: &ProcessOutcome,
    faults: &[ServerFault],
) -> Verdict {
    // Checked independently; never short-circuit one signal on the other.
    let process_ok = outcome.success();
    let server_ok = faults.is_empty();

    if process_ok && server_ok {
        return Verdict {
            passed: true,
            message: format!("Test {descriptor} passed"),
        };
    }

    let mut message = format!("Test {descriptor} failed:");
    if !process_ok {
        message.push_str(&format!(
            "\nclient exited with code {}; captured output:\n{}",
            outcome.exit_code,
            outcome.combined_text()
        ));
    }
    if !server_ok {
        append_fault_evidence(&mut message, faults);
    }

    Verdict {
        passed: false,
        message,
    }
}

/// Append every fault's rendered form to a failure message
///
/// Shared with the orchestration layer so fault evidence also survives
/// cases that never produced an outcome (timeout, spawn death).
pub fn append_fault_evidence(message: &mut String, faults: &[ServerFault]) {
    message.push_str(&format!(
        "\n{} uncaught server-side fault(s) observed during the case:",
        faults.len()
    ));
    for fault in faults {
        message.push('\n');
        message.push_str(&fault.render());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::{enumerate, SuiteRegistry, SuiteSpec};

    fn descriptor() -> CaseDescriptor {
        let mut registry = SuiteRegistry::new();
        registry
            .register(SuiteSpec::new("core", "core").resource("basic1.js"))
            .unwrap();
        enumerate(&registry).unwrap().remove(0)
    }

    fn outcome(exit_code: i32, stdout: &str, stderr: &str) -> ProcessOutcome {
        ProcessOutcome {
            exit_code,
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_clean_exit_and_empty_sink_passes() {
        let verdict = evaluate(&descriptor(), &outcome(0, "all ok\n", ""), &[]);
        assert!(verdict.passed);
    }

    #[test]
    fn test_nonzero_exit_fails_with_captured_output() {
        let verdict = evaluate(
            &descriptor(),
            &outcome(1, "", "ReferenceError: x is not defined\n"),
            &[],
        );
        assert!(!verdict.passed);
        assert!(verdict.message.contains("core/basic1.js"));
        assert!(verdict.message.contains("exited with code 1"));
        assert!(verdict.message.contains("ReferenceError: x is not defined"));
    }

    #[test]
    fn test_server_fault_fails_even_on_clean_exit() {
        let faults = vec![ServerFault::new("IllegalState: cursor closed")
            .with_backtrace("at cursor_registry::close")];
        let verdict = evaluate(&descriptor(), &outcome(0, "looked fine\n", ""), &faults);
        assert!(!verdict.passed);
        assert!(verdict.message.contains("IllegalState: cursor closed"));
        assert!(verdict.message.contains("at cursor_registry::close"));
        // No process-level failure, so the captured output is omitted
        assert!(!verdict.message.contains("looked fine"));
        assert!(!verdict.message.contains("exited with code"));
    }

    #[test]
    fn test_combined_failure_carries_both_evidences() {
        let faults = vec![ServerFault::new("translator panic")];
        let verdict = evaluate(
            &descriptor(),
            &outcome(1, "assert failed\n", ""),
            &faults,
        );
        assert!(!verdict.passed);
        assert!(verdict.message.contains("assert failed"));
        assert!(verdict.message.contains("translator panic"));
    }
}
