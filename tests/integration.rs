//! End-to-end tests for the harness
//!
//! These run real cases through `Harness` with a stub client executable
//! fabricated per test, so every layer from enumeration to verdict is
//! exercised without a real server or shell client.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use compat_harness::harness::failed_count;
use compat_harness::{fault_channel, Config, FaultWriter, Harness, ServerFault, SuiteRegistry, SuiteSpec};

/// Test context with a temp dir for stub clients
struct TestContext {
    temp_dir: TempDir,
    scripts_dir: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let manifest_dir = env!("CARGO_MANIFEST_DIR");
        let scripts_dir = PathBuf::from(manifest_dir)
            .join("tests")
            .join("fixtures")
            .join("scripts");
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
            scripts_dir,
        }
    }

    /// Write an executable stub client with the given shell body
    fn write_client(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.temp_dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write stub client");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod stub client");
        path
    }

    /// Harness config pointing at the fixture scripts and a stub client
    fn config(&self, client: &Path) -> Config {
        let mut config = Config::default();
        config.client.binary = client.to_path_buf();
        config.scripts.root = self.scripts_dir.clone();
        config
    }

    /// Registry with the two fixture scripts under the "basic" suite
    fn basic_registry() -> SuiteRegistry {
        let mut registry = SuiteRegistry::new();
        registry
            .register(
                SuiteSpec::new("basic", "basic")
                    .resource("insert1.js")
                    .resource("find1.js"),
            )
            .expect("Failed to register suite");
        registry
    }

    fn harness(&self, client: &Path) -> (FaultWriter, Harness) {
        let (writer, drain) = fault_channel();
        let harness = Harness::new(self.config(client), Self::basic_registry(), drain);
        (writer, harness)
    }
}

#[tokio::test]
async fn clean_client_passes_every_case() {
    let ctx = TestContext::new();
    let client = ctx.write_client("client-ok", "exit 0");
    let (_writer, harness) = ctx.harness(&client);

    let reports = harness.run().await.expect("run failed");
    assert_eq!(reports.len(), 2);
    assert_eq!(failed_count(&reports), 0);
    assert_eq!(reports[0].descriptor.to_string(), "basic/insert1.js");
    assert_eq!(reports[1].descriptor.to_string(), "basic/find1.js");
}

#[tokio::test]
async fn client_receives_address_setup_and_case_script() {
    let ctx = TestContext::new();
    // Echo the argument shape to stderr and fail so the verdict message
    // carries it back to us.
    let client = ctx.write_client("client-args", r#"echo "args: $1 | $2 | $3" 1>&2; exit 1"#);
    let (_writer, harness) = ctx.harness(&client);

    let reports = harness.run_suite("basic").await.expect("run failed");
    let message = &reports[0].verdict.message;
    assert!(
        message.contains("args: 127.0.0.1:27018/compat |"),
        "target address missing from client argv: {message}"
    );
    assert!(message.contains("setup.js |"), "setup script missing: {message}");
    assert!(
        message.contains("basic/insert1.js"),
        "case script missing: {message}"
    );
}

#[tokio::test]
async fn failing_client_surfaces_captured_output_and_suite_continues() {
    let ctx = TestContext::new();
    let client = ctx.write_client(
        "client-flaky",
        r#"case "$3" in
*insert1.js)
    echo "inserted 1 of 2 documents"
    echo "ReferenceError: x is not defined" 1>&2
    exit 1
    ;;
*)
    exit 0
    ;;
esac"#,
    );
    let (_writer, harness) = ctx.harness(&client);

    let reports = harness.run().await.expect("run failed");
    assert_eq!(reports.len(), 2, "failure must not stop the suite");
    assert_eq!(failed_count(&reports), 1);

    let failed = &reports[0];
    assert!(!failed.verdict.passed);
    assert!(failed.verdict.message.contains("exited with code 1"));
    // stdout and stderr are both captured, stdout first
    assert!(failed.verdict.message.contains("inserted 1 of 2 documents"));
    assert!(failed
        .verdict
        .message
        .contains("ReferenceError: x is not defined"));
    assert!(reports[1].verdict.passed);
}

#[tokio::test]
async fn server_fault_during_case_fails_clean_exit() {
    let ctx = TestContext::new();
    // Client lingers long enough for the "server thread" to hit a fault
    // while the case is in flight.
    let client = ctx.write_client("client-slow-ok", "sleep 1; exit 0");
    let (writer, harness) = ctx.harness(&client);

    let recorder = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        writer.record(
            ServerFault::new("IllegalState: storage transaction aborted")
                .in_thread("backend-executor")
                .with_backtrace("at torod::execute_batch\nat backend::commit"),
        );
    });

    let reports = harness.run_suite("basic").await.expect("run failed");
    recorder.join().unwrap();

    let faulted = &reports[0];
    assert!(!faulted.verdict.passed, "fault must fail a clean exit");
    assert!(faulted
        .verdict
        .message
        .contains("IllegalState: storage transaction aborted"));
    assert!(faulted.verdict.message.contains("backend-executor"));
    // Exit was clean so no captured-output section appears
    assert!(!faulted.verdict.message.contains("exited with code"));
    // The fault belongs only to the case it was observed in
    assert!(reports[1].verdict.passed);
}

#[tokio::test]
async fn faults_recorded_before_the_run_are_discarded() {
    let ctx = TestContext::new();
    let client = ctx.write_client("client-ok", "exit 0");
    let (writer, harness) = ctx.harness(&client);

    // A fault left over from server startup must not be charged to the
    // first case.
    writer.record(ServerFault::new("startup hiccup"));

    let reports = harness.run().await.expect("run failed");
    assert_eq!(failed_count(&reports), 0);
}

#[tokio::test]
async fn hung_client_is_killed_and_reported_as_timeout() {
    let ctx = TestContext::new();
    let client = ctx.write_client("client-hang", "sleep 60");
    let mut config = ctx.config(&client);
    config.timeouts.case_secs = 1;

    let mut registry = SuiteRegistry::new();
    registry
        .register(SuiteSpec::new("basic", "basic").resource("insert1.js"))
        .unwrap();

    let (_writer, drain) = fault_channel();
    let harness = Harness::new(config, registry, drain);

    let started = std::time::Instant::now();
    let reports = harness.run().await.expect("run failed");
    assert!(
        started.elapsed() < Duration::from_secs(10),
        "hung client was not killed"
    );

    assert_eq!(reports.len(), 1);
    assert!(!reports[0].verdict.passed);
    assert!(reports[0].verdict.message.contains("timed out"));
}

#[tokio::test]
async fn lingering_subprocess_does_not_outlive_the_timeout() {
    let ctx = TestContext::new();
    // The forked child inherits the stdio pipes and keeps them open long
    // after its parent is killed; the harness must not wait for it.
    let client = ctx.write_client("client-forker", "sleep 60 &\nsleep 60");
    let mut config = ctx.config(&client);
    config.timeouts.case_secs = 1;

    let mut registry = SuiteRegistry::new();
    registry
        .register(SuiteSpec::new("basic", "basic").resource("insert1.js"))
        .unwrap();

    let (_writer, drain) = fault_channel();
    let harness = Harness::new(config, registry, drain);

    let started = std::time::Instant::now();
    let reports = harness.run().await.expect("run failed");
    assert!(
        started.elapsed() < Duration::from_secs(10),
        "harness waited on the client's orphaned subprocess"
    );

    assert_eq!(reports.len(), 1);
    assert!(!reports[0].verdict.passed);
    assert!(reports[0].verdict.message.contains("timed out"));
}

#[tokio::test]
async fn timeout_failure_still_reports_server_faults() {
    let ctx = TestContext::new();
    let client = ctx.write_client("client-hang", "sleep 60");
    let mut config = ctx.config(&client);
    config.timeouts.case_secs = 1;

    let mut registry = SuiteRegistry::new();
    registry
        .register(SuiteSpec::new("basic", "basic").resource("insert1.js"))
        .unwrap();

    let (writer, drain) = fault_channel();
    let harness = Harness::new(config, registry, drain);

    let recorder = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        writer.record(ServerFault::new("Deadlock: lock manager wedged"));
    });

    let reports = harness.run().await.expect("run failed");
    recorder.join().unwrap();

    assert_eq!(reports.len(), 1);
    let message = &reports[0].verdict.message;
    assert!(message.contains("timed out"), "missing timeout evidence: {message}");
    assert!(
        message.contains("Deadlock: lock manager wedged"),
        "missing fault evidence: {message}"
    );
}

#[tokio::test]
async fn missing_client_binary_is_a_setup_error() {
    let ctx = TestContext::new();
    let config = ctx.config(Path::new("/nonexistent/mongo-shell"));

    let (_writer, drain) = fault_channel();
    let harness = Harness::new(config, TestContext::basic_registry(), drain);

    let err = harness.run().await.unwrap_err();
    assert!(err.is_setup());
}
