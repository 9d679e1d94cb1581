//! Case execution
//!
//! Runs one external client process per case and captures everything it
//! writes. Both stdio pipes are drained to end-of-stream concurrently with
//! the wait; a child whose pipe buffer fills can otherwise deadlock
//! against a harness blocked in `wait()`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::common::{Config, Error, Result};
use crate::suite::CaseDescriptor;

/// What one client invocation produced
///
/// Owned by a single case; dropped after verdict rendering.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Render the captured streams as text, stdout first then stderr
    ///
    /// Buffers are always captured eagerly; this lossy conversion is the
    /// lazy part, done only when a diagnostic message is built.
    pub fn combined_text(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&self.stderr));
        text
    }
}

/// Resolve a script resource under the scripts root
///
/// A missing script is a fatal setup error, not a case failure: the suite
/// declaration promised a resource that does not exist.
pub fn resolve_script(root: &Path, relative: &Path) -> Result<PathBuf> {
    let path = root.join(relative);
    if path.is_file() {
        Ok(path)
    } else {
        Err(Error::ScriptMissing { path })
    }
}

/// Run one case to completion and capture its outcome
///
/// Invokes the client as `[binary, "<host>:<port>/<database>",
/// <setup-script>, <case-script>]` and waits for natural termination,
/// bounded by `timeout` when one is given. On expiry the client is killed
/// and a `CaseTimeout` error is returned. The shared setup script is
/// re-resolved on every call so cases stay independent.
pub async fn run_case(
    config: &Config,
    descriptor: &CaseDescriptor,
    timeout: Option<Duration>,
) -> Result<ProcessOutcome> {
    let client = config.resolve_client()?;
    let setup_script = resolve_script(&config.scripts.root, &config.client.setup_script)?;
    let case_script = resolve_script(&config.scripts.root, &descriptor.relative_path())?;
    let address = config.target_address();

    tracing::debug!(
        client = %client.display(),
        %address,
        script = %case_script.display(),
        "spawning client"
    );

    let mut child = Command::new(&client)
        .arg(&address)
        .arg(&setup_script)
        .arg(&case_script)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::spawn_failed(&client.display().to_string(), &e))?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| Error::Internal("client stdout not captured".to_string()))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| Error::Internal("client stderr not captured".to_string()))?;

    // The drains run as independent tasks. The pipes stay open as long as
    // ANY process holding the inherited fds lives, so a client that forked
    // a subprocess keeps them open past its own death — the timeout path
    // must be able to walk away from these reads.
    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stdout_pipe.read_to_end(&mut buf).await;
        buf
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stderr_pipe.read_to_end(&mut buf).await;
        buf
    });

    let status = match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                let _ = child.kill().await;
                stdout_task.abort();
                stderr_task.abort();
                return Err(Error::CaseTimeout {
                    resource: descriptor.to_string(),
                    secs: limit.as_secs(),
                });
            }
        },
        None => child.wait().await?,
    };

    // Natural termination: drain both streams to end-of-stream before
    // looking at the exit status.
    let stdout = stdout_task
        .await
        .map_err(|e| Error::Internal(format!("stdout drain task failed: {e}")))?;
    let stderr = stderr_task
        .await
        .map_err(|e| Error::Internal(format!("stderr drain task failed: {e}")))?;

    let exit_code = status.code().ok_or(Error::NoExitCode)?;
    tracing::debug!(case = %descriptor, exit_code, "client exited");

    Ok(ProcessOutcome {
        exit_code,
        stdout,
        stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_text_orders_stdout_before_stderr() {
        let outcome = ProcessOutcome {
            exit_code: 1,
            stdout: b"assert failed at line 3\n".to_vec(),
            stderr: b"ReferenceError: x is not defined\n".to_vec(),
        };
        let text = outcome.combined_text();
        let out_at = text.find("assert failed").unwrap();
        let err_at = text.find("ReferenceError").unwrap();
        assert!(out_at < err_at);
    }

    #[test]
    fn test_combined_text_is_lossy_not_fallible() {
        let outcome = ProcessOutcome {
            exit_code: 1,
            stdout: vec![0xff, 0xfe],
            stderr: Vec::new(),
        };
        assert!(!outcome.combined_text().is_empty());
    }

    #[test]
    fn test_resolve_script_missing_is_setup_error() {
        let err = resolve_script(Path::new("/nonexistent"), Path::new("core/a.js")).unwrap_err();
        assert!(err.is_setup());
        assert!(matches!(err, Error::ScriptMissing { .. }));
    }
}
