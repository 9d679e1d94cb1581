//! Error types for the harness
//!
//! Setup errors are fatal and abort the whole run before (or between)
//! cases; they are never attributed to an individual case's verdict.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Suite/setup errors (fatal, pre-run) ===
    #[error("Unknown suite '{0}'. Use 'compat-harness list' to see registered suites")]
    SuiteNotFound(String),

    #[error("Suite '{suite}' declares no script resources")]
    EmptySuite { suite: String },

    #[error("Suite '{suite}' declares duplicate resource '{resource}'")]
    DuplicateResource { suite: String, resource: String },

    #[error("Script resource not found: {}", path.display())]
    ScriptMissing { path: PathBuf },

    #[error("Client binary '{name}' not found. Searched: {searched}")]
    ClientNotFound { name: String, searched: String },

    // === Case execution errors ===
    #[error("Failed to spawn client '{client}': {error}")]
    SpawnFailed { client: String, error: String },

    #[error("Case '{resource}' timed out after {secs} seconds; client process was killed")]
    CaseTimeout { resource: String, secs: u64 },

    #[error("Client exited without an exit code (killed by signal?)")]
    NoExitCode,

    // === Configuration errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a client not found error with search paths
    pub fn client_not_found<S: AsRef<str>>(name: &str, paths: &[S]) -> Self {
        Self::ClientNotFound {
            name: name.to_string(),
            searched: paths
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Create a spawn failure error
    pub fn spawn_failed(client: &str, error: &io::Error) -> Self {
        Self::SpawnFailed {
            client: client.to_string(),
            error: error.to_string(),
        }
    }

    /// Whether this error is fatal to the whole run rather than one case
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Error::SuiteNotFound(_)
                | Error::EmptySuite { .. }
                | Error::DuplicateResource { .. }
                | Error::ScriptMissing { .. }
                | Error::ClientNotFound { .. }
                | Error::Config(_)
                | Error::ConfigParse(_)
        )
    }
}
