//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Server-under-test connection settings
    #[serde(default)]
    pub target: TargetConfig,

    /// External client settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Script resource settings
    #[serde(default)]
    pub scripts: ScriptsConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// Where the server-under-test is listening
#[derive(Debug, Deserialize)]
pub struct TargetConfig {
    /// Bind address of the server-under-test
    #[serde(default = "default_bind_ip")]
    pub bind_ip: String,

    /// Port the server-under-test listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name the client scripts run against
    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            bind_ip: default_bind_ip(),
            port: default_port(),
            database: default_database(),
        }
    }
}

fn default_bind_ip() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    27018
}
fn default_database() -> String {
    "compat".to_string()
}

/// External client process settings
#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    /// Client binary name or explicit path
    #[serde(default = "default_client_binary")]
    pub binary: PathBuf,

    /// Shared setup script loaded before every case script
    #[serde(default = "default_setup_script")]
    pub setup_script: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            binary: default_client_binary(),
            setup_script: default_setup_script(),
        }
    }
}

fn default_client_binary() -> PathBuf {
    PathBuf::from("mongo")
}
fn default_setup_script() -> PathBuf {
    PathBuf::from("setup.js")
}

/// Script resource namespace settings
#[derive(Debug, Deserialize)]
pub struct ScriptsConfig {
    /// Root directory the prefix + resource-name scheme resolves against
    #[serde(default = "default_scripts_root")]
    pub root: PathBuf,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            root: default_scripts_root(),
        }
    }
}

fn default_scripts_root() -> PathBuf {
    PathBuf::from("scripts")
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Per-case wait on the client process; 0 means wait forever
    #[serde(default = "default_case_secs")]
    pub case_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            case_secs: default_case_secs(),
        }
    }
}

fn default_case_secs() -> u64 {
    300
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns default configuration if `path` is `None` or does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if path.exists() {
                let content =
                    std::fs::read_to_string(path).map_err(|e| Error::FileRead {
                        path: path.display().to_string(),
                        error: e.to_string(),
                    })?;
                return toml::from_str(&content)
                    .map_err(|e| Error::ConfigParse(e.to_string()));
            }
        }
        Ok(Self::default())
    }

    /// Render the `<host>:<port>/<database>` target address
    pub fn target_address(&self) -> String {
        format!(
            "{}:{}/{}",
            self.target.bind_ip, self.target.port, self.target.database
        )
    }

    /// Resolve the client binary to a concrete path
    ///
    /// An explicit path (anything with a separator) is taken as-is;
    /// a bare name is searched on PATH.
    pub fn resolve_client(&self) -> Result<PathBuf> {
        if self.client.binary.components().count() > 1 {
            if self.client.binary.exists() {
                return Ok(self.client.binary.clone());
            }
            return Err(Error::client_not_found(
                &self.client.binary.display().to_string(),
                &[self.client.binary.display().to_string()],
            ));
        }

        let name = self.client.binary.display().to_string();
        which::which(&name).map_err(|_| {
            let path = std::env::var("PATH").unwrap_or_default();
            Error::client_not_found(&name, &path.split(':').collect::<Vec<_>>())
        })
    }

    /// Per-case timeout, with 0 mapped to "no timeout"
    pub fn case_timeout(&self) -> Option<Duration> {
        match self.timeouts.case_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
