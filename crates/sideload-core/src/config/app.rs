//! Application tunables loaded from `config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Background connection refresh interval.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 120_000;

/// Tunables for the bridge and the background monitor.
///
/// Every field has a default, so a partial or missing file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// adb executable, resolved through `PATH` when not absolute
    pub adb_path: PathBuf,
    /// Host-side aapt used to read package name and version before install
    pub aapt_path: PathBuf,
    /// Local aapt build pushed to the device when it has none
    pub device_aapt_source: Option<PathBuf>,
    pub poll_interval_ms: u64,
    pub install_timeout_secs: u64,
    pub command_timeout_secs: u64,
    /// Skip `adb install` when the same version is already on the device
    pub skip_installed: bool,
    /// Notify on Connected/Disconnected transitions
    pub announce_connection_changes: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            adb_path: PathBuf::from("adb"),
            aapt_path: PathBuf::from("aapt"),
            device_aapt_source: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            install_timeout_secs: 60,
            command_timeout_secs: 15,
            skip_installed: true,
            announce_connection_changes: false,
        }
    }
}

impl AppConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file; using defaults");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Failed to read config file: {}", path.display())
                });
            }
        };
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        if config.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms must be greater than zero");
        }
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.install_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}
