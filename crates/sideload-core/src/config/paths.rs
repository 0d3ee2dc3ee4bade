//! Config path resolution helpers.

use std::path::{Path, PathBuf};

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "SIDELOAD_CONFIG_DIR";

/// Resolve the sideload configuration directory.
///
/// `SIDELOAD_CONFIG_DIR` wins; otherwise `<platform config dir>/sideload`.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(base.join("sideload"))
}

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join("settings.toml")
}

pub fn app_config_path(config_dir: &Path) -> PathBuf {
    config_dir.join("config.toml")
}
