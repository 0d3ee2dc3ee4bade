//! Configuration for the deployment core.
//!
//! Two layers live here:
//! - the persisted target settings (host address, default package directory),
//!   read and written through a [`SettingsStore`]
//! - the application tunables in `config.toml` ([`AppConfig`])

pub mod app;
pub mod paths;
pub mod store;
pub mod target;

pub use app::AppConfig;
pub use paths::{app_config_path, config_dir, settings_path};
pub use store::{FileSettingsStore, MemorySettingsStore, SettingsStore};
pub use target::{TargetConfig, TargetConfigStore, validate_address};

/// Settings key holding the target device address.
pub const HOST_ADDRESS_KEY: &str = "host-address";

/// Settings key holding the directory browsed for package files.
pub const DEFAULT_APP_DIR_KEY: &str = "default-app-dir";
