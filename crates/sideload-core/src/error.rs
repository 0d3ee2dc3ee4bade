//! Error taxonomy for the deployment core.
//!
//! Connectivity loss is absent here: an unreachable target is
//! reported as [`crate::status::ConnectionStatus::Disconnected`], not as an error.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Input rejected before any state was touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Host address must not be empty")]
    EmptyAddress,

    #[error("Please select an APK file: {path} ({media_kind})")]
    NotAPackage { path: String, media_kind: String },
}

/// Failure of a single bridge call.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Failed to execute {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} timed out after {}s", .after.as_secs())]
    Timeout { command: String, after: Duration },

    #[error("{stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Host address not configured")]
    AddressNotConfigured,

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of the persistent settings store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Settings I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file {} is not valid TOML: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Error returned by target configuration edits.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Delivery failure reported by a [`crate::notify::Notifier`].
#[derive(Debug, Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);
