//! Typed access to the persisted target settings.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use super::store::SettingsStore;
use super::{DEFAULT_APP_DIR_KEY, HOST_ADDRESS_KEY};
use crate::error::{ConfigError, ValidationError};

/// Snapshot of the persisted target settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TargetConfig {
    /// `None` when unconfigured; otherwise non-empty and trimmed.
    pub address: Option<String>,
    pub default_package_dir: Option<PathBuf>,
}

/// Validate a user-entered host address, returning the trimmed form.
pub fn validate_address(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyAddress);
    }
    Ok(trimmed.to_string())
}

/// Reads and writes [`TargetConfig`] through a [`SettingsStore`].
///
/// Reads never fail: a store error or an empty value reads as unconfigured.
/// Writes surface store errors and are flushed before returning.
#[derive(Debug)]
pub struct TargetConfigStore<S> {
    store: Arc<S>,
}

impl<S> Clone for TargetConfigStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: SettingsStore> TargetConfigStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn host_address(&self) -> Option<String> {
        // Older settings files stored the JSON-encoded string, quotes included.
        self.read(HOST_ADDRESS_KEY)
            .await
            .map(|value| value.trim().trim_matches('"').trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub async fn set_host_address(&self, raw: &str) -> Result<String, ConfigError> {
        let address = validate_address(raw)?;
        self.write(HOST_ADDRESS_KEY, &address).await?;
        tracing::info!(address = %address, "Host address updated");
        Ok(address)
    }

    pub async fn default_package_dir(&self) -> Option<PathBuf> {
        self.read(DEFAULT_APP_DIR_KEY)
            .await
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
    }

    pub async fn set_default_package_dir(&self, dir: &Path) -> Result<(), ConfigError> {
        self.write(DEFAULT_APP_DIR_KEY, &dir.to_string_lossy()).await?;
        tracing::info!(dir = %dir.display(), "Default package directory updated");
        Ok(())
    }

    pub async fn load(&self) -> TargetConfig {
        TargetConfig {
            address: self.host_address().await,
            default_package_dir: self.default_package_dir().await,
        }
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, error = %err, "Failed to read setting; treating as unset");
                None
            }
        }
    }

    /// Set and flush `key`. A failed flush restores the previous in-memory
    /// value so readers never see a setting that was not persisted.
    async fn write(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let previous = self.store.get(key).await?;
        self.store.set(key, value).await?;
        if let Err(err) = self.store.flush().await {
            tracing::warn!(key, error = %err, "Failed to persist setting; rolling back");
            let restored = match previous {
                Some(previous) => self.store.set(key, &previous).await,
                None => self.store.remove(key).await,
            };
            if let Err(restore_err) = restored {
                tracing::warn!(key, error = %restore_err, "Failed to roll back setting");
            }
            return Err(err.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_address_trims() {
        assert_eq!(
            validate_address("  192.168.1.20:5555 \n").unwrap(),
            "192.168.1.20:5555"
        );
    }

    #[test]
    fn validate_address_rejects_blank() {
        assert_eq!(validate_address(""), Err(ValidationError::EmptyAddress));
        assert_eq!(validate_address(" \t "), Err(ValidationError::EmptyAddress));
    }
}
