//! Package files available in the default package directory.

use std::sync::Arc;

use crate::bridge::Bridge;
use crate::config::{SettingsStore, TargetConfigStore};
use crate::error::BridgeError;
use crate::package::PackageRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryListing {
    DirectoryNotSet,
    Empty,
    Packages(Vec<PackageRef>),
}

/// Browses the configured default package directory.
#[derive(Debug)]
pub struct PackageLibrary<B, S> {
    bridge: Arc<B>,
    target: TargetConfigStore<S>,
}

impl<B: Bridge, S: SettingsStore> PackageLibrary<B, S> {
    pub fn new(bridge: Arc<B>, target: TargetConfigStore<S>) -> Self {
        Self { bridge, target }
    }

    pub async fn list(&self) -> Result<LibraryListing, BridgeError> {
        let Some(dir) = self.target.default_package_dir().await else {
            return Ok(LibraryListing::DirectoryNotSet);
        };
        let files = self.bridge.list_package_files(&dir).await?;
        if files.is_empty() {
            return Ok(LibraryListing::Empty);
        }
        Ok(LibraryListing::Packages(
            files
                .iter()
                .map(|path| PackageRef::from_path(&path.to_string_lossy()))
                .collect(),
        ))
    }
}
