//! Host-side bridge to the target device.
//!
//! [`Bridge`] is the seam between the deployment core and whatever actually
//! talks to the device. [`AdbBridge`] drives the `adb` executable.

pub mod adb;
pub mod parse;

use std::cmp::Ordering;
use std::future::Future;
use std::path::{Path, PathBuf};

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::error::BridgeError;

pub use adb::{AdbBridge, AdbSettings};

/// A third-party package installed on the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledPackage {
    pub package_name: String,
    pub version_name: String,
    pub version_code: String,
    pub display_label: String,
}

/// Device operations the core depends on.
///
/// Each call is a single attempt; callers own any retry policy.
pub trait Bridge: Send + Sync {
    /// Make the target reachable at `address`, returning the bridge's
    /// diagnostic output (empty when there was nothing to do).
    fn connect(&self, address: &str) -> impl Future<Output = Result<String, BridgeError>> + Send;

    /// Install the package file at `path`, returning the bridge's output.
    fn install(&self, path: &Path) -> impl Future<Output = Result<String, BridgeError>> + Send;

    /// Package files directly inside `dir`.
    fn list_package_files(
        &self,
        dir: &Path,
    ) -> impl Future<Output = Result<Vec<PathBuf>, BridgeError>> + Send;

    fn list_installed_packages(
        &self,
    ) -> impl Future<Output = Result<Vec<InstalledPackage>, BridgeError>> + Send;

    fn is_reachable(&self, address: &str) -> impl Future<Output = Result<bool, BridgeError>> + Send;
}

/// Order labels the way a user expects to read them: accents and case are
/// ignored first, then case-folded labels, then the exact label so the order
/// is total.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Lowercase with diacritics stripped (NFD, combining marks dropped).
fn collation_key(label: &str) -> String {
    label
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn sort_by_label(packages: &mut [InstalledPackage]) {
    packages.sort_by(|a, b| compare_labels(&a.display_label, &b.display_label));
}
