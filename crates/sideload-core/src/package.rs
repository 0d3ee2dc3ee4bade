//! Package file references queued for deployment.

use std::path::Path;

use serde::Serialize;
use url::Url;

/// Media kind accepted by the selection registry, as reported by file dialogs.
pub const PACKAGE_MIME_TYPE: &str = "application/vnd.android.package-archive";

/// File extension accepted by the selection registry.
pub const PACKAGE_EXTENSION: &str = "apk";

/// A package file chosen by the user.
///
/// Two references are the same entity when their normalized paths match,
/// regardless of path separator style.
#[derive(Debug, Clone, Serialize)]
pub struct PackageRef {
    pub source_path: String,
    pub display_name: String,
    pub media_kind: String,
}

impl PackageRef {
    /// Build a reference from a dropped or picked path.
    ///
    /// `file://` URLs are converted to filesystem paths (percent-decoding the
    /// name); anything else is taken as a plain path.
    pub fn from_path(raw: &str) -> Self {
        let source_path = file_url_to_path(raw).unwrap_or_else(|| raw.to_string());
        let normalized = normalize_path(&source_path);
        let display_name = normalized
            .rsplit('/')
            .next()
            .unwrap_or(normalized.as_str())
            .to_string();
        let media_kind = display_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_string())
            .unwrap_or_default();

        Self {
            source_path,
            display_name,
            media_kind,
        }
    }

    /// Build a reference with an explicit media kind (e.g. a MIME type from a
    /// file dialog) instead of the extension.
    pub fn with_media_kind(mut self, media_kind: impl Into<String>) -> Self {
        self.media_kind = media_kind.into();
        self
    }

    pub fn normalized_path(&self) -> String {
        normalize_path(&self.source_path)
    }

    pub fn matches_path(&self, path: &str) -> bool {
        self.normalized_path() == normalize_path(path)
    }

    pub fn is_package(&self) -> bool {
        is_package_kind(&self.media_kind)
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.source_path)
    }
}

impl PartialEq for PackageRef {
    fn eq(&self, other: &Self) -> bool {
        self.normalized_path() == other.normalized_path()
    }
}

impl Eq for PackageRef {}

/// Fold backslashes to forward slashes.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

pub fn is_package_kind(media_kind: &str) -> bool {
    media_kind.eq_ignore_ascii_case(PACKAGE_EXTENSION) || media_kind == PACKAGE_MIME_TYPE
}

fn file_url_to_path(raw: &str) -> Option<String> {
    if !raw.starts_with("file:") {
        return None;
    }
    let url = Url::parse(raw).ok()?;
    let path = url.to_file_path().ok()?;
    Some(path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_name_and_kind_from_windows_path() {
        let pkg = PackageRef::from_path(r"C:\Users\me\Downloads\Signal.apk");
        assert_eq!(pkg.display_name, "Signal.apk");
        assert_eq!(pkg.media_kind, "apk");
        assert_eq!(pkg.normalized_path(), "C:/Users/me/Downloads/Signal.apk");
        assert!(pkg.is_package());
    }

    #[test]
    fn identity_ignores_separator_style() {
        let a = PackageRef::from_path(r"dir\sub\app.apk");
        let b = PackageRef::from_path("dir/sub/app.apk");
        assert_eq!(a, b);
        assert!(a.matches_path("dir/sub/app.apk"));
    }

    #[cfg(unix)]
    #[test]
    fn file_url_is_decoded() {
        let pkg = PackageRef::from_path("file:///tmp/My%20App.apk");
        assert_eq!(pkg.source_path, "/tmp/My App.apk");
        assert_eq!(pkg.display_name, "My App.apk");
    }

    #[test]
    fn extensionless_file_has_empty_kind() {
        let pkg = PackageRef::from_path("/tmp/README");
        assert_eq!(pkg.media_kind, "");
        assert!(!pkg.is_package());
    }

    #[test]
    fn mime_type_is_accepted() {
        let pkg = PackageRef::from_path("/tmp/download").with_media_kind(PACKAGE_MIME_TYPE);
        assert!(pkg.is_package());
        assert!(is_package_kind("APK"));
        assert!(!is_package_kind("zip"));
    }
}
