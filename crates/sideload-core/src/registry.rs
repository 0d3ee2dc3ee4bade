//! Selection registry: the queue of package files the user picked or dropped.

use std::sync::Arc;

use crate::error::ValidationError;
use crate::package::PackageRef;
use crate::state::SessionState;

/// Result of [`SelectionRegistry::add_from_paths`].
#[derive(Debug, Clone, Default)]
pub struct AddReport {
    pub accepted: Vec<PackageRef>,
    pub rejected: Vec<ValidationError>,
}

impl AddReport {
    pub fn has_rejections(&self) -> bool {
        !self.rejected.is_empty()
    }
}

/// Ordered queue of [`PackageRef`]s held in the [`SessionState`].
///
/// Duplicates are allowed; removal matches on normalized path.
#[derive(Debug, Clone)]
pub struct SelectionRegistry {
    state: Arc<SessionState>,
}

impl SelectionRegistry {
    pub fn new(state: Arc<SessionState>) -> Self {
        Self { state }
    }

    /// Queue every path whose media kind is a package; reject the rest.
    pub fn add_from_paths<I, P>(&self, paths: I) -> AddReport
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        self.add_refs(paths.into_iter().map(|p| PackageRef::from_path(p.as_ref())))
    }

    /// Queue pre-built references, e.g. ones carrying a dialog-provided MIME type.
    pub fn add_refs(&self, refs: impl IntoIterator<Item = PackageRef>) -> AddReport {
        let mut report = AddReport::default();
        for package in refs {
            if package.is_package() {
                report.accepted.push(package);
            } else {
                tracing::warn!(
                    path = %package.source_path,
                    kind = %package.media_kind,
                    "Rejected non-package file"
                );
                report.rejected.push(ValidationError::NotAPackage {
                    path: package.source_path,
                    media_kind: package.media_kind,
                });
            }
        }

        if !report.accepted.is_empty() {
            let accepted = report.accepted.clone();
            self.state.update_selection(|queue| {
                queue.extend(accepted);
                ((), true)
            });
            tracing::debug!(count = report.accepted.len(), "Queued packages");
        }
        report
    }

    /// Remove every entry matching `path`. Returns `false` when nothing matched.
    pub fn remove(&self, path: &str) -> bool {
        self.state.update_selection(|queue| {
            let before = queue.len();
            queue.retain(|package| !package.matches_path(path));
            let removed = queue.len() != before;
            (removed, removed)
        })
    }

    pub fn clear(&self) {
        self.state.update_selection(|queue| {
            queue.clear();
            ((), true)
        });
    }

    pub fn current_selection(&self) -> Vec<PackageRef> {
        self.state.selection_snapshot()
    }

    /// Drives whether "install all" / "remove all" are offered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.state.selection_len()
    }
}
