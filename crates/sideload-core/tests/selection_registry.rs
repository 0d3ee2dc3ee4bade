mod support;

use std::sync::Arc;

use sideload_core::error::ValidationError;
use sideload_core::package::{PACKAGE_MIME_TYPE, PackageRef};
use sideload_core::registry::SelectionRegistry;
use sideload_core::state::SessionState;

use support::RecordingObserver;

fn registry() -> (SelectionRegistry, Arc<RecordingObserver>) {
    let state = SessionState::new();
    let observer = Arc::new(RecordingObserver::default());
    state.subscribe(observer.clone());
    (SelectionRegistry::new(state), observer)
}

fn names(registry: &SelectionRegistry) -> Vec<String> {
    registry
        .current_selection()
        .into_iter()
        .map(|p| p.display_name)
        .collect()
}

#[test]
fn preserves_order_and_duplicates() {
    let (registry, _) = registry();

    let report = registry.add_from_paths(["/apks/b.apk", "/apks/a.apk", "/apks/b.apk"]);

    assert_eq!(report.accepted.len(), 3);
    assert!(!report.has_rejections());
    assert_eq!(names(&registry), ["b.apk", "a.apk", "b.apk"]);
    assert_eq!(registry.len(), 3);
}

#[test]
fn rejected_file_leaves_queue_unchanged() {
    let (registry, observer) = registry();
    registry.add_from_paths(["/apks/a.apk"]);

    let report = registry.add_from_paths(["/docs/readme.txt"]);

    assert!(report.accepted.is_empty());
    assert_eq!(
        report.rejected,
        vec![ValidationError::NotAPackage {
            path: "/docs/readme.txt".to_string(),
            media_kind: "txt".to_string(),
        }]
    );
    assert_eq!(names(&registry), ["a.apk"]);
    assert_eq!(observer.selections.lock().unwrap().len(), 1);
}

#[test]
fn mixed_batch_queues_only_packages() {
    let (registry, _) = registry();

    let report = registry.add_from_paths(["/apks/a.APK", "/apks/notes", "C:\\apks\\c.apk"]);

    assert_eq!(report.accepted.len(), 2);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(names(&registry), ["a.APK", "c.apk"]);
}

#[test]
fn dialog_media_type_is_accepted() {
    let (registry, _) = registry();
    let package = PackageRef::from_path("/downloads/blob").with_media_kind(PACKAGE_MIME_TYPE);

    let report = registry.add_refs([package]);

    assert_eq!(report.accepted.len(), 1);
    assert_eq!(registry.len(), 1);
}

#[test]
fn remove_drops_matches_and_is_idempotent() {
    let (registry, observer) = registry();
    registry.add_from_paths(["/apks/a.apk", "/apks/b.apk", "/apks/a.apk"]);

    assert!(registry.remove("/apks/a.apk"));
    assert_eq!(names(&registry), ["b.apk"]);

    assert!(!registry.remove("/apks/a.apk"));
    assert!(!registry.remove("/apks/missing.apk"));
    assert_eq!(names(&registry), ["b.apk"]);

    // One notification for the add, one for the effective remove.
    assert_eq!(observer.selections.lock().unwrap().len(), 2);
}

#[test]
fn remove_matches_across_separators() {
    let (registry, _) = registry();
    registry.add_from_paths(["C:\\apks\\a.apk"]);

    assert!(registry.remove("C:/apks/a.apk"));
    assert!(registry.is_empty());
}

#[test]
fn clear_empties_queue_and_notifies() {
    let (registry, observer) = registry();
    registry.add_from_paths(["/apks/a.apk", "/apks/b.apk"]);
    assert!(!registry.is_empty());

    registry.clear();

    assert!(registry.is_empty());
    let selections = observer.selections.lock().unwrap();
    assert_eq!(selections.len(), 2);
    assert!(selections[1].is_empty());
}

#[test]
fn clones_share_the_same_queue() {
    let (registry, _) = registry();
    let other = registry.clone();

    other.add_from_paths(["/apks/a.apk"]);

    assert_eq!(registry.len(), 1);
}
