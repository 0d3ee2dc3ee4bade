mod support;

use std::sync::Arc;

use tempfile::TempDir;

use sideload_core::context::AppContext;
use sideload_core::deploy::LibraryListing;
use sideload_core::status::ConnectionStatus;

use support::RecordingNotifier;

const MISSING_ADB: &str = "adb_path = \"/nonexistent/platform-tools/adb\"\n";

fn write_config(dir: &TempDir, content: &str) {
    std::fs::write(dir.path().join("config.toml"), content).unwrap();
}

async fn open(dir: &TempDir) -> AppContext {
    AppContext::open(
        dir.path().to_path_buf(),
        Arc::new(RecordingNotifier::default()),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn fresh_directory_uses_defaults() {
    let dir = TempDir::new().unwrap();

    let ctx = open(&dir).await;

    assert_eq!(ctx.config().poll_interval_ms, 120_000);
    assert_eq!(ctx.target().host_address().await, None);
    assert!(ctx.registry().is_empty());
    assert_eq!(ctx.state().connection_status(), ConnectionStatus::Unknown);
}

#[tokio::test]
async fn host_address_survives_restart() {
    let dir = TempDir::new().unwrap();
    {
        let ctx = open(&dir).await;
        ctx.target().set_host_address(" 10.0.0.9:5555 ").await.unwrap();
    }

    let ctx = open(&dir).await;

    assert_eq!(
        ctx.target().host_address().await.as_deref(),
        Some("10.0.0.9:5555")
    );
    assert!(dir.path().join("settings.toml").exists());
}

#[tokio::test]
async fn config_file_is_applied() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "poll_interval_ms = 5000\nskip_installed = false\n");

    let ctx = open(&dir).await;

    assert_eq!(ctx.config().poll_interval_ms, 5000);
    assert!(!ctx.config().skip_installed);
}

#[tokio::test]
async fn invalid_config_fails_to_open() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "poll_interval_ms = 0\n");

    let result = AppContext::open(
        dir.path().to_path_buf(),
        Arc::new(RecordingNotifier::default()),
    )
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn unreachable_bridge_reports_disconnected() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, MISSING_ADB);
    let ctx = open(&dir).await;
    ctx.target().set_host_address("10.0.0.9:5555").await.unwrap();

    let status = ctx.monitor().check_connection().await;

    assert_eq!(status, ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn library_lists_package_files_from_disk() {
    let dir = TempDir::new().unwrap();
    let apks = TempDir::new().unwrap();
    for name in ["b.apk", "a.APK", "notes.txt"] {
        std::fs::write(apks.path().join(name), b"").unwrap();
    }
    std::fs::create_dir(apks.path().join("nested.apk")).unwrap();
    let ctx = open(&dir).await;

    assert_eq!(
        ctx.library().list().await.unwrap(),
        LibraryListing::DirectoryNotSet
    );

    ctx.target()
        .set_default_package_dir(apks.path())
        .await
        .unwrap();
    let LibraryListing::Packages(found) = ctx.library().list().await.unwrap() else {
        panic!("expected packages");
    };
    let mut names: Vec<&str> = found.iter().map(|p| p.display_name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["a.APK", "b.apk"]);
}
