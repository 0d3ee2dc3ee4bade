//! Shared fakes for integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;

use sideload_core::bridge::{Bridge, InstalledPackage};
use sideload_core::config::{HOST_ADDRESS_KEY, MemorySettingsStore, TargetConfigStore};
use sideload_core::deploy::DeploymentOutcome;
use sideload_core::error::{BridgeError, NotifyError};
use sideload_core::monitor::ConnectionMonitor;
use sideload_core::notify::Notifier;
use sideload_core::package::PackageRef;
use sideload_core::state::{SessionObserver, SessionState};
use sideload_core::status::ConnectionStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect(String),
    Install(String),
    ListFiles(PathBuf),
    ListInstalled,
    Probe(String),
}

/// Scripted bridge that records every call.
#[derive(Debug, Default)]
pub struct FakeBridge {
    pub reachable: AtomicBool,
    pub probe_errors: AtomicBool,
    pub connect_error: Mutex<Option<String>>,
    pub connect_output: Mutex<String>,
    failing_installs: Mutex<HashSet<String>>,
    installed: Mutex<Vec<InstalledPackage>>,
    files: Mutex<Vec<PathBuf>>,
    calls: Mutex<Vec<Call>>,
    probe_gate: Option<Arc<Semaphore>>,
    probes_in_flight: AtomicUsize,
    max_probes_in_flight: AtomicUsize,
}

impl FakeBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probes block until a permit is added to the returned semaphore.
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let bridge = Self {
            probe_gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (bridge, gate)
    }

    pub fn reachable(self) -> Self {
        self.reachable.store(true, Ordering::SeqCst);
        self
    }

    pub fn fail_install_of(&self, file_name: &str) {
        self.failing_installs
            .lock()
            .unwrap()
            .insert(file_name.to_string());
    }

    pub fn fail_connect(&self, message: &str) {
        *self.connect_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn set_installed(&self, packages: Vec<InstalledPackage>) {
        *self.installed.lock().unwrap() = packages;
    }

    pub fn set_files(&self, files: Vec<PathBuf>) {
        *self.files.lock().unwrap() = files;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn probe_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Probe(_)))
            .count()
    }

    pub fn max_probes_in_flight(&self) -> usize {
        self.max_probes_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Bridge for FakeBridge {
    async fn connect(&self, address: &str) -> Result<String, BridgeError> {
        self.record(Call::Connect(address.to_string()));
        match self.connect_error.lock().unwrap().clone() {
            Some(stderr) => Err(BridgeError::CommandFailed {
                command: format!("adb connect {address}"),
                stderr,
            }),
            None => Ok(self.connect_output.lock().unwrap().clone()),
        }
    }

    async fn install(&self, path: &Path) -> Result<String, BridgeError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.record(Call::Install(file_name.clone()));
        if self.failing_installs.lock().unwrap().contains(&file_name) {
            return Err(BridgeError::CommandFailed {
                command: format!("adb install {}", path.display()),
                stderr: format!("INSTALL_FAILED_INVALID_APK: {file_name}"),
            });
        }
        Ok("Performing Streamed Install\nSuccess\n".to_string())
    }

    async fn list_package_files(&self, dir: &Path) -> Result<Vec<PathBuf>, BridgeError> {
        self.record(Call::ListFiles(dir.to_path_buf()));
        Ok(self.files.lock().unwrap().clone())
    }

    async fn list_installed_packages(&self) -> Result<Vec<InstalledPackage>, BridgeError> {
        self.record(Call::ListInstalled);
        Ok(self.installed.lock().unwrap().clone())
    }

    async fn is_reachable(&self, address: &str) -> Result<bool, BridgeError> {
        self.record(Call::Probe(address.to_string()));
        let now = self.probes_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_probes_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(gate) = &self.probe_gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        self.probes_in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.probe_errors.load(Ordering::SeqCst) {
            return Err(BridgeError::Timeout {
                command: "adb devices".to_string(),
                after: std::time::Duration::from_secs(15),
            });
        }
        Ok(self.reachable.load(Ordering::SeqCst))
    }
}

/// Notifier that always grants permission and records what was sent.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn titles(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(title, _)| title.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn permission_granted(&self) -> bool {
        true
    }

    fn request_permission(&self) -> bool {
        true
    }

    fn send(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}

/// Observer that records every callback.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub selections: Mutex<Vec<Vec<PackageRef>>>,
    pub outcomes: Mutex<Vec<DeploymentOutcome>>,
    pub statuses: Mutex<Vec<(ConnectionStatus, ConnectionStatus)>>,
    pub installed: Mutex<Vec<Vec<InstalledPackage>>>,
    pub transcript: Mutex<Vec<String>>,
}

impl SessionObserver for RecordingObserver {
    fn on_selection_changed(&self, selection: &[PackageRef]) {
        self.selections.lock().unwrap().push(selection.to_vec());
    }

    fn on_outcome(&self, outcome: &DeploymentOutcome) {
        self.outcomes.lock().unwrap().push(outcome.clone());
    }

    fn on_connection_status_changed(&self, previous: ConnectionStatus, current: ConnectionStatus) {
        self.statuses.lock().unwrap().push((previous, current));
    }

    fn on_installed_packages(&self, packages: &[InstalledPackage]) {
        self.installed.lock().unwrap().push(packages.to_vec());
    }

    fn on_transcript_entry(&self, entry: &sideload_core::transcript::TranscriptEntry) {
        self.transcript.lock().unwrap().push(entry.message.clone());
    }
}

pub fn target_with_address(address: Option<&str>) -> TargetConfigStore<MemorySettingsStore> {
    let store = match address {
        Some(address) => MemorySettingsStore::new().with_value(HOST_ADDRESS_KEY, address),
        None => MemorySettingsStore::new(),
    };
    TargetConfigStore::new(Arc::new(store))
}

pub fn monitor_with(
    bridge: Arc<FakeBridge>,
    address: Option<&str>,
) -> Arc<ConnectionMonitor<FakeBridge, MemorySettingsStore>> {
    Arc::new(ConnectionMonitor::new(
        bridge,
        target_with_address(address),
        SessionState::new(),
    ))
}

pub fn installed(label: &str) -> InstalledPackage {
    InstalledPackage {
        package_name: format!("com.example.{}", label.to_lowercase()),
        version_name: "1.0".to_string(),
        version_code: "1".to_string(),
        display_label: label.to_string(),
    }
}
