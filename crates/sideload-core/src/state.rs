//! Process-scope session state shared by the registry, monitor and orchestrator.
//!
//! Front-ends create one [`SessionState`] at startup and hand the `Arc` to each
//! component constructor. All change notifications flow out through
//! [`SessionObserver`]s; the core never calls into UI code directly.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use crate::bridge::InstalledPackage;
use crate::deploy::DeploymentOutcome;
use crate::package::PackageRef;
use crate::status::ConnectionStatus;
use crate::transcript::{Transcript, TranscriptEntry, TranscriptLevel};

/// Subscription interface for front-ends.
///
/// Callbacks run synchronously on the thread that made the change and must not
/// call back into the component that invoked them.
pub trait SessionObserver: Send + Sync {
    fn on_selection_changed(&self, _selection: &[PackageRef]) {}

    fn on_outcome(&self, _outcome: &DeploymentOutcome) {}

    /// Fired after every check, even when the status did not change.
    fn on_connection_status_changed(&self, _previous: ConnectionStatus, _current: ConnectionStatus) {
    }

    fn on_installed_packages(&self, _packages: &[InstalledPackage]) {}

    fn on_transcript_entry(&self, _entry: &TranscriptEntry) {}
}

pub struct SessionState {
    selection: Mutex<Vec<PackageRef>>,
    status: watch::Sender<ConnectionStatus>,
    observers: Mutex<Vec<Arc<dyn SessionObserver>>>,
    transcript: Transcript,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("selection", &self.selection_snapshot())
            .field("status", &self.connection_status())
            .field("transcript_len", &self.transcript.len())
            .finish_non_exhaustive()
    }
}

impl SessionState {
    pub fn new() -> Arc<Self> {
        let (status, _) = watch::channel(ConnectionStatus::Unknown);
        Arc::new(Self {
            selection: Mutex::new(Vec::new()),
            status,
            observers: Mutex::new(Vec::new()),
            transcript: Transcript::new(),
        })
    }

    pub fn subscribe(&self, observer: Arc<dyn SessionObserver>) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Last-known connection status. Never blocks on an in-flight check.
    pub fn connection_status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Receiver for async consumers that want to await status changes.
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    pub fn selection_snapshot(&self) -> Vec<PackageRef> {
        self.selection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn selection_len(&self) -> usize {
        self.selection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Record a check result and notify observers. Returns the previous value.
    pub(crate) fn set_connection_status(&self, current: ConnectionStatus) -> ConnectionStatus {
        let previous = self.status.send_replace(current);
        for observer in self.observers() {
            observer.on_connection_status_changed(previous, current);
        }
        previous
    }

    /// Apply `mutate` to the queue. Observers hear about it only when `mutate`
    /// reports a change.
    pub(crate) fn update_selection<R>(
        &self,
        mutate: impl FnOnce(&mut Vec<PackageRef>) -> (R, bool),
    ) -> R {
        let (result, snapshot) = {
            let mut selection = self.selection.lock().unwrap_or_else(PoisonError::into_inner);
            let (result, changed) = mutate(&mut selection);
            (result, changed.then(|| selection.clone()))
        };
        if let Some(snapshot) = snapshot {
            for observer in self.observers() {
                observer.on_selection_changed(&snapshot);
            }
        }
        result
    }

    pub(crate) fn publish_outcome(&self, outcome: &DeploymentOutcome) {
        for observer in self.observers() {
            observer.on_outcome(outcome);
        }
    }

    pub(crate) fn publish_installed(&self, packages: &[InstalledPackage]) {
        for observer in self.observers() {
            observer.on_installed_packages(packages);
        }
    }

    pub(crate) fn log(&self, level: TranscriptLevel, message: &str) {
        if let Some(entry) = self.transcript.append(level, message) {
            for observer in self.observers() {
                observer.on_transcript_entry(&entry);
            }
        }
    }

    // Cloned out so callbacks never run under the observers lock.
    fn observers(&self) -> Vec<Arc<dyn SessionObserver>> {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
