//! Sideload Core Library
//!
//! Queues Android package files and deploys them to a target device over
//! adb, keeping the target's connection status fresh in the background.

pub mod bridge;
pub mod config;
pub mod context;
pub mod deploy;
pub mod error;
pub mod monitor;
pub mod notify;
pub mod package;
pub mod registry;
pub mod state;
pub mod status;
pub mod transcript;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{
        AppConfig, FileSettingsStore, MemorySettingsStore, SettingsStore, TargetConfig,
        TargetConfigStore,
    };

    // Bridge
    pub use crate::bridge::{AdbBridge, AdbSettings, Bridge, InstalledPackage};

    // Deployment
    pub use crate::deploy::{
        DeployOrchestrator, DeploymentOutcome, LibraryListing, PackageLibrary, Stage,
    };
    pub use crate::monitor::{ConnectionMonitor, PollerHandle};
    pub use crate::registry::{AddReport, SelectionRegistry};

    // Session
    pub use crate::context::AppContext;
    pub use crate::notify::{NotificationRelay, Notifier};
    pub use crate::package::PackageRef;
    pub use crate::state::{SessionObserver, SessionState};
    pub use crate::status::ConnectionStatus;
    pub use crate::transcript::{TranscriptEntry, TranscriptLevel};

    // Errors
    pub use crate::error::{BridgeError, ConfigError, StoreError, ValidationError};
}
