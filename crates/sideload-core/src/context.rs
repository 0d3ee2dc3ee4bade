//! Application context for unified dependency injection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::bridge::{AdbBridge, AdbSettings};
use crate::config::{
    AppConfig, FileSettingsStore, TargetConfigStore, app_config_path, config_dir, settings_path,
};
use crate::deploy::{DeployOrchestrator, PackageLibrary};
use crate::monitor::{ConnectionMonitor, PollerHandle};
use crate::notify::{NotificationRelay, Notifier};
use crate::registry::SelectionRegistry;
use crate::state::SessionState;

pub type AdbMonitor = ConnectionMonitor<AdbBridge, FileSettingsStore>;
pub type AdbOrchestrator = DeployOrchestrator<AdbBridge, FileSettingsStore>;
pub type AdbLibrary = PackageLibrary<AdbBridge, FileSettingsStore>;

/// Production wiring of the deployment core.
///
/// Frontends create this once at startup and pass it to commands. Every
/// component shares the same [`SessionState`].
#[derive(Debug)]
pub struct AppContext {
    config_dir: PathBuf,
    config: AppConfig,
    state: Arc<SessionState>,
    target: TargetConfigStore<FileSettingsStore>,
    monitor: Arc<AdbMonitor>,
    orchestrator: AdbOrchestrator,
    registry: SelectionRegistry,
    library: AdbLibrary,
}

impl AppContext {
    /// Open the context rooted at the default configuration directory.
    pub async fn with_defaults(notifier: Arc<dyn Notifier>) -> anyhow::Result<Self> {
        let dir = config_dir()?;
        Self::open(dir, notifier).await
    }

    /// Open the context rooted at `config_dir` (for testing and portable
    /// installs).
    pub async fn open(config_dir: PathBuf, notifier: Arc<dyn Notifier>) -> anyhow::Result<Self> {
        let config = AppConfig::load(&app_config_path(&config_dir)).await?;
        let store = FileSettingsStore::open(settings_path(&config_dir))
            .await
            .context("Failed to open settings store")?;
        tracing::debug!(dir = %config_dir.display(), "Opened application context");

        let state = SessionState::new();
        let bridge = Arc::new(AdbBridge::new(AdbSettings::from_config(&config)));
        let target = TargetConfigStore::new(Arc::new(store));
        let relay = Arc::new(
            NotificationRelay::new(notifier)
                .with_connection_announcements(config.announce_connection_changes),
        );
        state.subscribe(relay.clone());

        let monitor = Arc::new(ConnectionMonitor::new(
            Arc::clone(&bridge),
            target.clone(),
            Arc::clone(&state),
        ));
        let orchestrator = DeployOrchestrator::new(
            Arc::clone(&bridge),
            Arc::clone(&monitor),
            relay,
            Arc::clone(&state),
        );
        let registry = SelectionRegistry::new(Arc::clone(&state));
        let library = PackageLibrary::new(bridge, target.clone());

        Ok(Self {
            config_dir,
            config,
            state,
            target,
            monitor,
            orchestrator,
            registry,
            library,
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    pub fn target(&self) -> &TargetConfigStore<FileSettingsStore> {
        &self.target
    }

    pub fn monitor(&self) -> &Arc<AdbMonitor> {
        &self.monitor
    }

    pub fn orchestrator(&self) -> &AdbOrchestrator {
        &self.orchestrator
    }

    pub fn registry(&self) -> &SelectionRegistry {
        &self.registry
    }

    pub fn library(&self) -> &AdbLibrary {
        &self.library
    }

    /// Start background connection polling at the configured interval.
    pub fn spawn_polling(&self) -> PollerHandle {
        self.monitor.spawn_polling(self.config.poll_interval())
    }
}
