//! Deployment orchestrator: connect, install, report, one package at a time.

use std::sync::Arc;

use super::outcome::{DeploymentOutcome, Stage, count_failures};
use crate::bridge::{Bridge, InstalledPackage, sort_by_label};
use crate::config::SettingsStore;
use crate::error::BridgeError;
use crate::monitor::ConnectionMonitor;
use crate::notify::NotificationRelay;
use crate::package::PackageRef;
use crate::state::SessionState;
use crate::transcript::TranscriptLevel;

/// Drives installs through the bridge.
///
/// Each package goes through a connect stage and an install stage. The
/// connect stage is best-effort: its failure is reported but never stops the
/// install attempt. Failures are isolated per package.
#[derive(Debug)]
pub struct DeployOrchestrator<B, S> {
    bridge: Arc<B>,
    monitor: Arc<ConnectionMonitor<B, S>>,
    relay: Arc<NotificationRelay>,
    state: Arc<SessionState>,
}

impl<B: Bridge, S: SettingsStore> DeployOrchestrator<B, S> {
    pub fn new(
        bridge: Arc<B>,
        monitor: Arc<ConnectionMonitor<B, S>>,
        relay: Arc<NotificationRelay>,
        state: Arc<SessionState>,
    ) -> Self {
        Self {
            bridge,
            monitor,
            relay,
            state,
        }
    }

    pub fn monitor(&self) -> &Arc<ConnectionMonitor<B, S>> {
        &self.monitor
    }

    /// Deploy a single package. Returns the connect-stage outcome followed by
    /// the install-stage outcome.
    pub async fn deploy(&self, package: &PackageRef) -> Vec<DeploymentOutcome> {
        // Owned copy: later registry edits must not affect this attempt.
        let package = package.clone();
        self.state.log(
            TranscriptLevel::Info,
            &format!("Processing {}...", package.display_name),
        );

        let connect = match self.monitor.connect().await {
            Ok(output) => {
                DeploymentOutcome::succeeded(package.clone(), Stage::Connect, output.trim())
            }
            Err(err) => {
                tracing::warn!(error = %err, "Connect probe failed; attempting install anyway");
                DeploymentOutcome::failed(package.clone(), Stage::Connect, err.to_string())
            }
        };
        self.monitor.check_connection().await;
        self.record(&connect);

        let install = match self.bridge.install(package.as_path()).await {
            Ok(output) => {
                DeploymentOutcome::succeeded(package.clone(), Stage::Install, output.trim())
            }
            Err(err) => {
                tracing::warn!(package = %package.display_name, error = %err, "Install failed");
                DeploymentOutcome::failed(package.clone(), Stage::Install, err.to_string())
            }
        };
        self.record(&install);

        if install.success
            && let Err(err) = self.refresh_installed().await
        {
            self.state.log(
                TranscriptLevel::Failure,
                &format!("Failed to list installed packages: {err}"),
            );
        }
        self.relay.install_outcome(&install);

        vec![connect, install]
    }

    /// Deploy packages strictly one after another, in order. A failure never
    /// stops the remaining packages.
    pub async fn deploy_all(&self, packages: &[PackageRef]) -> Vec<DeploymentOutcome> {
        let mut outcomes = Vec::with_capacity(packages.len() * 2);
        for package in packages {
            outcomes.extend(self.deploy(package).await);
        }
        tracing::info!(
            total = packages.len(),
            failed = count_failures(&outcomes, Stage::Install),
            "Deployment batch finished"
        );
        outcomes
    }

    /// Deploy a snapshot of the current selection queue.
    pub async fn deploy_selection(&self) -> Vec<DeploymentOutcome> {
        let selection = self.state.selection_snapshot();
        self.deploy_all(&selection).await
    }

    /// Fetch third-party packages installed on the target, sorted by label.
    ///
    /// Connects first on a best-effort basis; a failed connect is announced
    /// through the relay but does not prevent the listing attempt.
    pub async fn refresh_installed(&self) -> Result<Vec<InstalledPackage>, BridgeError> {
        if let Err(err) = self.monitor.connect().await {
            self.relay.connection_failed(&err.to_string());
        }
        self.monitor.check_connection().await;

        let mut packages = self.bridge.list_installed_packages().await?;
        sort_by_label(&mut packages);
        self.state.publish_installed(&packages);
        Ok(packages)
    }

    fn record(&self, outcome: &DeploymentOutcome) {
        let level = if outcome.success {
            TranscriptLevel::Info
        } else {
            TranscriptLevel::Failure
        };
        self.state.log(level, &outcome.message);
        self.state.publish_outcome(outcome);
    }
}
