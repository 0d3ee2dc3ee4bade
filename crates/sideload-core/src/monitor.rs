//! Connection monitor: on-demand and periodic reachability checks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::bridge::Bridge;
use crate::config::app::DEFAULT_POLL_INTERVAL_MS;
use crate::config::{SettingsStore, TargetConfigStore};
use crate::error::BridgeError;
use crate::state::SessionState;
use crate::status::ConnectionStatus;

/// Background refresh period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);

/// Shortest period `spawn_polling` accepts.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Tracks whether the configured target is reachable.
///
/// At most one check is outstanding at a time: manual checks queue behind an
/// in-flight one, timer-driven checks are skipped instead.
#[derive(Debug)]
pub struct ConnectionMonitor<B, S> {
    bridge: Arc<B>,
    target: TargetConfigStore<S>,
    state: Arc<SessionState>,
    in_flight: Mutex<()>,
}

impl<B: Bridge, S: SettingsStore> ConnectionMonitor<B, S> {
    pub fn new(bridge: Arc<B>, target: TargetConfigStore<S>, state: Arc<SessionState>) -> Self {
        Self {
            bridge,
            target,
            state,
            in_flight: Mutex::new(()),
        }
    }

    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    pub fn target(&self) -> &TargetConfigStore<S> {
        &self.target
    }

    /// Check reachability once. Never fails: any bridge error is
    /// `Disconnected`.
    pub async fn check_connection(&self) -> ConnectionStatus {
        let _guard = self.in_flight.lock().await;
        self.run_check().await
    }

    /// Like [`check_connection`](Self::check_connection), but returns `None`
    /// without touching the bridge when a check is already running.
    pub async fn try_check(&self) -> Option<ConnectionStatus> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::debug!("Connection check already in flight; skipping");
            return None;
        };
        Some(self.run_check().await)
    }

    /// Ask the bridge to connect to the configured address.
    pub async fn connect(&self) -> Result<String, BridgeError> {
        let address = self
            .target
            .host_address()
            .await
            .ok_or(BridgeError::AddressNotConfigured)?;
        self.bridge.connect(&address).await
    }

    async fn run_check(&self) -> ConnectionStatus {
        let status = match self.target.host_address().await {
            None => {
                tracing::debug!("No host address configured");
                ConnectionStatus::Disconnected
            }
            Some(address) => match self.bridge.is_reachable(&address).await {
                Ok(reachable) => ConnectionStatus::from_reachable(reachable),
                Err(err) => {
                    tracing::debug!(address = %address, error = %err, "Reachability probe failed");
                    ConnectionStatus::Disconnected
                }
            },
        };

        let previous = self.state.set_connection_status(status);
        if previous != status {
            tracing::info!(%previous, current = %status, "Connection status changed");
        }
        status
    }
}

impl<B, S> ConnectionMonitor<B, S>
where
    B: Bridge + 'static,
    S: SettingsStore + 'static,
{
    /// Check immediately, then every `period`, until the handle is shut down
    /// or dropped. Must be called from within a tokio runtime. A zero period
    /// is raised to [`MIN_POLL_INTERVAL`].
    pub fn spawn_polling(self: &Arc<Self>, period: Duration) -> PollerHandle {
        let period = period.max(MIN_POLL_INTERVAL);
        let monitor = Arc::clone(self);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::debug!(period_ms = period.as_millis() as u64, "Connection polling started");
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        tokio::select! {
                            _ = &mut shutdown_rx => break,
                            _ = monitor.try_check() => {}
                        }
                    }
                }
            }
            tracing::debug!("Connection polling stopped");
        });

        PollerHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }
}

/// Handle to the background polling task. Dropping it stops polling.
#[derive(Debug)]
pub struct PollerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop polling and wait for the task to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.task).await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
