//! Best-effort user notifications.

use std::sync::{Arc, OnceLock};

use crate::deploy::{DeploymentOutcome, Stage};
use crate::error::NotifyError;
use crate::state::SessionObserver;
use crate::status::ConnectionStatus;

/// Platform notification service.
pub trait Notifier: Send + Sync {
    fn permission_granted(&self) -> bool;

    /// Prompt for permission; `true` when granted.
    fn request_permission(&self) -> bool;

    fn send(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Turns deployment results into notifications.
///
/// Permission is resolved on first use and cached for the relay's lifetime.
/// Denied permission and delivery failures are silent.
pub struct NotificationRelay {
    notifier: Arc<dyn Notifier>,
    permission: OnceLock<bool>,
    announce_connection_changes: bool,
}

impl std::fmt::Debug for NotificationRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationRelay")
            .field("permission", &self.permission.get())
            .field("announce_connection_changes", &self.announce_connection_changes)
            .finish_non_exhaustive()
    }
}

impl NotificationRelay {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            permission: OnceLock::new(),
            announce_connection_changes: false,
        }
    }

    pub fn with_connection_announcements(mut self, enabled: bool) -> Self {
        self.announce_connection_changes = enabled;
        self
    }

    pub fn notify(&self, title: &str, body: &str) {
        if !self.permitted() {
            tracing::debug!(title, "Notification permission denied; dropping");
            return;
        }
        if let Err(err) = self.notifier.send(title, body) {
            tracing::debug!(title, error = %err, "Notification not delivered");
        }
    }

    /// Notify about an install-stage outcome. Other stages are ignored.
    pub fn install_outcome(&self, outcome: &DeploymentOutcome) {
        if outcome.stage != Stage::Install {
            return;
        }
        if outcome.success {
            self.notify("App Install Successfully", "Your app install was successful");
        } else {
            self.notify("App Install Failed", &format!("Reason: {}", outcome.message));
        }
    }

    pub fn connection_failed(&self, reason: &str) {
        self.notify(
            "Connection Failed",
            &format!("Couldn't connect to host address: {reason}"),
        );
    }

    fn permitted(&self) -> bool {
        *self.permission.get_or_init(|| {
            let granted = self.notifier.permission_granted() || self.notifier.request_permission();
            tracing::debug!(granted, "Resolved notification permission");
            granted
        })
    }
}

impl SessionObserver for NotificationRelay {
    fn on_connection_status_changed(&self, previous: ConnectionStatus, current: ConnectionStatus) {
        if !self.announce_connection_changes || previous == current {
            return;
        }
        match (previous, current) {
            (ConnectionStatus::Unknown, _) => {}
            (_, ConnectionStatus::Connected) => {
                self.notify("Connected", "Connected to host successfully");
            }
            (_, ConnectionStatus::Disconnected) => {
                self.notify("Connection Lost", "Lost connection to host address");
            }
            (_, ConnectionStatus::Unknown) => {}
        }
    }
}
