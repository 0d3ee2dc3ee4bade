//! Per-stage results of a deployment attempt.

use std::fmt;

use serde::Serialize;

use crate::package::PackageRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Connect,
    Install,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Connect => f.write_str("connect"),
            Stage::Install => f.write_str("install"),
        }
    }
}

/// Result of one stage of one deployment attempt.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentOutcome {
    pub package: PackageRef,
    pub stage: Stage,
    pub success: bool,
    /// Bridge output on success, error text on failure. May be empty.
    pub message: String,
}

impl DeploymentOutcome {
    pub fn succeeded(package: PackageRef, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            package,
            stage,
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(package: PackageRef, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            package,
            stage,
            success: false,
            message: message.into(),
        }
    }
}

/// Number of failed outcomes for `stage`.
pub fn count_failures(outcomes: &[DeploymentOutcome], stage: Stage) -> usize {
    outcomes
        .iter()
        .filter(|o| o.stage == stage && !o.success)
        .count()
}
