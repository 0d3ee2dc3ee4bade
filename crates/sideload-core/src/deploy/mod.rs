//! Deployment: installing queued packages onto the target.

pub mod library;
pub mod orchestrator;
pub mod outcome;

pub use library::{LibraryListing, PackageLibrary};
pub use orchestrator::DeployOrchestrator;
pub use outcome::{DeploymentOutcome, Stage, count_failures};
