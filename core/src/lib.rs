//! Labeler library - label pull requests by the files they change.
//!
//! This crate provides:
//! - Label rule parsing and glob matching (`labels`)
//! - Per-pull-request processing and the run loop with its operations budget (`runner`)
//! - The GitHub client abstraction and run context (`sources`)
//!
//! Feature flags:
//! - `cli`: Command-line interface

pub mod error;
pub mod labels;
pub mod runner;
pub mod sources;

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;

// Re-export commonly used types
pub use error::LabelerError;
pub use labels::config::{LabelConfiguration, LabelRule};
pub use runner::{RunLoop, RunOptions, RunReport};
pub use sources::context::RunContext;
pub use sources::traits::RepoClient;
