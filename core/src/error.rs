use serde::Serialize;
use thiserror::Error;

/// Unified error type for a labeler run.
///
/// Every variant is fatal to the run. Budget exhaustion is not an error and
/// is reported through [`crate::runner::RunReport`] instead.
#[derive(Error, Debug, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum LabelerError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid glob {pattern:?} for label {label:?}: {message}")]
    GlobSyntax {
        label: String,
        pattern: String,
        message: String,
    },

    #[error("GitHub error during {operation}: {message}")]
    Transport { message: String, operation: String },

    #[error("Run context error: {message}")]
    Context { message: String },
}

impl LabelerError {
    /// Create a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a GlobSyntax error for a pattern belonging to `label`
    pub fn glob_syntax(
        label: impl Into<String>,
        pattern: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::GlobSyntax {
            label: label.into(),
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create a Transport error with the operation that failed
    pub fn transport(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            operation: operation.into(),
        }
    }

    /// Create a Context error
    pub fn context(message: impl Into<String>) -> Self {
        Self::Context {
            message: message.into(),
        }
    }
}

impl From<serde_yaml::Error> for LabelerError {
    fn from(err: serde_yaml::Error) -> Self {
        LabelerError::config(format!("invalid YAML: {err}"))
    }
}

// Convert to String for the CLI entry point
impl From<LabelerError> for String {
    fn from(err: LabelerError) -> Self {
        err.to_string()
    }
}
