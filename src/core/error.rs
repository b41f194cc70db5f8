use std::path::PathBuf;
use thiserror::Error;

/// Error kinds produced while loading configuration, resolving changes and
/// running triggers.
///
/// Everything except `TriggerExecution` is fatal for a run. Trigger failures
/// are recorded by the engine and only affect the final exit code.
#[derive(Error, Debug)]
pub enum PreflightError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode config file {path}: {message}")]
    ConfigDecode { path: PathBuf, message: String },

    #[error("{0}")]
    ConfigValidation(String),

    #[error("no such trigger: {0:?}")]
    UnknownTrigger(String),

    #[error("invalid glob pattern {pattern:?}: {message}")]
    GlobSyntax { pattern: String, message: String },

    #[error("invalid input type {input_type:?} for trigger {trigger:?}")]
    InvalidInputType { trigger: String, input_type: String },

    #[error("git query failed ({operation}): {message}")]
    ChangeSource { operation: String, message: String },

    #[error("failed to execute {command:?}: {message}")]
    TriggerExecution { command: String, message: String },
}

impl PreflightError {
    /// Wraps a libgit2 failure coming from the named change-source query.
    pub fn change_source(operation: &str, err: impl std::fmt::Display) -> Self {
        PreflightError::ChangeSource {
            operation: operation.to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PreflightError>;
