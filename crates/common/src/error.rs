//! Error types shared across handctl crates.

use std::path::PathBuf;

/// Top-level error type for handctl operations.
///
/// Recognition itself never fails; these errors come from the edges
/// (configuration documents, landmark sources, actuators).
#[derive(Debug, thiserror::Error)]
pub enum HandctlError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Mapping error: {message}")]
    Mapping { message: String },

    #[error("Template error: {message}")]
    Template { message: String },

    #[error("Landmark source error: {message}")]
    Source { message: String },

    #[error("Actuator error: {message}")]
    Actuator { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using HandctlError.
pub type HandctlResult<T> = Result<T, HandctlError>;

impl HandctlError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::Mapping {
            message: msg.into(),
        }
    }

    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template {
            message: msg.into(),
        }
    }

    pub fn landmark_source(msg: impl Into<String>) -> Self {
        Self::Source {
            message: msg.into(),
        }
    }

    pub fn actuator(msg: impl Into<String>) -> Self {
        Self::Actuator {
            message: msg.into(),
        }
    }
}
