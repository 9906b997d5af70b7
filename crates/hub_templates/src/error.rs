//! Error types for template materialization and caching.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while materializing or caching template sets.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// A required setting is absent. The process must not continue.
    #[error("Required configuration is missing: {0}")]
    MissingConfiguration(String),

    #[error("Template set not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid resource in {path}: {message}")]
    InvalidResource { path: PathBuf, message: String },

    #[error("Materialization of {path} failed: {message}")]
    Materialization { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl TemplateError {
    /// Build an [`TemplateError::InvalidResource`] for a file.
    pub fn invalid_resource(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidResource {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Build a [`TemplateError::Materialization`] for a template directory.
    pub fn materialization(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Materialization {
            path: path.into(),
            message: message.into(),
        }
    }
}
