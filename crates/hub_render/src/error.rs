//! Error types for the render pipeline.

use hub_templates::TemplateError;
use thiserror::Error;

/// Result type alias for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can abort a render.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Failed to convert {kind} '{name}': {message}")]
    Conversion {
        kind: String,
        name: String,
        message: String,
    },

    #[error("ClusterRoleBinding '{0}' has no subjects")]
    MissingSubject(String),

    #[error("Invalid value '{value}' for annotation {annotation} on '{name}'")]
    InvalidAnnotation {
        annotation: String,
        value: String,
        name: String,
    },

    #[error("Invalid owner {field}: {message}")]
    InvalidOwner { field: String, message: String },
}
