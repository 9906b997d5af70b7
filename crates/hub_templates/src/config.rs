//! Template location configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{TemplateError, TemplateResult};

/// Environment variable holding the root directory of all template sets.
pub const TEMPLATES_PATH_ENV: &str = "TEMPLATES_PATH";

/// Overlay directory materialized for every template-set kind.
pub const BASE_OVERLAY: &str = "base";

/// Where template sets live on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Root directory; each template-set kind is a subdirectory.
    pub templates_path: PathBuf,
}

impl TemplatesConfig {
    pub fn new(templates_path: impl Into<PathBuf>) -> Self {
        Self {
            templates_path: templates_path.into(),
        }
    }

    /// Read the template root from `TEMPLATES_PATH`.
    ///
    /// A missing or empty value is a startup failure: the caller is expected
    /// to abort rather than run without templates.
    pub fn from_env() -> TemplateResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the template root through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> TemplateResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(TEMPLATES_PATH_ENV) {
            Some(path) if !path.trim().is_empty() => {
                debug!("Using templates from {}", path);
                Ok(Self::new(path))
            }
            _ => {
                error!("{} environment variable is required", TEMPLATES_PATH_ENV);
                Err(TemplateError::MissingConfiguration(
                    TEMPLATES_PATH_ENV.to_string(),
                ))
            }
        }
    }

    /// Root directory of all template sets.
    pub fn templates_path(&self) -> &Path {
        &self.templates_path
    }

    /// Directory materialized for a template-set kind: `<root>/<kind>/base`.
    pub fn set_path(&self, kind: &str) -> PathBuf {
        self.templates_path.join(kind).join(BASE_OVERLAY)
    }
}
