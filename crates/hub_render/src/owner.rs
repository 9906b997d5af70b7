//! The owning entity a render is performed for.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{RenderError, RenderResult};

/// Label carrying the owning hub's name.
pub const INSTALLER_NAME_LABEL: &str = "installer.name";

/// Label carrying the owning hub's namespace.
pub const INSTALLER_NAMESPACE_LABEL: &str = "installer.namespace";

const MAX_LABEL_LENGTH: usize = 63;

fn dns_label() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("DNS label pattern is valid")
    })
}

fn label_value() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?$")
            .expect("label value pattern is valid")
    })
}

/// Identity of the hub that owns the rendered resources.
///
/// Read-only during rendering. The namespace must be a DNS-1123 label; the
/// name becomes the `installer.name` label value and must be a valid one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubOwner {
    name: String,
    namespace: String,
}

impl HubOwner {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> RenderResult<Self> {
        let owner = Self {
            name: name.into(),
            namespace: namespace.into(),
        };
        validate("name", &owner.name, label_value(), "label value")?;
        validate("namespace", &owner.namespace, dns_label(), "DNS-1123 label")?;
        Ok(owner)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Ownership labels attached to cluster-scoped resources.
    pub fn installer_labels(&self) -> [(&'static str, &str); 2] {
        [
            (INSTALLER_NAME_LABEL, self.name.as_str()),
            (INSTALLER_NAMESPACE_LABEL, self.namespace.as_str()),
        ]
    }
}

fn validate(field: &str, value: &str, pattern: &Regex, rule: &str) -> RenderResult<()> {
    let message = if value.is_empty() {
        "must not be empty".to_string()
    } else if value.len() > MAX_LABEL_LENGTH {
        format!("must be at most {} characters", MAX_LABEL_LENGTH)
    } else if !pattern.is_match(value) {
        format!("'{}' is not a valid {}", value, rule)
    } else {
        return Ok(());
    };

    Err(RenderError::InvalidOwner {
        field: field.to_string(),
        message,
    })
}
