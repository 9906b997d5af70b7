//! Namespace-override policy.
//!
//! Namespaced resources are moved into the owner's namespace unless they opt
//! out with the `update-namespace` annotation.

use tracing::debug;

use hub_templates::Resource;

use crate::error::{RenderError, RenderResult};

/// Annotation that controls namespace overriding.
pub const UPDATE_NAMESPACE_ANNOTATION: &str = "update-namespace";

/// Parse a boolean string.
///
/// Accepts `true/t/1/yes/y/on` and `false/f/0/no/n/off`, case-insensitive.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "f" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Whether the resource's namespace should be replaced by the owner's.
///
/// Defaults to `true`. A non-empty string `update-namespace` annotation
/// overrides the default; a value that is not a boolean is an error.
pub fn should_update_namespace(resource: &Resource) -> RenderResult<bool> {
    let value = match resource.annotation(UPDATE_NAMESPACE_ANNOTATION) {
        Some(value) if !value.is_empty() => value,
        _ => return Ok(true),
    };

    let update = parse_bool(value).ok_or_else(|| RenderError::InvalidAnnotation {
        annotation: UPDATE_NAMESPACE_ANNOTATION.to_string(),
        value: value.to_string(),
        name: resource.name().unwrap_or_default().to_string(),
    })?;

    debug!(
        "{} on '{}' set to {}",
        UPDATE_NAMESPACE_ANNOTATION,
        resource.name().unwrap_or_default(),
        update
    );
    Ok(update)
}
