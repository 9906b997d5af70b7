//! Build version used to key template sets.

/// Version of the templates shipped with this build.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Well-known template-set kind rendered for a hub.
pub const HUB_TEMPLATE_KIND: &str = "multiclusterhub";

/// Current template version.
pub fn version() -> &'static str {
    VERSION
}
