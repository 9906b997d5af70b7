//! Hub resource rendering.

use std::sync::Arc;

use tracing::{debug, error, info};

use hub_templates::{Resource, TemplateCache, HUB_TEMPLATE_KIND};

use crate::dispatch::DispatchTable;
use crate::error::RenderResult;
use crate::owner::HubOwner;
use crate::patch::PatchKind;

/// Renders the hub template set for one owner.
///
/// The base templates come from the shared [`TemplateCache`]; each resource
/// is copied and run through the patch registered for its kind.
#[derive(Debug)]
pub struct Renderer {
    owner: HubOwner,
    cache: Arc<TemplateCache>,
    dispatch: DispatchTable,
    version: String,
}

impl Renderer {
    /// Create a renderer with the hub dispatch table and the build version.
    pub fn new(owner: HubOwner, cache: Arc<TemplateCache>) -> Self {
        Self {
            owner,
            cache,
            dispatch: DispatchTable::hub_defaults(),
            version: hub_templates::version().to_string(),
        }
    }

    /// Render templates of a different version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Register the patch for a kind, replacing the default.
    pub fn with_patch(mut self, kind: impl Into<String>, patch: PatchKind) -> Self {
        self.dispatch.register(kind, patch);
        self
    }

    pub fn owner(&self) -> &HubOwner {
        &self.owner
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn dispatch_table(&self) -> &DispatchTable {
        &self.dispatch
    }

    /// Render the hub template set.
    ///
    /// Returns resources in template order, or the first error. Nothing is
    /// returned for a failed render.
    pub fn render(&self) -> RenderResult<Vec<Resource>> {
        let templates = self.cache.get_templates(HUB_TEMPLATE_KIND, &self.version)?;
        let resources = self.render_templates(templates.resources())?;
        info!(
            "Rendered {} resources for {}/{}",
            resources.len(),
            self.owner.namespace(),
            self.owner.name()
        );
        Ok(resources)
    }

    /// Run the patch pipeline over a list of templates.
    ///
    /// The templates themselves are never modified.
    pub fn render_templates(&self, templates: &[Resource]) -> RenderResult<Vec<Resource>> {
        let mut rendered = Vec::with_capacity(templates.len());

        for template in templates {
            let kind = template.kind().unwrap_or_default();
            let patch = self.dispatch.lookup(kind);

            let output = patch.apply(template.clone(), &self.owner).map_err(|e| {
                error!(
                    "Failed to render {} '{}': {}",
                    kind,
                    template.name().unwrap_or_default(),
                    e
                );
                e
            })?;

            let Some(resource) = output else {
                debug!(
                    "Dropping {} '{}'",
                    kind,
                    template.name().unwrap_or_default()
                );
                continue;
            };

            debug_assert_eq!(
                resource.kind(),
                template.kind(),
                "patch changed the kind of '{}'",
                template.name().unwrap_or_default()
            );

            rendered.push(resource);
        }

        Ok(rendered)
    }
}
