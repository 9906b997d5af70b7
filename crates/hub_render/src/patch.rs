//! Per-kind resource transforms.

use tracing::{debug, error};

use hub_templates::Resource;

use crate::error::RenderResult;
use crate::owner::HubOwner;
use crate::policy::should_update_namespace;
use crate::rbac::ClusterRoleBinding;

/// The transform applied to a resource, selected by its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchKind {
    /// Move the resource into the owner's namespace, subject to the
    /// `update-namespace` annotation.
    Namespace,
    /// Attach the owner's installer labels. Used for cluster-scoped kinds.
    OwnershipLabel,
    /// Attach installer labels and move the first non-group subject into
    /// the owner's namespace.
    ClusterRoleBinding,
    /// Exclude the resource from the output.
    Drop,
    /// Pass the resource through unchanged.
    Identity,
}

impl PatchKind {
    /// Apply the transform to an owned copy of a template.
    ///
    /// `Ok(None)` means the resource is dropped from the output.
    pub fn apply(self, resource: Resource, owner: &HubOwner) -> RenderResult<Option<Resource>> {
        match self {
            PatchKind::Namespace => patch_namespace(resource, owner).map(Some),
            PatchKind::OwnershipLabel => Ok(Some(add_ownership_labels(resource, owner))),
            PatchKind::ClusterRoleBinding => patch_cluster_role_binding(resource, owner).map(Some),
            PatchKind::Drop => Ok(None),
            PatchKind::Identity => Ok(Some(resource)),
        }
    }
}

fn patch_namespace(mut resource: Resource, owner: &HubOwner) -> RenderResult<Resource> {
    if should_update_namespace(&resource)? {
        resource.set_namespace(owner.namespace());
    }
    Ok(resource)
}

fn add_ownership_labels(mut resource: Resource, owner: &HubOwner) -> Resource {
    for (key, value) in owner.installer_labels() {
        resource.set_label(key, value);
    }
    resource
}

fn patch_cluster_role_binding(resource: Resource, owner: &HubOwner) -> RenderResult<Resource> {
    let resource = add_ownership_labels(resource, owner);

    let mut binding = ClusterRoleBinding::decode(&resource).map_err(|e| {
        error!("Failed to decode clusterrolebinding: {}", e);
        e
    })?;

    if binding.first_subject()?.is_group() {
        debug!(
            "Leaving group subject of '{}' untouched",
            resource.name().unwrap_or_default()
        );
        return Ok(resource);
    }

    if should_update_namespace(&resource)? {
        binding.first_subject_mut()?.namespace = Some(owner.namespace().to_string());
    }

    binding.encode().map_err(|e| {
        error!("Failed to encode clusterrolebinding: {}", e);
        e
    })
}
