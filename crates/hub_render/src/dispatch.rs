//! Kind-to-patch dispatch table.

use std::collections::HashMap;

use tracing::debug;

use crate::patch::PatchKind;

/// Kinds moved into the owner's namespace.
pub const NAMESPACED_KINDS: [&str; 7] = [
    "Deployment",
    "Service",
    "ServiceAccount",
    "ConfigMap",
    "Subscription",
    "StatefulSet",
    "Channel",
];

/// Cluster-scoped kinds that only receive ownership labels.
pub const LABELED_KINDS: [&str; 2] = ["ClusterRole", "CustomResourceDefinition"];

/// Maps resource kinds to the patch applied to them.
///
/// Kinds without an entry get [`PatchKind::Identity`].
#[derive(Debug, Clone, Default)]
pub struct DispatchTable {
    patches: HashMap<String, PatchKind>,
}

impl DispatchTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            patches: HashMap::new(),
        }
    }

    /// The table used when rendering a hub.
    pub fn hub_defaults() -> Self {
        let mut table = Self::new();
        for kind in NAMESPACED_KINDS {
            table.register(kind, PatchKind::Namespace);
        }
        for kind in LABELED_KINDS {
            table.register(kind, PatchKind::OwnershipLabel);
        }
        table.register("ClusterRoleBinding", PatchKind::ClusterRoleBinding);
        table
    }

    /// Register the patch for a kind, replacing any earlier entry.
    pub fn register(&mut self, kind: impl Into<String>, patch: PatchKind) {
        let kind = kind.into();
        debug!("Registering {:?} patch for {}", patch, kind);
        self.patches.insert(kind, patch);
    }

    /// The patch for a kind, or [`PatchKind::Identity`] when none is registered.
    pub fn lookup(&self, kind: &str) -> PatchKind {
        self.patches
            .get(kind)
            .copied()
            .unwrap_or(PatchKind::Identity)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.patches.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.patches.keys().map(|s| s.as_str()).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}
