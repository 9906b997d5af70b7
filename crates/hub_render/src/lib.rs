//! # hub_render
//!
//! Turns the cached hub template set into resources ready to apply.
//!
//! Every template is copied and routed through a patch selected by its kind:
//!
//! - **Namespace**: workloads, services, config maps, subscriptions and
//!   channels move into the owner's namespace unless annotated with
//!   `update-namespace: "false"`
//! - **Ownership labels**: cluster-scoped kinds receive `installer.name` and
//!   `installer.namespace` labels
//! - **ClusterRoleBinding**: labeled, and its first non-group subject moves
//!   into the owner's namespace
//!
//! Kinds without a patch pass through unchanged. A render fails as a whole
//! on the first error.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hub_render::{HubOwner, Renderer};
//! use hub_templates::{DirectoryMaterializer, TemplateCache};
//!
//! let cache = Arc::new(
//!     TemplateCache::from_env(Arc::new(DirectoryMaterializer::new()))
//!         .expect("TEMPLATES_PATH must be set"),
//! );
//!
//! let owner = HubOwner::new("multiclusterhub", "open-cluster-management").unwrap();
//! let resources = Renderer::new(owner, cache).render().unwrap();
//! for resource in &resources {
//!     println!("{}", resource.to_yaml().unwrap());
//! }
//! ```

pub mod dispatch;
pub mod error;
pub mod owner;
pub mod patch;
pub mod policy;
pub mod rbac;
pub mod renderer;

pub use dispatch::{DispatchTable, LABELED_KINDS, NAMESPACED_KINDS};
pub use error::{RenderError, RenderResult};
pub use hub_templates::Resource;
pub use owner::{HubOwner, INSTALLER_NAMESPACE_LABEL, INSTALLER_NAME_LABEL};
pub use patch::PatchKind;
pub use policy::{parse_bool, should_update_namespace, UPDATE_NAMESPACE_ANNOTATION};
pub use rbac::{ClusterRoleBinding, RoleRef, Subject};
pub use renderer::Renderer;
