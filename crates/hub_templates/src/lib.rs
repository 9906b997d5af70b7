//! # hub_templates
//!
//! Template-set materialization and caching for hubrender.
//!
//! A template set is a directory of resource templates, identified by a
//! logical kind and a version. This crate provides:
//!
//! - **Configuration**: the template root, read from `TEMPLATES_PATH`
//! - **Materializers**: the seam to the templating engine, with an on-disk
//!   and an in-memory implementation
//! - **Template Cache**: materializes each `(kind, version)` at most once per
//!   process and shares the result
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hub_templates::{DirectoryMaterializer, TemplateCache, HUB_TEMPLATE_KIND};
//!
//! let cache = TemplateCache::from_env(Arc::new(DirectoryMaterializer::new()))
//!     .expect("TEMPLATES_PATH must be set");
//!
//! let set = cache.get_templates(HUB_TEMPLATE_KIND, hub_templates::version()).unwrap();
//! for resource in set.iter() {
//!     println!("{:?}", resource.kind());
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod loader;
pub mod materializer;
pub mod resource;
pub mod version;

pub use cache::{TemplateCache, TemplateSet, TemplateSetKey};
pub use config::{TemplatesConfig, BASE_OVERLAY, TEMPLATES_PATH_ENV};
pub use error::{TemplateError, TemplateResult};
pub use loader::DirectoryMaterializer;
pub use materializer::{Materializer, StaticMaterializer};
pub use resource::Resource;
pub use version::{version, HUB_TEMPLATE_KIND, VERSION};
