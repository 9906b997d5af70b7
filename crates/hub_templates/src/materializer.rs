//! The seam to the templating engine.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::error::TemplateResult;
use crate::resource::Resource;

/// Turns a template directory into an ordered list of resources.
///
/// Implementations own the engine's overlay semantics; the cache treats
/// them as an opaque and potentially expensive step.
pub trait Materializer: Send + Sync {
    fn materialize(&self, dir: &Path) -> TemplateResult<Vec<Resource>>;
}

/// Materializer that serves a fixed, in-memory resource list.
///
/// Useful when templates are embedded in the binary, and in tests that need
/// to observe how often materialization runs.
#[derive(Debug, Default)]
pub struct StaticMaterializer {
    resources: Vec<Resource>,
    calls: AtomicUsize,
}

impl StaticMaterializer {
    pub fn new(resources: Vec<Resource>) -> Self {
        Self {
            resources,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of times [`Materializer::materialize`] has run.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Materializer for StaticMaterializer {
    fn materialize(&self, dir: &Path) -> TemplateResult<Vec<Resource>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        debug!(
            "Serving {} static resources for {:?}",
            self.resources.len(),
            dir
        );
        Ok(self.resources.clone())
    }
}
