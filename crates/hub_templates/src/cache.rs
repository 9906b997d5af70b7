//! Load-once cache of materialized template sets.
//!
//! Each `(kind, version)` key is materialized at most once for the lifetime
//! of the cache. A short lock on the key map hands out a per-key slot; the
//! slot lock is held while materializing, so concurrent first callers for the
//! same key wait and then read the stored set, while other keys proceed
//! independently. Failures are not stored: the failed key's slot is removed
//! from the map and the next caller retries with a fresh one.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::TemplatesConfig;
use crate::error::TemplateResult;
use crate::materializer::Materializer;
use crate::resource::Resource;

/// Identifies a template set: a logical kind at a given version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateSetKey {
    pub kind: String,
    pub version: String,
}

impl TemplateSetKey {
    pub fn new(kind: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            version: version.into(),
        }
    }

    /// The flat cache key, `kind-version`.
    pub fn cache_key(&self) -> String {
        format!("{}-{}", self.kind, self.version)
    }
}

impl fmt::Display for TemplateSetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.version)
    }
}

/// An immutable, materialized template set.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSet {
    key: TemplateSetKey,
    resources: Vec<Resource>,
}

impl TemplateSet {
    pub fn new(key: TemplateSetKey, resources: Vec<Resource>) -> Self {
        Self { key, resources }
    }

    pub fn key(&self) -> &TemplateSetKey {
        &self.key
    }

    /// Resources in materialization order.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

type Slot = Arc<Mutex<Option<Arc<TemplateSet>>>>;

/// Process-lifetime cache of template sets.
///
/// Construct once at startup and share it by `Arc`.
pub struct TemplateCache {
    config: TemplatesConfig,
    materializer: Arc<dyn Materializer>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl TemplateCache {
    /// Create a cache over an explicit template root.
    pub fn initialize(config: TemplatesConfig, materializer: Arc<dyn Materializer>) -> Self {
        info!("Initializing template cache at {:?}", config.templates_path());
        Self {
            config,
            materializer,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Create a cache rooted at `TEMPLATES_PATH`.
    ///
    /// Fails with `MissingConfiguration` when the variable is not set; the
    /// process should treat that as fatal.
    pub fn from_env(materializer: Arc<dyn Materializer>) -> TemplateResult<Self> {
        Ok(Self::initialize(TemplatesConfig::from_env()?, materializer))
    }

    pub fn templates_path(&self) -> &Path {
        self.config.templates_path()
    }

    /// Fetch the template set for `kind` at `version`, materializing it on
    /// first use.
    pub fn get_templates(&self, kind: &str, version: &str) -> TemplateResult<Arc<TemplateSet>> {
        self.get(&TemplateSetKey::new(kind, version))
    }

    /// Fetch the template set for `key`, materializing it on first use.
    pub fn get(&self, key: &TemplateSetKey) -> TemplateResult<Arc<TemplateSet>> {
        loop {
            let slot = self.slot(key);
            let mut entry = slot.lock();

            if let Some(set) = entry.as_ref() {
                debug!("Template cache hit: {}", key);
                return Ok(Arc::clone(set));
            }

            // A failed materialization retires its slot; waiters on it start over.
            if !self.is_current(key, &slot) {
                continue;
            }

            let dir = self.config.set_path(&key.kind);
            info!("Materializing template set {} from {:?}", key, dir);
            let resources = match self.materializer.materialize(&dir) {
                Ok(resources) => resources,
                Err(e) => {
                    warn!("Failed to materialize template set {}: {}", key, e);
                    self.retire(key, &slot);
                    return Err(e);
                }
            };

            let set = Arc::new(TemplateSet::new(key.clone(), resources));
            *entry = Some(Arc::clone(&set));
            debug!("Cached {} resources for {}", set.len(), key);
            return Ok(set);
        }
    }

    /// Whether `key` has been materialized.
    ///
    /// Waits for an in-flight materialization of the same key.
    pub fn is_cached(&self, key: &TemplateSetKey) -> bool {
        let slot = self.slots.lock().get(&key.cache_key()).cloned();
        slot.map(|slot| slot.lock().is_some()).unwrap_or(false)
    }

    /// Keys of all materialized template sets, sorted.
    pub fn cached_keys(&self) -> Vec<String> {
        let slots: Vec<(String, Slot)> = self
            .slots
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect();

        let mut keys: Vec<String> = slots
            .into_iter()
            .filter(|(_, slot)| slot.lock().is_some())
            .map(|(key, _)| key)
            .collect();
        keys.sort();
        keys
    }

    /// Number of materialized template sets.
    pub fn len(&self) -> usize {
        self.cached_keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &TemplateSetKey) -> Slot {
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry(key.cache_key()).or_default())
    }

    fn is_current(&self, key: &TemplateSetKey, slot: &Slot) -> bool {
        self.slots
            .lock()
            .get(&key.cache_key())
            .map(|current| Arc::ptr_eq(current, slot))
            .unwrap_or(false)
    }

    /// Remove an empty slot so failed keys do not accumulate.
    fn retire(&self, key: &TemplateSetKey, slot: &Slot) {
        let mut slots = self.slots.lock();
        if slots
            .get(&key.cache_key())
            .map(|current| Arc::ptr_eq(current, slot))
            .unwrap_or(false)
        {
            slots.remove(&key.cache_key());
        }
    }
}

impl fmt::Debug for TemplateCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateCache")
            .field("templates_path", &self.config.templates_path())
            .field("cached", &self.cached_keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;
    use crate::materializer::StaticMaterializer;
    use mockall::mock;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    mock! {
        pub Engine {}

        impl Materializer for Engine {
            fn materialize(&self, dir: &Path) -> TemplateResult<Vec<Resource>>;
        }
    }

    fn service() -> Resource {
        Resource::from_value(json!({
            "kind": "Service",
            "metadata": { "name": "hub-api", "namespace": "default" }
        }))
        .unwrap()
    }

    fn cache_with(materializer: Arc<dyn Materializer>) -> TemplateCache {
        TemplateCache::initialize(TemplatesConfig::new("/templates"), materializer)
    }

    #[test]
    fn test_key_format() {
        let key = TemplateSetKey::new("multiclusterhub", "2.4.0");
        assert_eq!(key.cache_key(), "multiclusterhub-2.4.0");
        assert_eq!(key.to_string(), "multiclusterhub-2.4.0");
    }

    #[test]
    fn test_materializes_once_per_key() {
        let mut engine = MockEngine::new();
        engine
            .expect_materialize()
            .withf(|dir| dir.ends_with("multiclusterhub/base"))
            .times(1)
            .returning(|_| Ok(vec![service()]));
        let cache = cache_with(Arc::new(engine));

        let first = cache.get_templates("multiclusterhub", "1.0.0").unwrap();
        for _ in 0..5 {
            let again = cache.get_templates("multiclusterhub", "1.0.0").unwrap();
            assert!(Arc::ptr_eq(&first, &again));
        }
        assert_eq!(first.resources(), &[service()]);
        assert_eq!(cache.cached_keys(), vec!["multiclusterhub-1.0.0".to_string()]);
    }

    #[test]
    fn test_versions_are_separate_keys() {
        let engine = Arc::new(StaticMaterializer::new(vec![service()]));
        let cache = cache_with(engine.clone());

        cache.get_templates("multiclusterhub", "1.0.0").unwrap();
        cache.get_templates("multiclusterhub", "1.1.0").unwrap();
        cache.get_templates("multiclusterhub", "1.0.0").unwrap();

        assert_eq!(engine.calls(), 2);
        assert_eq!(cache.len(), 2);
        assert!(cache.is_cached(&TemplateSetKey::new("multiclusterhub", "1.1.0")));
        assert!(!cache.is_cached(&TemplateSetKey::new("multiclusterhub", "2.0.0")));
    }

    #[test]
    fn test_failure_is_not_cached() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let mut engine = MockEngine::new();
        engine.expect_materialize().times(2).returning(move |dir| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(TemplateError::NotFound(dir.to_path_buf()))
            } else {
                Ok(vec![service()])
            }
        });
        let cache = cache_with(Arc::new(engine));

        let err = cache.get_templates("multiclusterhub", "1.0.0").unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(ref p) if p == &PathBuf::from("/templates/multiclusterhub/base")));
        assert!(cache.is_empty());

        let set = cache.get_templates("multiclusterhub", "1.0.0").unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_keys_leave_no_slots() {
        let mut engine = MockEngine::new();
        engine
            .expect_materialize()
            .times(50)
            .returning(|dir| Err(TemplateError::NotFound(dir.to_path_buf())));
        let cache = cache_with(Arc::new(engine));

        for minor in 0..50 {
            let version = format!("1.{}.0", minor);
            assert!(cache.get_templates("multiclusterhub", &version).is_err());
        }

        assert!(cache.slots.lock().is_empty());
        assert!(cache.cached_keys().is_empty());
    }

    #[test]
    fn test_retry_after_retired_slot() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let mut engine = MockEngine::new();
        engine.expect_materialize().times(3).returning(move |dir| {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(TemplateError::NotFound(dir.to_path_buf()))
            } else {
                Ok(vec![service()])
            }
        });
        let cache = cache_with(Arc::new(engine));

        assert!(cache.get_templates("multiclusterhub", "1.0.0").is_err());
        assert!(cache.get_templates("multiclusterhub", "1.0.0").is_err());
        assert_eq!(cache.slots.lock().len(), 0);

        let set = cache.get_templates("multiclusterhub", "1.0.0").unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(cache.slots.lock().len(), 1);
    }

    struct FailThenSucceed {
        calls: AtomicUsize,
    }

    impl Materializer for FailThenSucceed {
        fn materialize(&self, dir: &Path) -> TemplateResult<Vec<Resource>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            if call == 0 {
                Err(TemplateError::NotFound(dir.to_path_buf()))
            } else {
                Ok(vec![service()])
            }
        }
    }

    #[test]
    fn test_waiters_recover_after_concurrent_failure() {
        let engine = Arc::new(FailThenSucceed {
            calls: AtomicUsize::new(0),
        });
        let cache = cache_with(engine.clone());

        let results: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| cache.get_templates("multiclusterhub", "1.0.0")))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.cached_keys(), vec!["multiclusterhub-1.0.0".to_string()]);
        assert_eq!(cache.slots.lock().len(), 1);
    }

    struct SlowMaterializer {
        calls: AtomicUsize,
    }

    impl Materializer for SlowMaterializer {
        fn materialize(&self, _dir: &Path) -> TemplateResult<Vec<Resource>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            Ok(vec![service()])
        }
    }

    #[test]
    fn test_concurrent_first_access_materializes_once() {
        let engine = Arc::new(SlowMaterializer {
            calls: AtomicUsize::new(0),
        });
        let cache = cache_with(engine.clone());

        let sets: Vec<Arc<TemplateSet>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| cache.get_templates("multiclusterhub", "1.0.0").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
        assert!(sets.iter().all(|s| Arc::ptr_eq(s, &sets[0])));
    }
}
