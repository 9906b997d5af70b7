//! Integration tests for on-disk template sets and the template cache.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use hub_templates::{
    DirectoryMaterializer, Materializer, TemplateCache, TemplateError, TemplateSetKey,
    TemplatesConfig, HUB_TEMPLATE_KIND,
};
use tempfile::tempdir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Lay out `<root>/multiclusterhub/base` with a kustomization that pulls in
/// a file and a nested directory.
fn hub_templates(root: &Path) {
    write(
        root,
        "multiclusterhub/base/kustomization.yaml",
        r#"
apiVersion: kustomize.config.k8s.io/v1beta1
kind: Kustomization
commonLabels:
  app: hub
resources:
  - rbac
  - deployment.yaml
"#,
    );
    write(
        root,
        "multiclusterhub/base/deployment.yaml",
        r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: hub-api
  namespace: default
spec:
  replicas: 1
"#,
    );
    write(
        root,
        "multiclusterhub/base/rbac/role.yaml",
        r#"
apiVersion: rbac.authorization.k8s.io/v1
kind: ClusterRole
metadata:
  name: hub-reader
---
apiVersion: rbac.authorization.k8s.io/v1
kind: ClusterRoleBinding
metadata:
  name: hub-reader
roleRef:
  apiGroup: rbac.authorization.k8s.io
  kind: ClusterRole
  name: hub-reader
subjects:
  - kind: ServiceAccount
    name: hub-api
    namespace: default
"#,
    );
    // Not referenced by the kustomization, so never loaded.
    write(
        root,
        "multiclusterhub/base/unused.yaml",
        "kind: ConfigMap\nmetadata:\n  name: unused\n",
    );
}

#[test]
fn test_kustomization_resources_in_order() {
    let temp = tempdir().unwrap();
    hub_templates(temp.path());

    let resources = DirectoryMaterializer::new()
        .materialize(&temp.path().join("multiclusterhub/base"))
        .unwrap();

    let kinds: Vec<_> = resources.iter().map(|r| r.kind().unwrap()).collect();
    assert_eq!(kinds, vec!["ClusterRole", "ClusterRoleBinding", "Deployment"]);
    // commonLabels is engine grammar and is not applied here
    assert!(resources[2].labels().is_empty());
}

#[test]
fn test_plain_directory_in_path_order() {
    let temp = tempdir().unwrap();
    write(temp.path(), "set/b-service.yaml", "kind: Service\n");
    write(temp.path(), "set/a-config.yml", "kind: ConfigMap\n");
    write(temp.path(), "set/nested/c-account.yaml", "kind: ServiceAccount\n");
    write(temp.path(), "set/notes.txt", "not a template");

    let resources = DirectoryMaterializer::new()
        .materialize(&temp.path().join("set"))
        .unwrap();

    let kinds: Vec<_> = resources.iter().map(|r| r.kind().unwrap()).collect();
    assert_eq!(kinds, vec!["ConfigMap", "Service", "ServiceAccount"]);
}

#[test]
fn test_missing_kustomization_entry() {
    let temp = tempdir().unwrap();
    write(
        temp.path(),
        "set/kustomization.yaml",
        "resources:\n  - missing.yaml\n",
    );

    let err = DirectoryMaterializer::new()
        .materialize(&temp.path().join("set"))
        .unwrap_err();
    assert!(matches!(err, TemplateError::NotFound(p) if p.ends_with("missing.yaml")));
}

#[test]
fn test_remote_kustomization_entry_rejected() {
    let temp = tempdir().unwrap();
    write(
        temp.path(),
        "set/kustomization.yaml",
        "resources:\n  - https://example.com/base\n",
    );

    let err = DirectoryMaterializer::new()
        .materialize(&temp.path().join("set"))
        .unwrap_err();
    assert!(matches!(err, TemplateError::Materialization { .. }));
}

#[test]
fn test_kustomization_cycle_rejected() {
    let temp = tempdir().unwrap();
    write(temp.path(), "a/kustomization.yaml", "resources:\n  - ../b\n");
    write(temp.path(), "b/kustomization.yaml", "resources:\n  - ../a\n");

    let err = DirectoryMaterializer::new()
        .materialize(&temp.path().join("a"))
        .unwrap_err();
    assert!(matches!(err, TemplateError::Materialization { .. }));
}

#[test]
fn test_cache_serves_disk_templates() {
    let temp = tempdir().unwrap();
    hub_templates(temp.path());

    let cache = TemplateCache::initialize(
        TemplatesConfig::new(temp.path()),
        Arc::new(DirectoryMaterializer::new()),
    );

    let first = cache.get_templates(HUB_TEMPLATE_KIND, "1.0.0").unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(first.key(), &TemplateSetKey::new(HUB_TEMPLATE_KIND, "1.0.0"));

    // Removing the files does not matter once the set is cached.
    fs::remove_dir_all(temp.path().join("multiclusterhub")).unwrap();
    let second = cache.get_templates(HUB_TEMPLATE_KIND, "1.0.0").unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    // A new version is a new key and has to hit the disk again.
    let err = cache.get_templates(HUB_TEMPLATE_KIND, "1.1.0").unwrap_err();
    assert!(matches!(err, TemplateError::NotFound(_)));
    assert_eq!(cache.cached_keys(), vec!["multiclusterhub-1.0.0".to_string()]);
}

#[test]
fn test_cache_retries_after_failure() {
    let temp = tempdir().unwrap();
    let cache = TemplateCache::initialize(
        TemplatesConfig::new(temp.path()),
        Arc::new(DirectoryMaterializer::new()),
    );

    assert!(cache.get_templates(HUB_TEMPLATE_KIND, "1.0.0").is_err());
    assert!(cache.is_empty());

    hub_templates(temp.path());
    let set = cache.get_templates(HUB_TEMPLATE_KIND, "1.0.0").unwrap();
    assert_eq!(set.len(), 3);
}
