//! On-disk template materialization.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{TemplateError, TemplateResult};
use crate::materializer::Materializer;
use crate::resource::{yaml_to_json, Resource};

/// File names recognised as a kustomization entry point.
pub const KUSTOMIZATION_FILES: [&str; 3] =
    ["kustomization.yaml", "kustomization.yml", "Kustomization"];

/// The subset of a kustomization this loader understands.
#[derive(Debug, Default, Deserialize)]
struct Kustomization {
    #[serde(default)]
    resources: Vec<String>,
    #[serde(flatten)]
    other: BTreeMap<String, serde_yaml::Value>,
}

/// Materializes a template directory from YAML files on disk.
///
/// When the directory has a kustomization file, only its `resources` list is
/// followed, in order; directories listed there are materialized
/// recursively. Every other kustomization field belongs to the templating
/// engine and is ignored. Without a kustomization file, all `*.yaml` and
/// `*.yml` files below the directory are loaded in path order; symlinks are
/// followed and a link loop is an error.
#[derive(Debug, Clone, Default)]
pub struct DirectoryMaterializer;

impl DirectoryMaterializer {
    pub fn new() -> Self {
        Self
    }

    fn materialize_dir(
        &self,
        dir: &Path,
        stack: &mut Vec<PathBuf>,
    ) -> TemplateResult<Vec<Resource>> {
        if !dir.is_dir() {
            return Err(TemplateError::NotFound(dir.to_path_buf()));
        }

        let canonical = dir.canonicalize()?;
        if stack.contains(&canonical) {
            return Err(TemplateError::materialization(
                dir,
                "kustomization resources form a cycle",
            ));
        }
        stack.push(canonical);

        let result = match find_kustomization(dir) {
            Some(kustomization) => self.load_kustomization(dir, &kustomization, stack),
            None => self.load_tree(dir),
        };

        stack.pop();
        result
    }

    fn load_kustomization(
        &self,
        dir: &Path,
        path: &Path,
        stack: &mut Vec<PathBuf>,
    ) -> TemplateResult<Vec<Resource>> {
        debug!("Loading kustomization from {:?}", path);
        let content = fs::read_to_string(path)?;
        let kustomization: Kustomization = if content.trim().is_empty() {
            Kustomization::default()
        } else {
            serde_yaml::from_str(&content)?
        };

        for field in kustomization.other.keys() {
            if field != "apiVersion" && field != "kind" {
                warn!("Ignoring kustomization field '{}' in {:?}", field, path);
            }
        }

        let mut resources = Vec::new();
        for entry in &kustomization.resources {
            if entry.contains("://") {
                return Err(TemplateError::materialization(
                    path,
                    format!("remote resource '{}' is not supported", entry),
                ));
            }

            let target = dir.join(entry);
            if target.is_dir() {
                resources.extend(self.materialize_dir(&target, stack)?);
            } else if target.is_file() {
                resources.extend(load_file(&target)?);
            } else {
                return Err(TemplateError::NotFound(target));
            }
        }

        Ok(resources)
    }

    fn load_tree(&self, dir: &Path) -> TemplateResult<Vec<Resource>> {
        let mut resources = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .follow_links(true)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        {
            let entry = entry.map_err(|e| TemplateError::materialization(dir, e.to_string()))?;
            let path = entry.path();
            if entry.file_type().is_file() && is_yaml_file(path) {
                resources.extend(load_file(path)?);
            }
        }

        Ok(resources)
    }
}

impl Materializer for DirectoryMaterializer {
    fn materialize(&self, dir: &Path) -> TemplateResult<Vec<Resource>> {
        let resources = self.materialize_dir(dir, &mut Vec::new())?;
        info!("Materialized {} resources from {:?}", resources.len(), dir);
        Ok(resources)
    }
}

fn find_kustomization(dir: &Path) -> Option<PathBuf> {
    KUSTOMIZATION_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

fn is_yaml_file(path: &Path) -> bool {
    let is_kustomization = path
        .file_name()
        .map(|name| KUSTOMIZATION_FILES.iter().any(|k| name == *k))
        .unwrap_or(false);

    !is_kustomization
        && path
            .extension()
            .map(|ext| ext == "yaml" || ext == "yml")
            .unwrap_or(false)
}

/// Load every document of a YAML file as a resource.
///
/// Empty documents are skipped; a document that is not a mapping or has no
/// `kind` is rejected. Scalar mapping keys are read as strings.
pub fn load_file(path: &Path) -> TemplateResult<Vec<Resource>> {
    debug!("Loading resources from {:?}", path);
    let content = fs::read_to_string(path)?;
    let mut resources = Vec::new();

    for document in serde_yaml::Deserializer::from_str(&content) {
        let value = serde_yaml::Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }

        let value = yaml_to_json(value)
            .map_err(|e| TemplateError::invalid_resource(path, e.to_string()))?;
        let resource = Resource::from_value(value)
            .ok_or_else(|| TemplateError::invalid_resource(path, "document is not a mapping"))?;
        if resource.kind().is_none() {
            return Err(TemplateError::invalid_resource(path, "document has no kind"));
        }
        resources.push(resource);
    }

    Ok(resources)
}
