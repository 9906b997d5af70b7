//! Structured resource documents.
//!
//! A [`Resource`] is an untyped object tree (`apiVersion`, `kind`,
//! `metadata`, and an arbitrary body) as produced by the templating engine.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::TemplateResult;

/// A semi-typed resource document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource {
    object: Map<String, Value>,
}

impl Resource {
    /// Wrap an object map.
    pub fn from_object(object: Map<String, Value>) -> Self {
        Self { object }
    }

    /// Wrap a JSON value, returning `None` when it is not an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(object) => Some(Self { object }),
            _ => None,
        }
    }

    /// Parse a single YAML document.
    ///
    /// Scalar mapping keys such as `8080` or `true` become strings.
    pub fn from_yaml(content: &str) -> TemplateResult<Self> {
        let value = yaml_to_json(serde_yaml::from_str(content)?)?;
        Self::from_value(value)
            .ok_or_else(|| serde_yaml::Error::custom("document is not a mapping").into())
    }

    /// Render the resource as a YAML document.
    pub fn to_yaml(&self) -> TemplateResult<String> {
        Ok(serde_yaml::to_string(&self.object)?)
    }

    pub fn as_object(&self) -> &Map<String, Value> {
        &self.object
    }

    pub fn into_object(self) -> Map<String, Value> {
        self.object
    }

    /// Declared kind, used for dispatch.
    pub fn kind(&self) -> Option<&str> {
        self.object.get("kind").and_then(Value::as_str)
    }

    pub fn api_version(&self) -> Option<&str> {
        self.object.get("apiVersion").and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata_str("name")
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata_str("namespace")
    }

    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        self.metadata_mut()
            .insert("namespace".to_string(), Value::String(namespace.into()));
    }

    /// String-valued labels. Non-string values are skipped.
    pub fn labels(&self) -> BTreeMap<String, String> {
        self.string_map("labels")
    }

    /// Look up a single label.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.metadata_field(key, "labels")
    }

    /// Set a label, creating `metadata.labels` when absent.
    pub fn set_label(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let metadata = self.metadata_mut();
        let labels = metadata
            .entry("labels")
            .or_insert_with(|| Value::Object(Map::new()));
        if !labels.is_object() {
            *labels = Value::Object(Map::new());
        }
        if let Value::Object(labels) = labels {
            labels.insert(key.into(), Value::String(value.into()));
        }
    }

    /// String-valued annotations. Non-string values are skipped.
    pub fn annotations(&self) -> BTreeMap<String, String> {
        self.string_map("annotations")
    }

    /// Look up a single annotation. Returns `None` for non-string values.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata_field(key, "annotations")
    }

    fn metadata(&self) -> Option<&Map<String, Value>> {
        self.object.get("metadata").and_then(Value::as_object)
    }

    fn metadata_mut(&mut self) -> &mut Map<String, Value> {
        let metadata = self
            .object
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()));
        if !metadata.is_object() {
            *metadata = Value::Object(Map::new());
        }
        match metadata {
            Value::Object(map) => map,
            _ => unreachable!("metadata was just replaced with an object"),
        }
    }

    fn metadata_str(&self, field: &str) -> Option<&str> {
        self.metadata()?.get(field).and_then(Value::as_str)
    }

    fn metadata_field(&self, key: &str, section: &str) -> Option<&str> {
        self.metadata()?
            .get(section)?
            .as_object()?
            .get(key)
            .and_then(Value::as_str)
    }

    fn string_map(&self, section: &str) -> BTreeMap<String, String> {
        self.metadata()
            .and_then(|m| m.get(section))
            .and_then(Value::as_object)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl From<Map<String, Value>> for Resource {
    fn from(object: Map<String, Value>) -> Self {
        Self::from_object(object)
    }
}

/// Convert a YAML value into the JSON object model.
///
/// Scalar keys are stringified; sequence or mapping keys and non-finite
/// floats have no JSON form and are rejected.
pub(crate) fn yaml_to_json(value: serde_yaml::Value) -> Result<Value, serde_yaml::Error> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => Value::Number(yaml_number(&n)?),
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<_, _>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => {
            let mut object = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                object.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            Value::Object(object)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn yaml_key(key: serde_yaml::Value) -> Result<String, serde_yaml::Error> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        other => Err(serde_yaml::Error::custom(format!(
            "mapping key {:?} is not a scalar",
            other
        ))),
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Result<Number, serde_yaml::Error> {
    if let Some(i) = n.as_i64() {
        Ok(i.into())
    } else if let Some(u) = n.as_u64() {
        Ok(u.into())
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .ok_or_else(|| serde_yaml::Error::custom(format!("number {} has no JSON form", n)))
    }
}
