//! Typed view of a ClusterRoleBinding.
//!
//! Decoding from and encoding to the untyped [`Resource`] form are both
//! fallible; fields this view does not model are carried through unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use hub_templates::Resource;

use crate::error::{RenderError, RenderResult};

pub const CLUSTER_ROLE_BINDING_KIND: &str = "ClusterRoleBinding";

/// Subject kind that is never namespaced.
pub const GROUP_SUBJECT_KIND: &str = "Group";

/// The role a binding grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRef {
    #[serde(default)]
    pub api_group: String,
    pub kind: String,
    pub name: String,
}

/// An entity the role is granted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_group: Option<String>,
}

impl Subject {
    pub fn is_group(&self) -> bool {
        self.kind == GROUP_SUBJECT_KIND
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRoleBinding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    pub kind: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub role_ref: RoleRef,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClusterRoleBinding {
    /// Decode the typed form from a resource.
    pub fn decode(resource: &Resource) -> RenderResult<Self> {
        let binding: Self = serde_json::from_value(Value::Object(resource.as_object().clone()))
            .map_err(|e| conversion_error(resource.name(), e.to_string()))?;

        if binding.kind != CLUSTER_ROLE_BINDING_KIND {
            return Err(conversion_error(
                resource.name(),
                format!("unexpected kind {}", binding.kind),
            ));
        }
        Ok(binding)
    }

    /// Encode back into an untyped resource.
    pub fn encode(&self) -> RenderResult<Resource> {
        let value =
            serde_json::to_value(self).map_err(|e| conversion_error(self.name(), e.to_string()))?;
        Resource::from_value(value)
            .ok_or_else(|| conversion_error(self.name(), "encoded form is not an object"))
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata.get("name").and_then(Value::as_str)
    }

    /// The first subject, which is the one namespace rewriting applies to.
    pub fn first_subject(&self) -> RenderResult<&Subject> {
        self.subjects
            .first()
            .ok_or_else(|| missing_subject(&self.metadata))
    }

    pub fn first_subject_mut(&mut self) -> RenderResult<&mut Subject> {
        let Self {
            subjects, metadata, ..
        } = self;
        subjects
            .first_mut()
            .ok_or_else(|| missing_subject(metadata))
    }
}

fn missing_subject(metadata: &Map<String, Value>) -> RenderError {
    let name = metadata.get("name").and_then(Value::as_str);
    RenderError::MissingSubject(name.unwrap_or_default().to_string())
}

fn conversion_error(name: Option<&str>, message: impl Into<String>) -> RenderError {
    RenderError::Conversion {
        kind: CLUSTER_ROLE_BINDING_KIND.to_string(),
        name: name.unwrap_or_default().to_string(),
        message: message.into(),
    }
}
