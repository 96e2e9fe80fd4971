//! Generic resource model.
//!
//! Concrete providers may use their own typed representations; anything that
//! implements [`HasMetadata`] can flow through the reconciliation core.
//! [`GenericResource`] is the schema-less representation used when the `spec`
//! of a resource is only known as JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ResourceType;

/// Annotation marking a desired resource for deletion.
///
/// A desired resource carrying `converge.io/delete: true` is reconciled as a
/// DELETE even when an observed counterpart exists.
pub const ANNOTATION_DELETE: &str = "converge.io/delete";

/// Name, labels and annotations shared by every resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, Value>,
}

impl ObjectMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn label(&self, key: &str) -> Option<&Value> {
        self.labels.get(key)
    }

    pub fn annotation(&self, key: &str) -> Option<&Value> {
        self.annotations.get(key)
    }

    /// Whether the delete annotation is set to `true` (boolean or string).
    pub fn is_marked_for_deletion(&self) -> bool {
        match self.annotation(ANNOTATION_DELETE) {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

/// Implemented by every resource representation.
pub trait HasMetadata {
    fn metadata(&self) -> &ObjectMeta;

    fn metadata_mut(&mut self) -> &mut ObjectMeta;

    fn resource_type(&self) -> ResourceType;

    fn name(&self) -> &str {
        &self.metadata().name
    }
}

/// A resource whose spec is an untyped JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericResource {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: Value,
}

impl GenericResource {
    pub fn new(resource_type: &ResourceType, name: impl Into<String>) -> Self {
        Self {
            api_version: resource_type.api_version_string(),
            kind: resource_type.kind.clone(),
            metadata: ObjectMeta::new(name),
            spec: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_spec(mut self, spec: Value) -> Self {
        self.spec = spec;
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata = self.metadata.with_label(key, value);
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata = self.metadata.with_annotation(key, value);
        self
    }
}

impl HasMetadata for GenericResource {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn resource_type(&self) -> ResourceType {
        ResourceType::from_api_version(&self.api_version, self.kind.clone())
    }
}
