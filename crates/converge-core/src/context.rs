//! Reconciliation context
//!
//! Immutable value built once per reconciliation invocation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use converge_extensions::{ConfigProperty, Configuration};
use converge_resources::{ObjectMeta, ResourceType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::change::Operation;

/// Configuration key enabling deletion of orphaned resources.
pub const DELETE_ORPHANS_KEY: &str = "delete-orphans";

/// The `delete-orphans` property (default `false`).
pub fn delete_orphans_property() -> ConfigProperty<bool> {
    ConfigProperty::new(DELETE_ORPHANS_KEY)
        .with_description("Delete observed resources that have no desired counterpart")
        .with_default(false)
}

/// Which operations a reconciliation may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconciliationMode {
    /// Only create missing resources.
    Create,
    /// Create missing resources and update existing ones.
    Update,
    /// Only delete resources.
    Delete,
    /// Create, update and delete.
    #[default]
    Full,
}

impl ReconciliationMode {
    pub fn allows(self, op: Operation) -> bool {
        match (self, op) {
            (_, Operation::None) => true,
            (Self::Full, _) => true,
            (Self::Create, Operation::Create) => true,
            (Self::Update, Operation::Create | Operation::Update) => true,
            (Self::Delete, Operation::Delete) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ReconciliationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Full => "FULL",
        };
        write!(f, "{s}")
    }
}

/// A predicate choosing which resources take part in a reconciliation.
///
/// Implemented for any `Fn(&ObjectMeta, &ResourceType) -> bool`.
pub trait ResourceSelector: Send + Sync {
    fn accepts(&self, metadata: &ObjectMeta, resource_type: &ResourceType) -> bool;
}

impl<F> ResourceSelector for F
where
    F: Fn(&ObjectMeta, &ResourceType) -> bool + Send + Sync,
{
    fn accepts(&self, metadata: &ObjectMeta, resource_type: &ResourceType) -> bool {
        self(metadata, resource_type)
    }
}

/// Options for one reconciliation.
#[derive(Clone, Default)]
pub struct ReconciliationContext {
    /// If true, compute and report changes without invoking any handler.
    pub dry_run: bool,
    pub mode: ReconciliationMode,
    pub selectors: Vec<Arc<dyn ResourceSelector>>,
    /// Labels stamped on every desired resource.
    pub labels: BTreeMap<String, Value>,
    /// Annotations stamped on every desired resource.
    pub annotations: BTreeMap<String, Value>,
    pub configuration: Configuration,
}

impl ReconciliationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run() -> Self {
        Self::default().with_dry_run(true)
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_mode(mut self, mode: ReconciliationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_selector(mut self, selector: impl ResourceSelector + 'static) -> Self {
        self.selectors.push(Arc::new(selector));
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }

    /// Whether every selector accepts the resource.
    pub fn accepts(&self, metadata: &ObjectMeta, resource_type: &ResourceType) -> bool {
        self.selectors.iter().all(|s| s.accepts(metadata, resource_type))
    }

    /// Copy the context labels and annotations onto `metadata`. Keys already
    /// present on the resource are kept.
    pub fn stamp(&self, metadata: &mut ObjectMeta) {
        for (key, value) in &self.labels {
            metadata
                .labels
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        for (key, value) in &self.annotations {
            metadata
                .annotations
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// The `delete-orphans` setting from the configuration.
    pub fn delete_orphans(&self) -> Result<bool, converge_extensions::ConfigError> {
        delete_orphans_property().get(&self.configuration)
    }
}

impl fmt::Debug for ReconciliationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconciliationContext")
            .field("dry_run", &self.dry_run)
            .field("mode", &self.mode)
            .field("selectors", &self.selectors.len())
            .field("labels", &self.labels)
            .field("annotations", &self.annotations)
            .field("configuration", &self.configuration)
            .finish()
    }
}
