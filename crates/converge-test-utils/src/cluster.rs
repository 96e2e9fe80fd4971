//! [`InMemoryCluster`] fixture.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use converge_core::{Operation, ResourceChange};
use converge_resources::GenericResource;
use serde_json::{Map, Value};

/// Named resources shared between a collector and the handlers applying
/// changes to them.
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCluster {
    resources: Arc<Mutex<BTreeMap<String, GenericResource>>>,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cluster (builder pattern).
    pub fn with(self, resource: GenericResource) -> Self {
        self.insert(resource);
        self
    }

    pub fn insert(&self, resource: GenericResource) {
        self.lock().insert(resource.metadata.name.clone(), resource);
    }

    pub fn get(&self, name: &str) -> Option<GenericResource> {
        self.lock().get(name).cloned()
    }

    /// Snapshot in name order.
    pub fn resources(&self) -> Vec<GenericResource> {
        self.lock().values().cloned().collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Apply a change as a real system would.
    ///
    /// CREATE and UPDATE rebuild the spec from the desired value of every
    /// attribute; DELETE removes the resource.
    pub fn apply(&self, change: &ResourceChange) {
        match change.op {
            Operation::None => {}
            Operation::Delete => {
                self.lock().remove(change.name());
            }
            Operation::Create | Operation::Update => {
                let mut spec = Value::Object(Map::new());
                for state in &change.changes {
                    if let Some(after) = &state.after {
                        set_path(&mut spec, &state.name, after.clone());
                    }
                }
                let mut resource = GenericResource::new(&change.resource_type, change.name());
                resource.metadata = change.metadata.clone();
                resource.spec = spec.get("spec").cloned().unwrap_or(Value::Null);
                self.insert(resource);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, GenericResource>> {
        self.resources.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn set_path(root: &mut Value, path: &str, value: Value) {
    let mut current = root;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if parts.peek().is_none() {
            map.insert(part.to_string(), value);
            return;
        }
        current = map
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}
