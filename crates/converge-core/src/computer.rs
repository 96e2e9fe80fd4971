//! Change computation
//!
//! Diffs a keyed collection of observed resources against the desired ones.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

use converge_resources::{HasMetadata, ObjectMeta, ResourceType};
use serde::Serialize;
use serde_json::Value;

use crate::change::{Operation, ResourceChange, StateChange};

type KeyFn<R, K> = Box<dyn Fn(&R) -> K + Send + Sync>;
type ChangeFn<R, K> = Box<dyn Fn(&K, Option<&R>, Option<&R>) -> ResourceChange + Send + Sync>;

/// Turns observed and desired collections into typed changes.
///
/// `key_of` identifies a resource across both sides. `change_of` builds the
/// change for a key from its observed (`before`) and desired (`after`)
/// representations; the computer then forces the operation:
///
/// - desired only: CREATE
/// - observed only (orphan, when `delete_orphans` is set): DELETE
/// - both, desired marked for deletion: DELETE
/// - both: NONE when every attribute is NONE, UPDATE otherwise
///
/// Output follows the desired order, then orphans in observed order. When
/// several observed resources share a key, the first one is used and the
/// rest are ignored.
pub struct ChangeComputer<R, K> {
    key_of: KeyFn<R, K>,
    change_of: ChangeFn<R, K>,
    delete_orphans: bool,
}

impl<R, K> ChangeComputer<R, K>
where
    R: HasMetadata,
    K: Eq + Hash,
{
    pub fn new(
        key_of: impl Fn(&R) -> K + Send + Sync + 'static,
        change_of: impl Fn(&K, Option<&R>, Option<&R>) -> ResourceChange + Send + Sync + 'static,
    ) -> Self {
        Self {
            key_of: Box::new(key_of),
            change_of: Box::new(change_of),
            delete_orphans: false,
        }
    }

    pub fn with_delete_orphans(mut self, delete_orphans: bool) -> Self {
        self.delete_orphans = delete_orphans;
        self
    }

    pub fn delete_orphans(&self) -> bool {
        self.delete_orphans
    }

    pub fn compute_changes(&self, observed: &[R], desired: &[R]) -> Vec<ResourceChange> {
        // key -> index of the observed resource still waiting for a counterpart
        let mut remaining: HashMap<K, usize> = HashMap::with_capacity(observed.len());
        for (i, before) in observed.iter().enumerate() {
            match remaining.entry((self.key_of)(before)) {
                Entry::Vacant(slot) => {
                    slot.insert(i);
                }
                Entry::Occupied(_) => {
                    tracing::warn!(
                        resource = %before.name(),
                        index = i,
                        "Ignoring observed resource with duplicate key"
                    );
                }
            }
        }

        let mut changes = Vec::with_capacity(desired.len());
        for after in desired {
            let key = (self.key_of)(after);
            let change = match remaining.remove(&key).map(|i| &observed[i]) {
                None if after.metadata().is_marked_for_deletion() => {
                    // Nothing to delete.
                    (self.change_of)(&key, None, Some(after)).into_noop()
                }
                None => self.forced(&key, None, Some(after), Operation::Create),
                Some(before) if after.metadata().is_marked_for_deletion() => {
                    self.forced(&key, Some(before), None, Operation::Delete)
                }
                Some(before) => {
                    let mut change = (self.change_of)(&key, Some(before), Some(after));
                    change.op = ResourceChange::op_of(&change.changes);
                    change
                }
            };
            changes.push(change);
        }

        let orphans = observed.iter().enumerate().filter_map(|(i, before)| {
            let key = (self.key_of)(before);
            (remaining.get(&key) == Some(&i)).then_some((key, before))
        });

        if self.delete_orphans {
            for (key, before) in orphans {
                changes.push(self.forced(&key, Some(before), None, Operation::Delete));
            }
        } else {
            let dropped = orphans.count();
            if dropped > 0 {
                tracing::debug!(count = dropped, "Ignoring orphaned resources");
            }
        }

        changes
    }

    fn forced(&self, key: &K, before: Option<&R>, after: Option<&R>, op: Operation) -> ResourceChange {
        let mut change = (self.change_of)(key, before, after);
        change.op = op;
        change
    }
}

impl<R> ChangeComputer<R, String>
where
    R: HasMetadata + Serialize + 'static,
{
    /// A computer keyed by resource name, diffing every serialized field
    /// except `apiVersion`, `kind` and `metadata`.
    pub fn by_name() -> Self {
        Self::new(|r: &R| r.name().to_string(), diff_resources::<R, String>)
    }
}

/// Build a change by diffing the serialized representations of both sides.
///
/// Metadata comes from the desired side when present, otherwise the observed
/// one.
pub fn diff_resources<R, K>(_key: &K, before: Option<&R>, after: Option<&R>) -> ResourceChange
where
    R: HasMetadata + Serialize,
{
    let source = after.or(before);
    let (resource_type, metadata) = match source {
        Some(r) => (r.resource_type(), r.metadata().clone()),
        None => (ResourceType::new("", "", ""), ObjectMeta::default()),
    };

    let before_value = before.map(comparable);
    let after_value = after.map(comparable);
    let changes = StateChange::diff(before_value.as_ref(), after_value.as_ref());
    ResourceChange::from_state_changes(resource_type, metadata, changes)
}

fn comparable<R: Serialize>(resource: &R) -> Value {
    match serde_json::to_value(resource) {
        Ok(Value::Object(mut map)) => {
            map.remove("apiVersion");
            map.remove("kind");
            map.remove("metadata");
            Value::Object(map)
        }
        Ok(other) => other,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to serialize resource for diffing");
            Value::Null
        }
    }
}
