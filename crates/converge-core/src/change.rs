//! Change model
//!
//! A [`ResourceChange`] is the computed difference for one resource instance,
//! made of field-level [`StateChange`]s. Executing it yields a
//! [`ChangeResult`].

use std::fmt;

use converge_resources::{ObjectMeta, ResourceType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ChangeApplicationError;

/// The operation needed to converge one resource or attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    None,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn is_none(self) -> bool {
        self == Operation::None
    }

    fn verb(self) -> &'static str {
        match self {
            Self::None => "keep",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "NONE",
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        };
        write!(f, "{s}")
    }
}

/// One named attribute-level difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub name: String,
    pub op: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,
}

impl StateChange {
    /// Tag an attribute by comparing its two sides.
    ///
    /// Absent before and present after is a CREATE, the reverse a DELETE,
    /// differing values an UPDATE, anything else NONE.
    pub fn compute(name: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        let op = match (&before, &after) {
            (None, None) => Operation::None,
            (None, Some(_)) => Operation::Create,
            (Some(_), None) => Operation::Delete,
            (Some(b), Some(a)) if b == a => Operation::None,
            (Some(_), Some(_)) => Operation::Update,
        };
        Self {
            name: name.into(),
            op,
            before,
            after,
        }
    }

    pub fn none(name: impl Into<String>, value: Value) -> Self {
        Self::compute(name, Some(value.clone()), Some(value))
    }

    pub fn create(name: impl Into<String>, after: Value) -> Self {
        Self::compute(name, None, Some(after))
    }

    pub fn delete(name: impl Into<String>, before: Value) -> Self {
        Self::compute(name, Some(before), None)
    }

    pub fn update(name: impl Into<String>, before: Value, after: Value) -> Self {
        Self::compute(name, Some(before), Some(after))
    }
}

impl fmt::Display for StateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<Value>| v.as_ref().map_or_else(|| "<none>".to_string(), Value::to_string);
        match self.op {
            Operation::Update => write!(
                f,
                "{}: {} -> {}",
                self.name,
                show(&self.before),
                show(&self.after)
            ),
            Operation::Create => write!(f, "+{}: {}", self.name, show(&self.after)),
            Operation::Delete => write!(f, "-{}: {}", self.name, show(&self.before)),
            Operation::None => write!(f, "{}: {}", self.name, show(&self.after)),
        }
    }
}

/// The computed difference for one resource instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceChange {
    pub resource_type: ResourceType,
    pub metadata: ObjectMeta,
    pub op: Operation,
    #[serde(default)]
    pub changes: Vec<StateChange>,
}

impl ResourceChange {
    pub fn new(
        resource_type: ResourceType,
        metadata: ObjectMeta,
        op: Operation,
        changes: Vec<StateChange>,
    ) -> Self {
        Self {
            resource_type,
            metadata,
            op,
            changes,
        }
    }

    /// Build an update-path change whose operation follows its attributes:
    /// all NONE gives NONE, anything else UPDATE.
    pub fn from_state_changes(
        resource_type: ResourceType,
        metadata: ObjectMeta,
        changes: Vec<StateChange>,
    ) -> Self {
        let op = Self::op_of(&changes);
        Self::new(resource_type, metadata, op, changes)
    }

    pub fn create(resource_type: ResourceType, metadata: ObjectMeta, changes: Vec<StateChange>) -> Self {
        Self::new(resource_type, metadata, Operation::Create, changes)
    }

    pub fn delete(resource_type: ResourceType, metadata: ObjectMeta, changes: Vec<StateChange>) -> Self {
        Self::new(resource_type, metadata, Operation::Delete, changes)
    }

    /// The operation implied by a set of attribute changes.
    pub fn op_of(changes: &[StateChange]) -> Operation {
        if changes.iter().all(|c| c.op.is_none()) {
            Operation::None
        } else {
            Operation::Update
        }
    }

    /// Turn this change into a NONE with no attribute changes.
    pub fn into_noop(mut self) -> Self {
        self.op = Operation::None;
        self.changes.clear();
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn is_noop(&self) -> bool {
        self.op.is_none()
    }

    /// Attribute changes other than NONE.
    pub fn effective_changes(&self) -> impl Iterator<Item = &StateChange> {
        self.changes.iter().filter(|c| !c.op.is_none())
    }

    /// Handler-independent description, e.g. `create Topic 'orders' (kafka/v1)`.
    pub fn describe(&self) -> String {
        let mut text = format!(
            "{} {} '{}' ({})",
            self.op.verb(),
            self.resource_type.kind,
            self.metadata.name,
            self.resource_type.api_version_string()
        );
        let effective: Vec<String> = self.effective_changes().map(ToString::to_string).collect();
        if self.op == Operation::Update && !effective.is_empty() {
            text.push_str(": ");
            text.push_str(&effective.join(", "));
        }
        text
    }
}

/// Outcome of executing one change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeStatus {
    /// Nothing needed doing.
    Ok,
    /// The change was applied, or would be in a dry run.
    Changed,
    /// Applying the change failed.
    Failed,
}

/// The result of executing one [`ResourceChange`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeResult {
    pub status: ChangeStatus,
    pub change: ResourceChange,
    pub description: String,
    /// Error causes, outermost first. Empty unless `status` is `Failed`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Whether a handler was invoked for this change.
    pub applied: bool,
}

impl ChangeResult {
    pub fn ok(change: ResourceChange, description: impl Into<String>) -> Self {
        Self {
            status: ChangeStatus::Ok,
            change,
            description: description.into(),
            errors: Vec::new(),
            applied: false,
        }
    }

    pub fn changed(change: ResourceChange, description: impl Into<String>, applied: bool) -> Self {
        Self {
            status: ChangeStatus::Changed,
            change,
            description: description.into(),
            errors: Vec::new(),
            applied,
        }
    }

    pub fn failed(
        change: ResourceChange,
        description: impl Into<String>,
        error: &ChangeApplicationError,
    ) -> Self {
        Self {
            status: ChangeStatus::Failed,
            change,
            description: description.into(),
            errors: error.causes(),
            applied: true,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == ChangeStatus::Failed
    }
}
