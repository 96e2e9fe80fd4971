//! Field-level JSON diffing
//!
//! Flattens two JSON documents into dotted attribute paths and tags every
//! attribute with the [`Operation`] that converges it.

use serde_json::{Map, Value};

use crate::change::{Operation, StateChange};

/// Maximum recursion depth for diff operations
const MAX_DIFF_DEPTH: usize = 32;

impl StateChange {
    /// Diff two optional JSON documents attribute by attribute.
    ///
    /// Non-empty objects are flattened into dotted paths (`config.retention`).
    /// Arrays, scalars and empty objects are leaves. A root that is not an
    /// object is reported under the empty path. The result is sorted by path
    /// and contains every attribute of either side, unchanged ones as NONE.
    ///
    /// ```
    /// use converge_core::{Operation, StateChange};
    /// use serde_json::json;
    ///
    /// let before = json!({"partitions": 3, "config": {"retention": "1d"}});
    /// let after = json!({"partitions": 6, "config": {"retention": "1d", "compact": true}});
    ///
    /// let changes = StateChange::diff(Some(&before), Some(&after));
    /// let ops: Vec<(&str, Operation)> = changes.iter().map(|c| (c.name.as_str(), c.op)).collect();
    /// assert_eq!(
    ///     ops,
    ///     vec![
    ///         ("config.compact", Operation::Create),
    ///         ("config.retention", Operation::None),
    ///         ("partitions", Operation::Update),
    ///     ]
    /// );
    /// ```
    pub fn diff(before: Option<&Value>, after: Option<&Value>) -> Vec<StateChange> {
        let mut changes = Vec::new();
        diff_with_depth(before, after, String::new(), &mut changes, 0);
        changes.sort_by(|a, b| a.name.cmp(&b.name));
        changes
    }

    /// Whether any attribute differs between the two documents.
    pub fn differs(before: Option<&Value>, after: Option<&Value>) -> bool {
        Self::diff(before, after).iter().any(|c| c.op != Operation::None)
    }
}

fn as_branch(value: Option<&Value>) -> Option<&Map<String, Value>> {
    match value {
        Some(Value::Object(map)) if !map.is_empty() => Some(map),
        _ => None,
    }
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn diff_with_depth(
    before: Option<&Value>,
    after: Option<&Value>,
    path: String,
    changes: &mut Vec<StateChange>,
    depth: usize,
) {
    let branches = if depth < MAX_DIFF_DEPTH {
        (as_branch(before), as_branch(after))
    } else {
        (None, None)
    };

    match branches {
        (Some(b), Some(a)) => {
            for (key, value) in b {
                diff_with_depth(Some(value), a.get(key), child_path(&path, key), changes, depth + 1);
            }
            for (key, value) in a {
                if !b.contains_key(key) {
                    diff_with_depth(None, Some(value), child_path(&path, key), changes, depth + 1);
                }
            }
        }
        // One side is a branch and the other is absent: flatten the branch.
        (Some(b), None) if after.is_none() => {
            for (key, value) in b {
                diff_with_depth(Some(value), None, child_path(&path, key), changes, depth + 1);
            }
        }
        (None, Some(a)) if before.is_none() => {
            for (key, value) in a {
                diff_with_depth(None, Some(value), child_path(&path, key), changes, depth + 1);
            }
        }
        _ => {
            if before.is_some() || after.is_some() {
                changes.push(StateChange::compute(path, before.cloned(), after.cloned()));
            }
        }
    }
}
