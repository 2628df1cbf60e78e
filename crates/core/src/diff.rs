//! Structural comparison of two filter trees.
//!
//! Trees are compared through their JSON form so the same walk works for
//! every node kind. Node ids are skipped at every level: two trees built
//! independently but with the same shape compare equal.

use crate::tree::FilterGroup;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

const ID_KEY: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifferenceKind {
    Added,
    Removed,
    Changed,
}

/// One discrepancy between two trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDifference {
    /// Dot/bracket path from the root, e.g. `conditions[1].operator`.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: DifferenceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<JsonValue>,
}

impl std::fmt::Display for FilterDifference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |v: &Option<JsonValue>| v.as_ref().map(JsonValue::to_string).unwrap_or_default();
        match self.kind {
            DifferenceKind::Added => write!(f, "+ {}: {}", self.path, show(&self.new_value)),
            DifferenceKind::Removed => write!(f, "- {}: {}", self.path, show(&self.old_value)),
            DifferenceKind::Changed => write!(
                f,
                "~ {}: {} -> {}",
                self.path,
                show(&self.old_value),
                show(&self.new_value)
            ),
        }
    }
}

/// Differences that turn `a` into `b`, in traversal order.
pub fn diff(a: &FilterGroup, b: &FilterGroup) -> Vec<FilterDifference> {
    // Serializing a tree cannot fail: every map key is a string.
    let a = serde_json::to_value(a).unwrap_or(JsonValue::Null);
    let b = serde_json::to_value(b).unwrap_or(JsonValue::Null);
    diff_values(&a, &b)
}

/// The same walk over arbitrary JSON values.
pub fn diff_values(a: &JsonValue, b: &JsonValue) -> Vec<FilterDifference> {
    let mut out = Vec::new();
    walk(a, b, "", &mut out);
    out
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn same_type(a: &JsonValue, b: &JsonValue) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

fn changed(path: &str, old: JsonValue, new: JsonValue) -> FilterDifference {
    FilterDifference {
        path: path.to_string(),
        kind: DifferenceKind::Changed,
        old_value: Some(old),
        new_value: Some(new),
    }
}

fn walk(a: &JsonValue, b: &JsonValue, path: &str, out: &mut Vec<FilterDifference>) {
    match (a, b) {
        (JsonValue::Object(left), JsonValue::Object(right)) => {
            let keys = left
                .keys()
                .chain(right.keys().filter(|k| !left.contains_key(*k)))
                .filter(|k| k.as_str() != ID_KEY);
            for key in keys {
                let sub = child_path(path, key);
                match (left.get(key), right.get(key)) {
                    (Some(x), Some(y)) => walk(x, y, &sub, out),
                    (Some(x), None) => out.push(FilterDifference {
                        path: sub,
                        kind: DifferenceKind::Removed,
                        old_value: Some(x.clone()),
                        new_value: None,
                    }),
                    (None, Some(y)) => out.push(FilterDifference {
                        path: sub,
                        kind: DifferenceKind::Added,
                        old_value: None,
                        new_value: Some(y.clone()),
                    }),
                    (None, None) => {}
                }
            }
        }
        (JsonValue::Array(left), JsonValue::Array(right)) => {
            if left.len() != right.len() {
                out.push(changed(
                    path,
                    JsonValue::String(format!("{} items", left.len())),
                    JsonValue::String(format!("{} items", right.len())),
                ));
                return;
            }
            for (i, (x, y)) in left.iter().zip(right).enumerate() {
                walk(x, y, &format!("{path}[{i}]"), out);
            }
        }
        _ if !same_type(a, b) => out.push(changed(path, a.clone(), b.clone())),
        _ if a != b => out.push(changed(path, a.clone(), b.clone())),
        _ => {}
    }
}
