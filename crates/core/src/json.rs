//! JSON export and validated import of filter trees.
//!
//! The document root is the tree itself. Collaborators may wrap it in an
//! envelope object carrying metadata under a `filter` key; import unwraps
//! such envelopes.

use crate::tree::{FilterGroup, FilterNode};
use crate::{FilterError, Result};
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use tracing::debug;

const CONDITION_TYPES: [&str; 5] = [
    "entityType",
    "timeRange",
    "geographic",
    "attribute",
    "relationship",
];
const OPERATORS: [&str; 6] = ["equals", "contains", "greaterThan", "lessThan", "between", "in"];

/// Serialize the whole tree, ids included.
///
/// Condition values holding NaN or an infinity are rejected, since JSON
/// would write them as `null` and the tree would not read back the same.
pub fn export_to_json(tree: &FilterGroup) -> Result<String> {
    check_finite(tree, "$")?;
    Ok(serde_json::to_string_pretty(tree)?)
}

fn check_finite(group: &FilterGroup, path: &str) -> Result<()> {
    for (i, node) in group.conditions.iter().enumerate() {
        let here = format!("{path}.conditions[{i}]");
        match node {
            FilterNode::Group(g) => check_finite(g, &here)?,
            FilterNode::Condition(c) if !c.value.is_finite() => {
                return Err(FilterError::malformed(
                    format!("{here}.value"),
                    "number is not finite",
                ))
            }
            FilterNode::Condition(_) => {}
        }
    }
    Ok(())
}

/// Parse and validate a tree exported by [`export_to_json`].
///
/// The root must be an object with `type: "group"`, an `operator` of `and`
/// or `or` and a `conditions` array; every nested node is checked the same
/// way and node ids must be unique. Nodes without an id get a fresh one.
/// Any violation fails the whole import.
pub fn import_from_json(text: &str) -> Result<FilterGroup> {
    let raw: JsonValue = serde_json::from_str(text)?;
    let root = unwrap_envelope(&raw);
    if let Err(err) = validate_filter_json(root) {
        debug!(error = %err, "rejected filter import");
        return Err(err);
    }
    Ok(serde_json::from_value(root.clone())?)
}

fn unwrap_envelope(raw: &JsonValue) -> &JsonValue {
    match raw.get("filter") {
        Some(inner) if raw.get("type").is_none() && inner.is_object() => inner,
        _ => raw,
    }
}

/// Structural validation of a JSON tree without building it.
pub fn validate_filter_json(root: &JsonValue) -> Result<()> {
    let mut seen = HashSet::new();
    if root.get("type").and_then(JsonValue::as_str) != Some("group") {
        return Err(FilterError::malformed("$", "root must be a group"));
    }
    validate_node(root, "$", &mut seen)
}

fn validate_node<'a>(node: &'a JsonValue, path: &str, seen: &mut HashSet<&'a str>) -> Result<()> {
    let Some(obj) = node.as_object() else {
        return Err(FilterError::malformed(path, "expected an object"));
    };

    match obj.get("id") {
        None => {}
        Some(JsonValue::String(id)) => {
            if !seen.insert(id.as_str()) {
                return Err(FilterError::malformed(path, format!("duplicate node id `{id}`")));
            }
        }
        Some(_) => return Err(FilterError::malformed(path, "`id` must be a string")),
    }

    if let Some(negated) = obj.get("negated") {
        if !negated.is_boolean() {
            return Err(FilterError::malformed(path, "`negated` must be a boolean"));
        }
    }

    let kind = obj
        .get("type")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| FilterError::malformed(path, "missing `type`"))?;

    if kind == "group" {
        match obj.get("operator").and_then(JsonValue::as_str) {
            Some("and" | "or") => {}
            _ => {
                return Err(FilterError::malformed(
                    path,
                    "group `operator` must be `and` or `or`",
                ))
            }
        }
        let children = obj
            .get("conditions")
            .and_then(JsonValue::as_array)
            .ok_or_else(|| FilterError::malformed(path, "group needs a `conditions` array"))?;
        for (i, child) in children.iter().enumerate() {
            validate_node(child, &format!("{path}.conditions[{i}]"), seen)?;
        }
        return Ok(());
    }

    if !CONDITION_TYPES.contains(&kind) {
        return Err(FilterError::malformed(
            path,
            format!("unknown condition type `{kind}`"),
        ));
    }
    if !obj.get("field").is_some_and(JsonValue::is_string) {
        return Err(FilterError::malformed(path, "condition needs a string `field`"));
    }
    match obj.get("operator").and_then(JsonValue::as_str) {
        Some(op) if OPERATORS.contains(&op) => Ok(()),
        Some(op) => Err(FilterError::malformed(path, format!("unknown operator `{op}`"))),
        None => Err(FilterError::malformed(path, "condition needs an `operator`")),
    }
}
