//! Recursive evaluation of a filter tree against one record.

use crate::condition::evaluate_condition;
use crate::dataset::Record;
use crate::tree::{FilterGroup, FilterNode, GroupOperator};

/// Evaluate any node of the tree against `record`.
///
/// Pure: depends only on `node` and `record` and mutates neither.
pub fn evaluate_tree<R: Record + ?Sized>(node: &FilterNode, record: &R) -> bool {
    match node {
        FilterNode::Condition(condition) => evaluate_condition(condition, record),
        FilterNode::Group(group) => evaluate_group(group, record),
    }
}

/// Evaluate a group (typically the root).
///
/// An empty AND-group is vacuously true and an empty OR-group is false, so a
/// freshly created root admits every record until a condition is added.
/// The group's own negation is applied after combining its children.
pub fn evaluate_group<R: Record + ?Sized>(group: &FilterGroup, record: &R) -> bool {
    let combined = match group.operator {
        GroupOperator::And => group
            .conditions
            .iter()
            .all(|child| evaluate_tree(child, record)),
        GroupOperator::Or => group
            .conditions
            .iter()
            .any(|child| evaluate_tree(child, record)),
    };
    combined != group.negated
}
