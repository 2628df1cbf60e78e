//! The recursive filter tree and its pure editing operations.
//!
//! Every edit returns a **new** root. Children are held behind [`Arc`], so
//! an edit only rebuilds the groups on the path from the root to the edited
//! node; every other subtree is shared with the previous version. That keeps
//! history snapshots and saved copies cheap and makes a saved tree immune to
//! later edits of the live one.

use crate::{NodeId, Value};
use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

/// How a group combines the results of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupOperator {
    /// Every child must match. An empty AND-group matches everything.
    #[default]
    And,
    /// At least one child must match. An empty OR-group matches nothing.
    Or,
}

/// Which dimension of the dataset a condition was built for.
///
/// When a tree is applied to a dataset the kind picks the collection the
/// condition narrows: entity-type and attribute conditions test entities,
/// time ranges test events, geographic conditions test locations and
/// relationship conditions test relationships. Evaluating a tree against a
/// single record ignores the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionKind {
    EntityType,
    TimeRange,
    Geographic,
    Attribute,
    Relationship,
}

/// Comparison applied by a leaf condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Equals,
    Contains,
    GreaterThan,
    LessThan,
    /// Inclusive range; the operand must be a two-element list.
    Between,
    /// Set membership; the operand must be a list.
    In,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A leaf of the filter tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    #[serde(default)]
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    /// Dot-path into the record, e.g. `attributes.age`.
    pub field: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "is_false")]
    pub negated: bool,
}

impl FilterCondition {
    /// Create a condition with a fresh id.
    pub fn new(
        kind: ConditionKind,
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            field: field.into(),
            operator,
            value: value.into(),
            negated: false,
        }
    }

    /// Shorthand for an [`ConditionKind::Attribute`] condition.
    pub fn attribute(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<Value>,
    ) -> Self {
        Self::new(ConditionKind::Attribute, field, operator, value)
    }

    pub fn with_negation(mut self, negated: bool) -> Self {
        self.negated = negated;
        self
    }
}

/// An internal node of the filter tree. The root of a tree is a group and
/// is what the dashboard calls the "advanced filter".
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilterGroup {
    #[serde(default)]
    pub id: NodeId,
    #[serde(default)]
    pub operator: GroupOperator,
    #[serde(default)]
    pub conditions: Vec<FilterNode>,
    #[serde(default)]
    pub negated: bool,
}

impl Serialize for FilterGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.negated { 5 } else { 4 };
        let mut state = serializer.serialize_struct("FilterGroup", len)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", "group")?;
        state.serialize_field("operator", &self.operator)?;
        state.serialize_field("conditions", &self.conditions)?;
        if self.negated {
            state.serialize_field("negated", &true)?;
        }
        state.end()
    }
}

/// A child of a group: either a leaf condition or a nested group.
///
/// In JSON the two are told apart by `type`: `"group"` for groups, the
/// condition kind otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Group(Arc<FilterGroup>),
    Condition(Arc<FilterCondition>),
}

impl FilterNode {
    pub fn id(&self) -> &NodeId {
        match self {
            FilterNode::Group(g) => &g.id,
            FilterNode::Condition(c) => &c.id,
        }
    }

    pub fn as_group(&self) -> Option<&FilterGroup> {
        match self {
            FilterNode::Group(g) => Some(g),
            FilterNode::Condition(_) => None,
        }
    }

    pub fn as_condition(&self) -> Option<&FilterCondition> {
        match self {
            FilterNode::Condition(c) => Some(c),
            FilterNode::Group(_) => None,
        }
    }
}

impl From<FilterGroup> for FilterNode {
    fn from(group: FilterGroup) -> Self {
        FilterNode::Group(Arc::new(group))
    }
}

impl From<FilterCondition> for FilterNode {
    fn from(condition: FilterCondition) -> Self {
        FilterNode::Condition(Arc::new(condition))
    }
}

impl Serialize for FilterNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterNode::Group(g) => g.as_ref().serialize(serializer),
            FilterNode::Condition(c) => c.as_ref().serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FilterNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let is_group = raw.get("type").and_then(serde_json::Value::as_str) == Some("group");
        if is_group {
            serde_json::from_value::<FilterGroup>(raw)
                .map(FilterNode::from)
                .map_err(D::Error::custom)
        } else {
            serde_json::from_value::<FilterCondition>(raw)
                .map(FilterNode::from)
                .map_err(D::Error::custom)
        }
    }
}

/// A fresh, empty AND-group. It matches every record until the first
/// condition is added.
pub fn create_group() -> FilterGroup {
    FilterGroup::new()
}

impl Default for FilterGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterGroup {
    pub fn new() -> Self {
        Self {
            id: NodeId::new(),
            operator: GroupOperator::And,
            conditions: Vec::new(),
            negated: false,
        }
    }

    pub fn with_operator(mut self, operator: GroupOperator) -> Self {
        self.operator = operator;
        self
    }

    /// Builder-style append, for constructing trees in code.
    pub fn with_child(mut self, child: impl Into<FilterNode>) -> Self {
        self.conditions.push(child.into());
        self
    }

    pub fn with_negation(mut self, negated: bool) -> Self {
        self.negated = negated;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Replace the group `group_id` (searched pre-order, the root included)
    /// with `update(group)`. Returns an unchanged root when the id is absent.
    pub fn update_group<F>(&self, group_id: &NodeId, update: F) -> FilterGroup
    where
        F: FnOnce(&FilterGroup) -> FilterGroup,
    {
        let mut update = Some(update);
        replace_group(self, group_id, &mut update).unwrap_or_else(|| self.clone())
    }

    /// Replace the condition `condition_id` with `update(condition)`.
    /// Returns an unchanged root when the id is absent.
    pub fn update_condition<F>(&self, condition_id: &NodeId, update: F) -> FilterGroup
    where
        F: FnOnce(&FilterCondition) -> FilterCondition,
    {
        let mut update = Some(update);
        replace_condition(self, condition_id, &mut update).unwrap_or_else(|| self.clone())
    }

    /// Remove the node `item_id` from whichever group directly holds it.
    ///
    /// The root is structural and is never removed this way; asking for it
    /// (or for an unknown id) returns an unchanged root.
    pub fn remove_item(&self, item_id: &NodeId) -> FilterGroup {
        remove_from(self, item_id).unwrap_or_else(|| self.clone())
    }

    /// Append `node` to the children of group `parent_id`.
    pub fn add_item(&self, parent_id: &NodeId, node: impl Into<FilterNode>) -> FilterGroup {
        let node = node.into();
        self.update_group(parent_id, move |group| {
            let mut next = group.clone();
            next.conditions.push(node);
            next
        })
    }

    pub fn set_group_operator(&self, group_id: &NodeId, operator: GroupOperator) -> FilterGroup {
        self.update_group(group_id, |group| group.clone().with_operator(operator))
    }

    pub fn find_group(&self, id: &NodeId) -> Option<&FilterGroup> {
        if self.id == *id {
            return Some(self);
        }
        self.conditions
            .iter()
            .filter_map(FilterNode::as_group)
            .find_map(|g| g.find_group(id))
    }

    pub fn find_condition(&self, id: &NodeId) -> Option<&FilterCondition> {
        self.conditions.iter().find_map(|child| match child {
            FilterNode::Condition(c) if c.id == *id => Some(c.as_ref()),
            FilterNode::Condition(_) => None,
            FilterNode::Group(g) => g.find_condition(id),
        })
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.find_group(id).is_some() || self.find_condition(id).is_some()
    }

    /// Number of nodes in the tree, the root included.
    pub fn node_count(&self) -> usize {
        1 + self
            .conditions
            .iter()
            .map(|child| match child {
                FilterNode::Group(g) => g.node_count(),
                FilterNode::Condition(_) => 1,
            })
            .sum::<usize>()
    }

    /// Group nesting depth; a root with no nested groups has depth 1.
    pub fn depth(&self) -> usize {
        1 + self
            .conditions
            .iter()
            .filter_map(FilterNode::as_group)
            .map(FilterGroup::depth)
            .max()
            .unwrap_or(0)
    }

    /// All leaf conditions in pre-order.
    pub fn leaf_conditions(&self) -> Vec<&FilterCondition> {
        let mut out = Vec::new();
        collect_leaves(self, &mut out);
        out
    }

    fn with_child_replaced(&self, index: usize, child: FilterNode) -> FilterGroup {
        let mut next = self.clone();
        next.conditions[index] = child;
        next
    }
}

fn collect_leaves<'a>(group: &'a FilterGroup, out: &mut Vec<&'a FilterCondition>) {
    for child in &group.conditions {
        match child {
            FilterNode::Condition(c) => out.push(c),
            FilterNode::Group(g) => collect_leaves(g, out),
        }
    }
}

fn replace_group<F>(group: &FilterGroup, id: &NodeId, update: &mut Option<F>) -> Option<FilterGroup>
where
    F: FnOnce(&FilterGroup) -> FilterGroup,
{
    if group.id == *id {
        return update.take().map(|f| f(group));
    }
    for (index, child) in group.conditions.iter().enumerate() {
        if let FilterNode::Group(sub) = child {
            if let Some(replaced) = replace_group(sub, id, update) {
                return Some(group.with_child_replaced(index, replaced.into()));
            }
        }
    }
    None
}

fn replace_condition<F>(
    group: &FilterGroup,
    id: &NodeId,
    update: &mut Option<F>,
) -> Option<FilterGroup>
where
    F: FnOnce(&FilterCondition) -> FilterCondition,
{
    for (index, child) in group.conditions.iter().enumerate() {
        let replaced = match child {
            FilterNode::Condition(c) if c.id == *id => {
                update.take().map(|f| FilterNode::from(f(c.as_ref())))
            }
            FilterNode::Condition(_) => None,
            FilterNode::Group(sub) => replace_condition(sub, id, update).map(FilterNode::from),
        };
        if let Some(node) = replaced {
            return Some(group.with_child_replaced(index, node));
        }
    }
    None
}

fn remove_from(group: &FilterGroup, id: &NodeId) -> Option<FilterGroup> {
    if let Some(pos) = group.conditions.iter().position(|c| c.id() == id) {
        let mut next = group.clone();
        next.conditions.remove(pos);
        return Some(next);
    }
    for (index, child) in group.conditions.iter().enumerate() {
        if let FilterNode::Group(sub) = child {
            if let Some(pruned) = remove_from(sub, id) {
                return Some(group.with_child_replaced(index, pruned.into()));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age_over(n: f64) -> FilterCondition {
        FilterCondition::attribute("attributes.age", FilterOperator::GreaterThan, n)
    }

    /// root(and) -> [c1, inner(or) -> [c2]]
    fn sample() -> (FilterGroup, NodeId, NodeId, NodeId) {
        let c1 = age_over(18.0);
        let c2 = FilterCondition::attribute("name", FilterOperator::Contains, "smith");
        let inner = FilterGroup::new().with_operator(GroupOperator::Or).with_child(c2.clone());
        let (c1_id, c2_id, inner_id) = (c1.id.clone(), c2.id.clone(), inner.id.clone());
        let root = FilterGroup::new().with_child(c1).with_child(inner);
        (root, c1_id, inner_id, c2_id)
    }

    #[test]
    fn create_group_is_empty_and() {
        let g = create_group();
        assert_eq!(g.operator, GroupOperator::And);
        assert!(g.is_empty());
        assert!(!g.negated);
    }

    #[test]
    fn update_condition_rebuilds_only_the_path() {
        let (root, c1_id, inner_id, c2_id) = sample();
        let next = root.update_condition(&c2_id, |c| {
            let mut c = c.clone();
            c.value = "jones".into();
            c
        });

        assert_ne!(next, root);
        assert_eq!(
            next.find_condition(&c2_id).unwrap().value,
            Value::from("jones")
        );
        // The untouched sibling is the very same allocation.
        match (&root.conditions[0], &next.conditions[0]) {
            (FilterNode::Condition(a), FilterNode::Condition(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => panic!("expected conditions"),
        }
        // The old tree is unchanged.
        assert_eq!(
            root.find_condition(&c2_id).unwrap().value,
            Value::from("smith")
        );
        assert!(next.find_group(&inner_id).is_some());
        assert!(next.find_condition(&c1_id).is_some());
    }

    #[test]
    fn update_group_can_target_the_root() {
        let (root, ..) = sample();
        let next = root.set_group_operator(&root.id, GroupOperator::Or);
        assert_eq!(next.operator, GroupOperator::Or);
        assert_eq!(root.operator, GroupOperator::And);
    }

    #[test]
    fn update_unknown_id_returns_equal_root() {
        let (root, ..) = sample();
        let missing = NodeId::from("missing");
        assert_eq!(root.update_group(&missing, |g| g.clone().with_negation(true)), root);
        assert_eq!(
            root.update_condition(&missing, |c| c.clone().with_negation(true)),
            root
        );
    }

    #[test]
    fn update_condition_does_not_match_group_ids() {
        let (root, _, inner_id, _) = sample();
        let next = root.update_condition(&inner_id, |c| c.clone().with_negation(true));
        assert_eq!(next, root);
    }

    #[test]
    fn remove_nested_item() {
        let (root, _, inner_id, c2_id) = sample();
        let next = root.remove_item(&c2_id);
        assert!(!next.contains(&c2_id));
        assert!(next.find_group(&inner_id).unwrap().is_empty());
        assert_eq!(next.node_count(), root.node_count() - 1);
    }

    #[test]
    fn removing_a_group_drops_its_subtree() {
        let (root, c1_id, inner_id, c2_id) = sample();
        let next = root.remove_item(&inner_id);
        assert!(!next.contains(&inner_id));
        assert!(!next.contains(&c2_id));
        assert!(next.contains(&c1_id));
    }

    #[test]
    fn removing_the_root_is_a_no_op() {
        let (root, ..) = sample();
        assert_eq!(root.remove_item(&root.id), root);
        assert_eq!(root.remove_item(&NodeId::from("nope")), root);
    }

    #[test]
    fn add_item_appends_to_named_group() {
        let (root, _, inner_id, _) = sample();
        let extra = age_over(65.0);
        let extra_id = extra.id.clone();
        let next = root.add_item(&inner_id, extra);
        let inner = next.find_group(&inner_id).unwrap();
        assert_eq!(inner.conditions.len(), 2);
        assert_eq!(inner.conditions[1].id(), &extra_id);
    }

    #[test]
    fn shape_queries() {
        let (root, ..) = sample();
        assert_eq!(root.node_count(), 4);
        assert_eq!(root.depth(), 2);
        let leaves: Vec<&str> = root.leaf_conditions().iter().map(|c| c.field.as_str()).collect();
        assert_eq!(leaves, vec!["attributes.age", "name"]);
    }

    #[test]
    fn json_shape_tags_groups() {
        let (root, ..) = sample();
        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(json["type"], "group");
        assert_eq!(json["operator"], "and");
        assert_eq!(json["conditions"][0]["type"], "attribute");
        assert_eq!(json["conditions"][0]["operator"], "greaterThan");
        assert_eq!(json["conditions"][1]["type"], "group");
        assert!(json.get("negated").is_none());
    }

    #[test]
    fn node_deserializes_by_type_tag() {
        let node: FilterNode = serde_json::from_str(
            r#"{"id":"g1","type":"group","operator":"or","conditions":[
                {"id":"c1","type":"entityType","field":"type","operator":"in","value":["person"]}
            ]}"#,
        )
        .unwrap();
        let group = node.as_group().unwrap();
        assert_eq!(group.operator, GroupOperator::Or);
        let cond = group.conditions[0].as_condition().unwrap();
        assert_eq!(cond.kind, ConditionKind::EntityType);
        assert_eq!(cond.operator, FilterOperator::In);
    }
}
