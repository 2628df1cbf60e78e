//! Casegraph: advanced filter engine for investigative datasets.
//!
//! The core primitive is a [`FilterGroup`]: a boolean condition tree whose
//! leaves are [`FilterCondition`]s and whose internal nodes combine their
//! children with AND/OR (optionally negated).
//!
//! A tree is built interactively (every edit returns a **new** root and
//! shares untouched subtrees with the old one), evaluated per record against
//! a relational [`Dataset`] of entities, relationships, events and locations,
//! versioned through a [`FilterHistory`], compared with [`diff`], and
//! exported with [`export_to_json`].
//!
//! # Quick start
//!
//! ```rust
//! use casegraph::{
//!     apply_advanced, Dataset, Entity, EntityKind, FilterCondition, FilterGroup,
//!     FilterNode, FilterOperator,
//! };
//!
//! let mut dataset = Dataset::default();
//! dataset
//!     .entities
//!     .push(Entity::new("e1", EntityKind::Person, "Alice").with_attribute("age", 42.0));
//!
//! let root = FilterGroup::new();
//! let root = root.add_item(
//!     &root.id,
//!     FilterNode::from(FilterCondition::attribute(
//!         "attributes.age",
//!         FilterOperator::GreaterThan,
//!         40.0,
//!     )),
//! );
//!
//! let filtered = apply_advanced(&dataset, &root);
//! assert_eq!(filtered.entities.len(), 1);
//! ```

mod apply;
mod condition;
mod dataset;
mod diff;
mod evaluate;
mod history;
mod json;
mod tree;

pub use apply::{
    apply, apply_advanced, apply_filters, filter_records, haversine_km, BasicFilter,
    Coordinates, FilterSet, GeoArea, EARTH_RADIUS_KM,
};
pub use condition::evaluate_condition;
pub use dataset::{
    Dataset, Entity, EntityKind, Event, FilteredDataset, Location, Record, RecordKind,
    Relationship,
};
pub use diff::{diff, diff_values, DifferenceKind, FilterDifference};
pub use evaluate::{evaluate_group, evaluate_tree};
pub use history::FilterHistory;
pub use json::{export_to_json, import_from_json, validate_filter_json};
pub use tree::{
    create_group, ConditionKind, FilterCondition, FilterGroup, FilterNode, FilterOperator,
    GroupOperator,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ulid::Ulid;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("malformed filter at `{path}`: {reason}")]
    Malformed { path: String, reason: String },
    #[error("no active filter")]
    NoActiveFilter,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FilterError {
    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        FilterError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// A stable, time-sortable identifier for a filter tree node.
///
/// Ids are generated fresh on creation and never reused across subtrees;
/// they survive export/import unchanged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A field value on a record, or the operand of a condition.
///
/// Serialized untagged so datasets and filters read as plain JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// JSON `null`.
    #[default]
    Null,
    /// A boolean.
    Boolean(bool),
    /// A numeric value.
    Number(f64),
    /// A text string.
    Text(String),
    /// An ordered list (the operand shape of `between` and `in`).
    List(Vec<Value>),
    /// A nested map of named values.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Numeric view of the value. Text is parsed as a float after trimming.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Whether every number inside the value is finite, i.e. representable in JSON.
    pub fn is_finite(&self) -> bool {
        match self {
            Value::Number(n) => n.is_finite(),
            Value::List(items) => items.iter().all(Value::is_finite),
            Value::Map(map) => map.values().all(Value::is_finite),
            Value::Null | Value::Boolean(_) | Value::Text(_) => true,
        }
    }

    /// Look up `key` when the value is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}
/// JSON has no NaN or infinity, so non-finite input becomes [`Value::Null`].
impl From<f64> for Value {
    fn from(n: f64) -> Self {
        if n.is_finite() {
            Value::Number(n)
        } else {
            Value::Null
        }
    }
}
impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}
impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
