//! Evaluation of a single leaf condition against a single record.
//!
//! Nothing here fails: an unresolvable field, a non-numeric operand for a
//! numeric operator or an operand of the wrong shape all mean "does not
//! match". Trees are edited interactively and half-built conditions are
//! normal.

use crate::dataset::Record;
use crate::tree::{FilterCondition, FilterOperator};
use crate::Value;
use chrono::{DateTime, FixedOffset};
use std::cmp::Ordering;

/// Does `record` satisfy `condition`? Negation is applied last.
pub fn evaluate_condition<R: Record + ?Sized>(condition: &FilterCondition, record: &R) -> bool {
    let matched = match record.field(&condition.field) {
        Some(actual) => apply_operator(condition.operator, &actual, &condition.value),
        None => false,
    };
    matched != condition.negated
}

fn apply_operator(operator: FilterOperator, actual: &Value, expected: &Value) -> bool {
    match operator {
        FilterOperator::Equals => loose_eq(actual, expected),
        FilterOperator::Contains => contains(actual, expected),
        FilterOperator::GreaterThan => compare(actual, expected) == Some(Ordering::Greater),
        FilterOperator::LessThan => compare(actual, expected) == Some(Ordering::Less),
        FilterOperator::Between => between(actual, expected),
        FilterOperator::In => member_of(actual, expected),
    }
}

/// Loose equality: numbers compare numerically (text is coerced), text
/// compares case-insensitively, booleans also match `"true"`/`"false"`.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Number(_), Value::Text(_)) | (Value::Text(_), Value::Number(_)) => {
            match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        (Value::Text(x), Value::Text(y)) => x.to_lowercase() == y.to_lowercase(),
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Boolean(x), Value::Text(s)) | (Value::Text(s), Value::Boolean(x)) => {
            s.trim().eq_ignore_ascii_case(if *x { "true" } else { "false" })
        }
        (Value::List(xs), Value::List(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| loose_eq(x, y))
        }
        (Value::Map(xs), Value::Map(ys)) => xs == ys,
        _ => false,
    }
}

/// Substring test on text (case-insensitive), membership on lists.
fn contains(actual: &Value, needle: &Value) -> bool {
    match actual {
        Value::List(items) => items.iter().any(|item| loose_eq(item, needle)),
        Value::Text(haystack) => match needle {
            Value::Null | Value::List(_) | Value::Map(_) => false,
            _ => haystack
                .to_lowercase()
                .contains(&needle.to_string().to_lowercase()),
        },
        _ => false,
    }
}

fn parse_instant(value: &Value) -> Option<DateTime<FixedOffset>> {
    value
        .as_text()
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
}

/// Numeric ordering when both sides coerce to numbers, chronological when
/// both parse as RFC 3339 instants, otherwise incomparable.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_number(), b.as_number()) {
        return x.partial_cmp(&y);
    }
    match (parse_instant(a), parse_instant(b)) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        _ => None,
    }
}

/// Inclusive range check; anything other than a two-element list is
/// malformed and does not match.
fn between(actual: &Value, bounds: &Value) -> bool {
    let [low, high] = match bounds.as_list() {
        Some([low, high]) => [low, high],
        _ => return false,
    };
    matches!(
        compare(actual, low),
        Some(Ordering::Greater | Ordering::Equal)
    ) && matches!(compare(actual, high), Some(Ordering::Less | Ordering::Equal))
}

fn membership_key(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::List(_) | Value::Map(_) => None,
        other => Some(other.to_string().trim().to_string()),
    }
}

/// Trimmed string equality against every element of the operand list. A
/// list-valued field matches when any of its elements is a member.
fn member_of(actual: &Value, set: &Value) -> bool {
    let Some(candidates) = set.as_list() else {
        return false;
    };
    let keys: Vec<String> = candidates.iter().filter_map(membership_key).collect();
    let is_member = |v: &Value| membership_key(v).is_some_and(|k| keys.contains(&k));
    match actual {
        Value::List(items) => items.iter().any(is_member),
        other => is_member(other),
    }
}
