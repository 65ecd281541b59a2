//! Small helpers shared by the list/sort operations.

use std::cmp::Ordering;

use promptverse_shared::SortOrder;
use serde::Serialize;
use serde_json::Value;

/// Case-insensitive substring test. `needle` must already be lowercase.
pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

pub(crate) fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

/// The JSON value of `field` on `record`, `Null` if it has no such field.
pub(crate) fn field_value<T: Serialize>(record: &T, field: &str) -> Value {
    match serde_json::to_value(record) {
        Ok(Value::Object(mut map)) => map.remove(field).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Total order over JSON values: null < bool < number < string < the rest.
/// Arrays and objects compare equal to each other.
pub(crate) fn compare_json(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) | Value::Object(_) => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Trims tags, drops blanks and repeats, keeps first-seen order.
pub(crate) fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
