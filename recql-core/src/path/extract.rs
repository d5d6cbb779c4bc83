//! Path evaluation over serde_json values.

use std::borrow::Cow;

use serde_json::{Map, Value};

use super::{Predicate, Segment};
use crate::error::{PathError, PathResult};

pub(super) fn extract<'a>(value: &'a Value, segments: &[Segment]) -> PathResult<Cow<'a, Value>> {
    let Some((segment, rest)) = segments.split_first() else {
        return Ok(Cow::Borrowed(value));
    };

    match segment {
        Segment::Key(key) => extract(step_into(value, key)?, rest),
        Segment::Wildcard(predicate) => extract_wildcard(value, predicate.as_ref(), rest),
        Segment::Filter { field, predicate } => match value {
            Value::Object(map) => {
                let compared = map
                    .get(field)
                    .ok_or_else(|| PathError::KeyNotFound(field.clone()))?;
                if predicate.matches_any(compared) {
                    // Continue on the same mapping, not on the compared field
                    extract(value, rest)
                } else {
                    Err(PathError::NoMatch(format!("{}{}", field, predicate)))
                }
            }
            other => Err(PathError::NotTraversable {
                segment: field.clone(),
                kind: kind_of(other),
            }),
        },
    }
}

fn step_into<'a>(value: &'a Value, key: &str) -> PathResult<&'a Value> {
    match value {
        Value::Object(map) => map
            .get(key)
            .ok_or_else(|| PathError::KeyNotFound(key.to_string())),
        Value::Array(items) => {
            let index: usize = key
                .parse()
                .map_err(|_| PathError::InvalidIndex(key.to_string()))?;
            items.get(index).ok_or(PathError::IndexOutOfBounds {
                index,
                len: items.len(),
            })
        }
        other => Err(PathError::NotTraversable {
            segment: key.to_string(),
            kind: kind_of(other),
        }),
    }
}

fn extract_wildcard<'a>(
    value: &'a Value,
    predicate: Option<&Predicate>,
    rest: &[Segment],
) -> PathResult<Cow<'a, Value>> {
    match value {
        Value::Array(items) => {
            // Elements that fail the predicate or the remaining path are skipped
            let results: Vec<Value> = items
                .iter()
                .filter(|item| predicate.map_or(true, |p| element_passes(p, item)))
                .filter_map(|item| extract(item, rest).ok().map(Cow::into_owned))
                .collect();
            Ok(Cow::Owned(Value::Array(results)))
        }
        Value::Object(map) => {
            let mut results = Map::new();
            for (key, item) in map {
                if let Some(p) = predicate {
                    if !p.op.matches(&Value::String(key.clone()), &p.literal) {
                        continue;
                    }
                }
                if let Ok(sub) = extract(item, rest) {
                    results.insert(key.clone(), sub.into_owned());
                }
            }

            if results.is_empty() && (predicate.is_some() || !map.is_empty()) {
                let pattern = predicate.map_or_else(|| "*".to_string(), |p| format!("*{}", p));
                return Err(PathError::NoMatch(pattern));
            }
            Ok(Cow::Owned(Value::Object(results)))
        }
        other => Err(PathError::NotTraversable {
            segment: "*".to_string(),
            kind: kind_of(other),
        }),
    }
}

/// Predicate test for one element under a wildcard: mapping elements pass
/// when one of their keys matches, other elements when their value matches.
fn element_passes(predicate: &Predicate, item: &Value) -> bool {
    match item {
        Value::Object(map) => map
            .keys()
            .any(|k| predicate.op.matches(&Value::String(k.clone()), &predicate.literal)),
        other => predicate.matches_any(other),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
