//! Path mini-language.
//!
//! A path extracts a value from a nested record: `address.city`, `tags.0`,
//! `employees.*.name`, `readings.*~=temp`, `sensors.*.type=temp.name`.
//! Paths are tokenized once into [`Segment`]s and can then be applied to any
//! number of records.

mod extract;
mod lexer;

use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

use crate::compare::CompareOp;
use crate::error::PathResult;

pub(crate) use lexer::bare_literal;

/// `<op><literal>` attached to a wildcard or a sibling field.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub op: CompareOp,
    pub literal: Value,
}

impl Predicate {
    /// True if `value`, or any value nested inside it, satisfies the predicate.
    pub fn matches_any(&self, value: &Value) -> bool {
        match value {
            Value::Array(items) => items.iter().any(|v| self.matches_any(v)),
            Value::Object(map) => map.values().any(|v| self.matches_any(v)),
            scalar => self.op.matches(scalar, &self.literal),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            Value::String(s) => write!(f, "{}'{}'", self.op, s),
            other => write!(f, "{}{}", self.op, other),
        }
    }
}

/// One step of a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Mapping key, or a positional index when applied to a sequence.
    Key(String),
    /// `*` or `%`: every element of a sequence or every value of a mapping,
    /// optionally restricted by a predicate on the element or key.
    Wildcard(Option<Predicate>),
    /// `field<op>literal`: keep the current mapping only when its `field`
    /// satisfies the predicate, then continue on that same mapping.
    Filter { field: String, predicate: Predicate },
}

/// A tokenized path, ready to be applied to records.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Self {
        let raw = path.trim();
        Self {
            raw: raw.to_string(),
            segments: lexer::PathLexer::new(raw).tokenize(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True for the empty path and `.`, which select the whole record.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when a predicate selects part of the path: a wildcard key
    /// predicate (`readings.*~=temp`) or a sibling predicate followed by more
    /// segments (`sensors.*.type=temp.name`). A trailing sibling predicate
    /// alone (`user.age>28`) is not a selection.
    pub fn selects_by_predicate(&self) -> bool {
        let last = self.segments.len().saturating_sub(1);
        self.segments
            .iter()
            .enumerate()
            .any(|(i, segment)| match segment {
                Segment::Wildcard(Some(_)) => true,
                Segment::Filter { .. } => i < last,
                Segment::Wildcard(None) | Segment::Key(_) => false,
            })
    }

    /// Extract the value at this path.
    pub fn extract<'a>(&self, value: &'a Value) -> PathResult<Cow<'a, Value>> {
        extract::extract(value, &self.segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parse `path` and extract it from `value` in one step.
pub fn extract_path<'a>(value: &'a Value, path: &str) -> PathResult<Cow<'a, Value>> {
    FieldPath::parse(path).extract(value)
}
