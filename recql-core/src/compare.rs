//! Value comparison shared by the path evaluator, the WHERE evaluator and the
//! MIN/MAX accumulators.
//!
//! - as_number: numeric view of a value (numbers and numeric strings)
//! - format_value: stable string form used for fallbacks and group keys
//! - values_equal / compare_values / value_contains: operator semantics
//! - CompareOp: the closed set of comparison operators

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

/// Comparison operators understood by conditions and inline predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
}

impl CompareOp {
    /// Parse an operator symbol. Accepts the aliases `==`, `<>` and `CONTAINS`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" | "==" => Some(CompareOp::Equal),
            "!=" | "<>" => Some(CompareOp::NotEqual),
            ">" => Some(CompareOp::GreaterThan),
            ">=" => Some(CompareOp::GreaterThanOrEqual),
            "<" => Some(CompareOp::LessThan),
            "<=" => Some(CompareOp::LessThanOrEqual),
            "~=" => Some(CompareOp::Contains),
            s if s.eq_ignore_ascii_case("contains") => Some(CompareOp::Contains),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Equal => "=",
            CompareOp::NotEqual => "!=",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterThanOrEqual => ">=",
            CompareOp::LessThan => "<",
            CompareOp::LessThanOrEqual => "<=",
            CompareOp::Contains => "~=",
        }
    }

    /// Apply the operator to two scalar values.
    #[inline]
    pub fn matches(&self, left: &Value, right: &Value) -> bool {
        match self {
            CompareOp::Equal => values_equal(left, right),
            CompareOp::NotEqual => !values_equal(left, right),
            CompareOp::GreaterThan => compare_values(left, right) == Ordering::Greater,
            CompareOp::GreaterThanOrEqual => compare_values(left, right) != Ordering::Less,
            CompareOp::LessThan => compare_values(left, right) == Ordering::Less,
            CompareOp::LessThanOrEqual => compare_values(left, right) != Ordering::Greater,
            CompareOp::Contains => value_contains(left, right),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Numeric view of a value. Numeric strings count; booleans and null do not.
#[inline]
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Format a number the way it reads in JSON text: integral values without a
/// fractional part.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Stable string form of a value.
///
/// Strings are taken verbatim, numbers use `format_number`, null is `"null"`,
/// arrays and objects use their compact JSON text.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format_number(f),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Equality: same-typed operands compare directly (numbers as f64),
/// anything else falls back to comparing string forms.
#[inline]
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Null, Value::Null) => true,
        _ => format_value(left) == format_value(right),
    }
}

/// Ordering: numeric when both sides are numeric-like, otherwise by string form.
#[inline]
pub fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (as_number(left), as_number(right)) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => format_value(left).cmp(&format_value(right)),
    }
}

/// Substring test on string forms.
#[inline]
pub fn value_contains(haystack: &Value, needle: &Value) -> bool {
    format_value(haystack).contains(&format_value(needle))
}

/// Create a serde_json::Number from an f64 value.
#[inline]
pub fn number_from_f64(n: f64) -> serde_json::Number {
    serde_json::Number::from_f64(n).unwrap_or_else(|| serde_json::Number::from(0))
}
