//! Boolean expression tree for WHERE clauses.
//!
//! `AND` binds tighter than `OR`; the parser builds the tree with that
//! precedence, this module only evaluates it.

use std::fmt;

use serde_json::Value;

use crate::compare::CompareOp;
use crate::path::{bare_literal, FieldPath, Predicate};

/// Leaf comparison: `path <op> literal`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub path: FieldPath,
    pub op: CompareOp,
    pub value: Value,
}

impl Condition {
    pub fn new(path: &str, op: CompareOp, value: Value) -> Self {
        Self {
            path: FieldPath::parse(path),
            op,
            value,
        }
    }

    /// Evaluate against one record.
    ///
    /// A missing field is false. When the extracted value is a sequence or a
    /// mapping the condition holds if any nested value satisfies it.
    pub fn evaluate(&self, record: &Value) -> bool {
        match self.path.extract(record) {
            Ok(extracted) => Predicate {
                op: self.op,
                literal: self.value.clone(),
            }
            .matches_any(&extracted),
            Err(_) => false,
        }
    }

    /// Parse a standalone `<path><op><literal>` filter such as `age>28`,
    /// `status=active` or `name~='jo'`.
    ///
    /// Returns `None` when the text has no operator, starts with `.` (a path
    /// query) or has an empty side.
    pub fn parse_inline(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.starts_with('.') {
            return None;
        }

        // Earliest operator wins; two-char operators before their prefixes
        const OPERATORS: [&str; 8] = ["==", "!=", ">=", "<=", "~=", "=", ">", "<"];
        let (index, symbol) = OPERATORS
            .iter()
            .filter_map(|op| text.find(op).map(|i| (i, *op)))
            .min_by_key(|(i, op)| (*i, std::cmp::Reverse(op.len())))?;

        let field = text[..index].trim();
        let literal = text[index + symbol.len()..].trim();
        if field.is_empty() || literal.is_empty() {
            return None;
        }

        let op = CompareOp::from_symbol(symbol)?;
        Some(Self::new(field, op, unquote_literal(literal)))
    }
}

fn unquote_literal(literal: &str) -> Value {
    for quote in ['\'', '"'] {
        if literal.len() >= 2 && literal.starts_with(quote) && literal.ends_with(quote) {
            return Value::String(literal[1..literal.len() - 1].to_string());
        }
    }
    bare_literal(literal)
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::String(s) => write!(f, "{} {} '{}'", self.path, self.op, s),
            other => write!(f, "{} {} {}", self.path, self.op, other),
        }
    }
}

/// Compiled WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Condition(Condition),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
}

impl Expression {
    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Or(Box::new(left), Box::new(right))
    }

    pub fn evaluate(&self, record: &Value) -> bool {
        match self {
            Expression::Condition(condition) => condition.evaluate(record),
            Expression::And(left, right) => left.evaluate(record) && right.evaluate(record),
            Expression::Or(left, right) => left.evaluate(record) || right.evaluate(record),
        }
    }
}

impl From<Condition> for Expression {
    fn from(condition: Condition) -> Self {
        Expression::Condition(condition)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Condition(condition) => write!(f, "{}", condition),
            Expression::And(left, right) => {
                // Parenthesize OR children so the printed form keeps its meaning
                for (i, side) in [left, right].into_iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    match side.as_ref() {
                        Expression::Or(..) => write!(f, "({})", side)?,
                        other => write!(f, "{}", other)?,
                    }
                }
                Ok(())
            }
            Expression::Or(left, right) => write!(f, "{} OR {}", left, right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cond(path: &str, op: CompareOp, value: Value) -> Expression {
        Condition::new(path, op, value).into()
    }

    #[test]
    fn test_condition_match() {
        let record = json!({"name": "Alice", "age": 30, "city": "New York"});
        assert!(Condition::new("name", CompareOp::Equal, json!("Alice")).evaluate(&record));
        assert!(Condition::new("name", CompareOp::NotEqual, json!("Bob")).evaluate(&record));
        assert!(Condition::new("age", CompareOp::GreaterThan, json!(25)).evaluate(&record));
        assert!(Condition::new("age", CompareOp::LessThan, json!(35)).evaluate(&record));
        assert!(Condition::new("age", CompareOp::GreaterThanOrEqual, json!(30)).evaluate(&record));
        assert!(Condition::new("city", CompareOp::Contains, json!("York")).evaluate(&record));
        assert!(!Condition::new("city", CompareOp::Contains, json!("Boston")).evaluate(&record));
    }

    #[test]
    fn test_missing_field_is_false() {
        let record = json!({"name": "Alice"});
        assert!(!Condition::new("age", CompareOp::NotEqual, json!(1)).evaluate(&record));
    }

    #[test]
    fn test_any_of_sequence() {
        let tags = Condition::new("tags", CompareOp::Equal, json!("x"));
        assert!(tags.evaluate(&json!({"tags": ["x", "y"]})));
        assert!(!tags.evaluate(&json!({"tags": ["y", "z"]})));

        let nested = Condition::new("groups.*", CompareOp::GreaterThan, json!(10));
        assert!(nested.evaluate(&json!({"groups": {"a": {"n": 3}, "b": {"n": 12}}})));
        assert!(!nested.evaluate(&json!({"groups": {"a": {"n": 3}}})));
    }

    #[test]
    fn test_precedence_truth_table() {
        // a=1 OR (b=2 AND c=3)
        let expr = Expression::or(
            cond("a", CompareOp::Equal, json!(1)),
            Expression::and(
                cond("b", CompareOp::Equal, json!(2)),
                cond("c", CompareOp::Equal, json!(3)),
            ),
        );
        for a in [0, 1] {
            for b in [0, 2] {
                for c in [0, 3] {
                    let record = json!({"a": a, "b": b, "c": c});
                    let expected = a == 1 || (b == 2 && c == 3);
                    assert_eq!(expr.evaluate(&record), expected, "{}", record);
                }
            }
        }
    }

    #[test]
    fn test_display() {
        let expr = Expression::and(
            Expression::or(
                cond("a", CompareOp::Equal, json!(1)),
                cond("b", CompareOp::Equal, json!("x")),
            ),
            cond("c", CompareOp::LessThan, json!(3)),
        );
        assert_eq!(expr.to_string(), "(a = 1 OR b = 'x') AND c < 3");
    }

    #[test]
    fn test_parse_inline() {
        let c = Condition::parse_inline("age>28").unwrap();
        assert_eq!(c.path.as_str(), "age");
        assert_eq!(c.op, CompareOp::GreaterThan);
        assert_eq!(c.value, json!(28));

        let c = Condition::parse_inline("age>=30").unwrap();
        assert_eq!(c.op, CompareOp::GreaterThanOrEqual);

        let c = Condition::parse_inline("status = active").unwrap();
        assert_eq!(c.value, json!("active"));

        let c = Condition::parse_inline("name~='jo'").unwrap();
        assert_eq!(c.op, CompareOp::Contains);
        assert_eq!(c.value, json!("jo"));

        assert!(Condition::parse_inline(".user.name").is_none());
        assert!(Condition::parse_inline("user.name").is_none());
        assert!(Condition::parse_inline("age>").is_none());
    }
}
