//! Abstract syntax tree for SELECT statements.
//!
//! One closed enum per grammar nonterminal. Lowering to the query IR in
//! `query.rs` matches on these exhaustively.

use serde_json::Value;

use crate::compare::{format_value, CompareOp};

/// `SELECT fields [FROM source] [WHERE expr] [GROUP BY path]`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub fields: Vec<SelectField>,
    pub from: Option<FromClause>,
    pub where_clause: Option<Expr>,
    pub group_by: Option<PathExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectField {
    pub expr: Expr,
    pub alias: Option<String>,
    /// Byte offset of the field in the query text.
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FromClause {
    Table(String),
    Subquery(Box<SelectStatement>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Comparison {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },
    Operand(Operand),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Function(FuncCall),
    Literal(Literal),
    Path(PathExpr),
    Subquery(Box<SelectStatement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncCall {
    /// Name as written in the query.
    pub name: String,
    pub args: Vec<Operand>,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Integer(n) => Value::from(*n),
            Literal::Float(f) => Value::from(*f),
            Literal::String(s) => Value::String(s.clone()),
            Literal::Bool(b) => Value::Bool(*b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
    Wildcard,
}

/// A dotted path as written in SQL text.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    pub segments: Vec<PathSegment>,
    pub offset: usize,
}

impl PathExpr {
    pub fn is_wildcard(&self) -> bool {
        matches!(self.segments.as_slice(), [PathSegment::Wildcard])
    }

    /// Render in the path mini-language. Keys that would not survive
    /// re-tokenizing are back-quoted.
    pub fn to_path_string(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                PathSegment::Key(key) if needs_quoting(key) => format!("`{}`", key),
                PathSegment::Key(key) => key.clone(),
                PathSegment::Index(i) => i.to_string(),
                PathSegment::Wildcard => "*".to_string(),
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Path with an inline predicate attached to its last segment, e.g.
    /// `sensors.*.type='temp'`.
    pub fn with_predicate(&self, op: CompareOp, literal: &Value) -> String {
        let literal = match literal {
            Value::String(s) => format!("'{}'", s),
            other => format_value(other),
        };
        format!("{}{}{}", self.to_path_string(), op.symbol(), literal)
    }
}

fn needs_quoting(key: &str) -> bool {
    key.is_empty()
        || key == "*"
        || key == "%"
        || key
            .chars()
            .any(|c| matches!(c, '.' | '=' | '!' | '<' | '>' | '~' | '`'))
}
