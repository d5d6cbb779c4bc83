//! Query intermediate representation and lowering from the syntax tree.
//!
//! The IR is what the planner consumes: an ordered field list, a source, an
//! optional compiled filter and an optional group-by path. It is built once
//! per query text and never mutated afterwards.

use std::fmt;

use serde_json::Value;

use crate::ast::{Expr, FromClause, Operand, PathExpr, SelectField, SelectStatement};
use crate::compare::{format_value, CompareOp};
use crate::error::{QueryError, QueryResult};
use crate::expression::{Condition, Expression};
use crate::parser;
use crate::path::FieldPath;

/// Supported aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Max,
    Min,
    Avg,
    Count,
    Sum,
}

impl AggregateFunction {
    /// Case-insensitive lookup. Unknown names have no fallback.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "MAX" => Some(AggregateFunction::Max),
            "MIN" => Some(AggregateFunction::Min),
            "AVG" => Some(AggregateFunction::Avg),
            "COUNT" => Some(AggregateFunction::Count),
            "SUM" => Some(AggregateFunction::Sum),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Max => "MAX",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One output column.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub path: FieldPath,
    pub alias: String,
    pub aggregate: Option<AggregateFunction>,
}

impl Field {
    /// Plain field whose alias is its path.
    pub fn new(path: &str) -> Self {
        Self {
            path: FieldPath::parse(path),
            alias: path.to_string(),
            aggregate: None,
        }
    }

    pub fn aliased(path: &str, alias: &str) -> Self {
        Self {
            alias: alias.to_string(),
            ..Self::new(path)
        }
    }

    pub fn aggregate(function: AggregateFunction, path: &str, alias: &str) -> Self {
        Self {
            aggregate: Some(function),
            ..Self::aliased(path, alias)
        }
    }

    /// `COUNT(*)`: one contribution per row rather than per value.
    pub fn counts_rows(&self) -> bool {
        self.aggregate == Some(AggregateFunction::Count) && self.path.as_str() == "*"
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.aggregate {
            Some(function) => write!(f, "{}({})", function, self.path)?,
            None => write!(f, "{}", self.path)?,
        }
        if self.alias != self.path.as_str() {
            write!(f, " AS {}", self.alias)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Table(String),
    Subquery(Box<Query>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Empty for `SELECT *`.
    pub fields: Vec<Field>,
    pub source: Option<Source>,
    pub filter: Option<Expression>,
    pub group_by: Option<FieldPath>,
}

impl Query {
    pub fn has_aggregates(&self) -> bool {
        self.fields.iter().any(|f| f.aggregate.is_some())
    }
}

/// Parse query text and lower it to the IR.
pub fn parse_query(text: &str) -> QueryResult<Query> {
    let statement = parser::parse(text)?;
    let query = Lowering { source: text }.lower(&statement)?;
    tracing::debug!(query = text, fields = query.fields.len(), "parsed query");
    Ok(query)
}

struct Lowering<'a> {
    source: &'a str,
}

impl Lowering<'_> {
    fn error(&self, offset: usize, message: impl Into<String>) -> QueryError {
        QueryError::parse(self.source, offset, message)
    }

    fn lower(&self, statement: &SelectStatement) -> QueryResult<Query> {
        let fields = match statement.fields.as_slice() {
            [only] if only.alias.is_none() && is_star(&only.expr) => Vec::new(),
            fields => fields
                .iter()
                .map(|field| self.lower_field(field))
                .collect::<QueryResult<Vec<_>>>()?,
        };

        let source = match &statement.from {
            None => None,
            Some(FromClause::Table(name)) => Some(Source::Table(name.clone())),
            Some(FromClause::Subquery(inner)) => {
                Some(Source::Subquery(Box::new(self.lower(inner)?)))
            }
        };

        let filter = statement
            .where_clause
            .as_ref()
            .map(|expr| self.lower_expression(expr))
            .transpose()?;

        let group_by = statement
            .group_by
            .as_ref()
            .map(|path| FieldPath::parse(&path.to_path_string()));

        Ok(Query {
            fields,
            source,
            filter,
            group_by,
        })
    }

    fn lower_field(&self, field: &SelectField) -> QueryResult<Field> {
        let (path, default_alias, aggregate) = match &field.expr {
            Expr::Operand(Operand::Function(call)) => {
                let function = AggregateFunction::from_name(&call.name).ok_or_else(|| {
                    self.error(call.offset, format!("unknown function '{}'", call.name))
                })?;
                let path = match call.args.as_slice() {
                    [Operand::Path(path)] => path.to_path_string(),
                    _ => {
                        return Err(self.error(
                            call.offset,
                            format!("{} takes exactly one path argument", call.name),
                        ))
                    }
                };
                let alias = format!("{}_{}", call.name, path.replace('.', "_"));
                (path, alias, Some(function))
            }
            Expr::Operand(Operand::Path(path)) => {
                let path = path.to_path_string();
                (path.clone(), path, None)
            }
            Expr::Operand(Operand::Literal(literal)) => {
                let path = format_value(&literal.to_value());
                (path.clone(), path, None)
            }
            Expr::Comparison {
                left: Operand::Path(path),
                op,
                right,
            } => {
                let literal = self.comparand(right, field.offset)?;
                let path = path.with_predicate(*op, &literal);
                (path.clone(), path, None)
            }
            Expr::Operand(Operand::Subquery(_)) => {
                return Err(self.error(field.offset, "subqueries are only allowed in FROM"));
            }
            Expr::Comparison { .. } | Expr::And(..) | Expr::Or(..) => {
                return Err(self.error(field.offset, "expected a path or aggregate in SELECT"));
            }
        };

        Ok(Field {
            path: FieldPath::parse(&path),
            alias: field.alias.clone().unwrap_or(default_alias),
            aggregate,
        })
    }

    fn lower_expression(&self, expr: &Expr) -> QueryResult<Expression> {
        match expr {
            Expr::Or(left, right) => Ok(Expression::or(
                self.lower_expression(left)?,
                self.lower_expression(right)?,
            )),
            Expr::And(left, right) => Ok(Expression::and(
                self.lower_expression(left)?,
                self.lower_expression(right)?,
            )),
            Expr::Comparison { left, op, right } => self.lower_comparison(left, *op, right),
            // A bare path tests for truth
            Expr::Operand(Operand::Path(path)) => {
                Ok(condition(path, CompareOp::Equal, Value::Bool(true)))
            }
            Expr::Operand(other) => Err(self.error(
                operand_offset(other).unwrap_or(0),
                "expected a comparison",
            )),
        }
    }

    fn lower_comparison(
        &self,
        left: &Operand,
        op: CompareOp,
        right: &Operand,
    ) -> QueryResult<Expression> {
        match (left, right) {
            (Operand::Path(path), right) => {
                let offset = path.offset;
                Ok(condition(path, op, self.comparand(right, offset)?))
            }
            // `5 < price` reads as `price > 5`
            (Operand::Literal(literal), Operand::Path(path)) => {
                let flipped = flip(op).ok_or_else(|| {
                    self.error(path.offset, format!("'{}' needs the path on its left", op))
                })?;
                Ok(condition(path, flipped, literal.to_value()))
            }
            (other, _) => Err(self.error(
                operand_offset(other).unwrap_or(0),
                "left side of a comparison must be a path",
            )),
        }
    }

    /// Right-hand side of a comparison. Bare identifiers read as strings.
    fn comparand(&self, operand: &Operand, offset: usize) -> QueryResult<Value> {
        match operand {
            Operand::Literal(literal) => Ok(literal.to_value()),
            Operand::Path(path) => Ok(Value::String(path.to_path_string())),
            Operand::Function(call) => Err(self.error(
                call.offset,
                format!("function '{}' cannot be compared against", call.name),
            )),
            Operand::Subquery(_) => {
                Err(self.error(offset, "subqueries cannot be compared against"))
            }
        }
    }
}

fn condition(path: &PathExpr, op: CompareOp, value: Value) -> Expression {
    Expression::Condition(Condition::new(&path.to_path_string(), op, value))
}

fn is_star(expr: &Expr) -> bool {
    matches!(expr, Expr::Operand(Operand::Path(path)) if path.is_wildcard())
}

fn operand_offset(operand: &Operand) -> Option<usize> {
    match operand {
        Operand::Function(call) => Some(call.offset),
        Operand::Path(path) => Some(path.offset),
        Operand::Literal(_) | Operand::Subquery(_) => None,
    }
}

fn flip(op: CompareOp) -> Option<CompareOp> {
    match op {
        CompareOp::Equal | CompareOp::NotEqual => Some(op),
        CompareOp::GreaterThan => Some(CompareOp::LessThan),
        CompareOp::GreaterThanOrEqual => Some(CompareOp::LessThanOrEqual),
        CompareOp::LessThan => Some(CompareOp::GreaterThan),
        CompareOp::LessThanOrEqual => Some(CompareOp::GreaterThanOrEqual),
        CompareOp::Contains => None,
    }
}
