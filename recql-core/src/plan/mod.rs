//! Executable plan tree.
//!
//! Each node owns its input. `execute` builds a lazily pulled iterator chain
//! mirroring the tree; nothing runs until the consumer calls `next`.

mod accumulator;
mod aggregate;
mod filter;
mod format;
mod project;

use std::fmt;
use std::sync::Arc;

pub use accumulator::Accumulator;
pub use format::format_plan;

use crate::error::QueryResult;
use crate::expression::Expression;
use crate::path::FieldPath;
use crate::query::Field;
use crate::table::{RowIterator, Table};

/// Label used for scans of the default input.
pub const DEFAULT_TABLE_LABEL: &str = "default";

pub enum PlanNode {
    Scan {
        table: Arc<dyn Table>,
        /// Name shown in `explain`.
        label: String,
    },
    Filter {
        input: Box<PlanNode>,
        expression: Expression,
    },
    Project {
        input: Box<PlanNode>,
        fields: Vec<Field>,
    },
    Aggregate {
        input: Box<PlanNode>,
        group_by: Option<FieldPath>,
        fields: Vec<Field>,
    },
}

impl PlanNode {
    pub fn scan(table: Arc<dyn Table>, label: impl Into<String>) -> Self {
        PlanNode::Scan {
            table,
            label: label.into(),
        }
    }

    pub fn filter(input: PlanNode, expression: Expression) -> Self {
        PlanNode::Filter {
            input: Box::new(input),
            expression,
        }
    }

    pub fn project(input: PlanNode, fields: Vec<Field>) -> Self {
        PlanNode::Project {
            input: Box::new(input),
            fields,
        }
    }

    pub fn aggregate(input: PlanNode, group_by: Option<FieldPath>, fields: Vec<Field>) -> Self {
        PlanNode::Aggregate {
            input: Box::new(input),
            group_by,
            fields,
        }
    }

    /// Build the iterator chain for this subtree.
    ///
    /// Fails only when a scan cannot open its table.
    pub fn execute(&self) -> QueryResult<Box<dyn RowIterator>> {
        match self {
            PlanNode::Scan { table, .. } => table.iterate(),
            PlanNode::Filter { input, expression } => Ok(Box::new(filter::FilterIterator::new(
                input.execute()?,
                expression.clone(),
            ))),
            PlanNode::Project { input, fields } => Ok(Box::new(project::ProjectIterator::new(
                input.execute()?,
                fields.clone(),
            ))),
            PlanNode::Aggregate {
                input,
                group_by,
                fields,
            } => Ok(Box::new(aggregate::AggregateIterator::new(
                input.execute()?,
                group_by.clone(),
                fields.clone(),
            ))),
        }
    }

    pub fn children(&self) -> Vec<&PlanNode> {
        match self {
            PlanNode::Scan { .. } => Vec::new(),
            PlanNode::Filter { input, .. }
            | PlanNode::Project { input, .. }
            | PlanNode::Aggregate { input, .. } => vec![input.as_ref()],
        }
    }

    /// One-line description of this node alone.
    pub fn explain(&self) -> String {
        match self {
            PlanNode::Scan { label, .. } => format!("Scan(table: {})", label),
            PlanNode::Filter { expression, .. } => format!("Filter(expression: {})", expression),
            PlanNode::Project { fields, .. } => format!("Project({})", join_fields(fields)),
            PlanNode::Aggregate {
                group_by, fields, ..
            } => format!(
                "Aggregate(group: {}, fields: [{}])",
                group_by.as_ref().map_or("global", FieldPath::as_str),
                join_fields(fields)
            ),
        }
    }
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(Field::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Debug for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_plan(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::CompareOp;
    use crate::expression::Condition;
    use crate::query::AggregateFunction;
    use crate::table::InMemoryTable;
    use serde_json::{json, Value};

    fn table(records: Vec<Value>) -> Arc<dyn Table> {
        Arc::new(InMemoryTable::new("t", records))
    }

    pub(super) fn drain(node: &PlanNode) -> Vec<Value> {
        let mut iter = node.execute().unwrap();
        let mut rows = Vec::new();
        while iter.next() {
            rows.push(iter.row().unwrap().as_value().clone());
        }
        assert!(iter.error().is_none());
        iter.close().unwrap();
        rows
    }

    #[test]
    fn test_scan_passes_rows_through() {
        let records = vec![json!({"a": 1}), json!({"a": 2}), json!("scalar")];
        let plan = PlanNode::scan(table(records.clone()), DEFAULT_TABLE_LABEL);
        assert_eq!(drain(&plan), records);
    }

    #[test]
    fn test_filter_keeps_order() {
        let plan = PlanNode::filter(
            PlanNode::scan(table(vec![json!({"a": 3}), json!({"a": 1}), json!({"a": 5})]), "t"),
            Condition::new("a", CompareOp::GreaterThan, json!(2)).into(),
        );
        assert_eq!(drain(&plan), vec![json!({"a": 3}), json!({"a": 5})]);
    }

    #[test]
    fn test_explain_and_children() {
        let plan = PlanNode::aggregate(
            PlanNode::filter(
                PlanNode::scan(table(vec![]), "inventory"),
                Condition::new("stock", CompareOp::GreaterThan, json!(0)).into(),
            ),
            Some(FieldPath::parse("category")),
            vec![
                Field::new("category"),
                Field::aggregate(AggregateFunction::Sum, "stock", "SUM_stock"),
            ],
        );
        assert_eq!(
            plan.explain(),
            "Aggregate(group: category, fields: [category, SUM(stock) AS SUM_stock])"
        );
        let filter = plan.children()[0];
        assert_eq!(filter.explain(), "Filter(expression: stock > 0)");
        assert_eq!(filter.children()[0].explain(), "Scan(table: inventory)");
        assert!(filter.children()[0].children().is_empty());

        let project = PlanNode::project(
            PlanNode::scan(table(vec![]), DEFAULT_TABLE_LABEL),
            vec![Field::new("a"), Field::aliased("b", "c")],
        );
        assert_eq!(project.explain(), "Project(a, b AS c)");
    }

    #[test]
    fn test_execute_twice_is_independent() {
        let plan = PlanNode::project(
            PlanNode::scan(table(vec![json!({"a": 1, "b": 2})]), "t"),
            vec![Field::new("b")],
        );
        assert_eq!(drain(&plan), drain(&plan));
    }
}
