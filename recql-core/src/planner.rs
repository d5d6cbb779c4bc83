//! Turns a query IR into a plan tree.
//!
//! Fixed, rule-ordered pipeline: resolve the source, wrap in a filter when
//! there is a WHERE clause, then pick the terminal stage (aggregate, project
//! or none).

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::error::{QueryError, QueryResult};
use crate::plan::{format_plan, PlanNode, DEFAULT_TABLE_LABEL};
use crate::query::{Query, Source};
use crate::table::Table;

pub struct Planner {
    root: Arc<dyn Table>,
    catalog: Option<Catalog>,
}

impl Planner {
    /// Every `FROM <name>` scans `root`.
    pub fn new(root: Arc<dyn Table>) -> Self {
        Self {
            root,
            catalog: None,
        }
    }

    /// `FROM <name>` is resolved through `catalog`; unknown names fail.
    /// Queries without FROM still scan `root`.
    pub fn with_catalog(root: Arc<dyn Table>, catalog: Catalog) -> Self {
        Self {
            root,
            catalog: Some(catalog),
        }
    }

    pub fn plan(&self, query: &Query) -> QueryResult<PlanNode> {
        let plan = self.plan_level(query)?;
        tracing::debug!(plan = %format_plan(&plan), "built plan");
        Ok(plan)
    }

    fn plan_level(&self, query: &Query) -> QueryResult<PlanNode> {
        let mut node = match &query.source {
            None => PlanNode::scan(self.root.clone(), DEFAULT_TABLE_LABEL),
            Some(Source::Table(name)) => PlanNode::scan(self.resolve(name)?, name.as_str()),
            Some(Source::Subquery(inner)) => self.plan_level(inner)?,
        };

        if let Some(filter) = &query.filter {
            node = PlanNode::filter(node, filter.clone());
        }

        if query.group_by.is_some() || query.has_aggregates() {
            node = PlanNode::aggregate(node, query.group_by.clone(), query.fields.clone());
        } else if !query.fields.is_empty() {
            node = PlanNode::project(node, query.fields.clone());
        }

        Ok(node)
    }

    fn resolve(&self, name: &str) -> QueryResult<Arc<dyn Table>> {
        match &self.catalog {
            None => Ok(self.root.clone()),
            Some(catalog) => catalog.get(name).ok_or_else(|| {
                QueryError::Plan(format!(
                    "unknown table '{}' (known: {})",
                    name,
                    catalog.names().join(", ")
                ))
            }),
        }
    }
}

/// Plan `query` against `root` with no catalog.
pub fn create_plan(query: &Query, root: Arc<dyn Table>) -> QueryResult<PlanNode> {
    Planner::new(root).plan(query)
}
