//! Drives a plan to completion and serializes its rows.
//!
//! Output is line-delimited: one JSON value per row, never wrapped in an
//! enclosing array. Rows written before a failure are not retracted.

use std::io::Write;

use crate::error::{QueryError, QueryResult};
use crate::plan::PlanNode;
use crate::table::RowIterator;

/// Configuration for query execution output
#[derive(Debug, Clone, Copy, Default)]
pub struct Executor {
    pretty: bool,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indent each emitted value.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Pull every row from `plan` and write it to `sink`.
    ///
    /// # Arguments
    /// * `plan` - Root of the plan tree
    /// * `sink` - Destination for the line-delimited output
    ///
    /// # Returns
    /// Number of rows written
    pub fn execute<W: Write>(&self, plan: &PlanNode, sink: &mut W) -> QueryResult<usize> {
        let mut rows = plan.execute()?;

        let written = self.write_rows(rows.as_mut(), sink);
        // Close on every path; the first failure wins
        let closed = rows.close();
        let count = written?;
        closed?;
        sink.flush()?;

        tracing::debug!(rows = count, "query finished");
        Ok(count)
    }

    fn write_rows<W: Write>(&self, rows: &mut dyn RowIterator, sink: &mut W) -> QueryResult<usize> {
        let mut count = 0;
        while rows.next() {
            let Some(row) = rows.row() else {
                continue;
            };
            if self.pretty {
                serde_json::to_writer_pretty(&mut *sink, row.as_value())?;
            } else {
                serde_json::to_writer(&mut *sink, row.as_value())?;
            }
            sink.write_all(b"\n")?;
            count += 1;
        }

        match rows.error() {
            Some(err) => {
                tracing::warn!(rows = count, error = %err, "row source failed");
                Err(err.detached())
            }
            None => Ok(count),
        }
    }

    /// Run `plan` and collect the rows instead of serializing them.
    pub fn collect(&self, plan: &PlanNode) -> QueryResult<Vec<serde_json::Value>> {
        let mut rows = plan.execute()?;
        let mut out = Vec::new();
        while rows.next() {
            if let Some(row) = rows.row() {
                out.push(row.as_value().clone());
            }
        }
        let failed = rows.error().map(QueryError::detached);
        rows.close()?;
        match failed {
            Some(err) => Err(err),
            None => Ok(out),
        }
    }
}
