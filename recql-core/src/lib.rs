//! recql-core - an embeddable SQL-like query engine over JSON records.
//!
//! Query text is parsed into a syntax tree, lowered to a small query IR,
//! planned into a tree of pull-based nodes and executed against any
//! [`Table`] implementation.
//!
//! # Main Components
//!
//! - **Path**: the dotted path language used to reach into nested records
//! - **Parser**: tokenizes and parses `SELECT ... FROM ... WHERE ... GROUP BY ...`
//! - **Query**: the IR the planner consumes
//! - **Planner / Plan**: scan, filter, project and aggregate nodes
//! - **Executor**: pulls a plan to completion and writes line-delimited JSON
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use recql_core::{create_plan, parse_query, Executor, InMemoryTable};
//! use serde_json::json;
//!
//! let table = Arc::new(InMemoryTable::new("users", vec![
//!     json!({"name": "Alice", "age": 30}),
//!     json!({"name": "Bob", "age": 25}),
//! ]));
//!
//! let query = parse_query("SELECT name WHERE age > 26").unwrap();
//! let plan = create_plan(&query, table).unwrap();
//!
//! let mut out = Vec::new();
//! let rows = Executor::new().execute(&plan, &mut out).unwrap();
//! assert_eq!(rows, 1);
//! assert_eq!(String::from_utf8(out).unwrap(), "{\"name\":\"Alice\"}\n");
//! ```

pub mod ast;
pub mod catalog;
pub mod compare;
pub mod error;
pub mod executor;
pub mod expression;
pub mod lexer;
pub mod parser;
pub mod path;
pub mod plan;
pub mod planner;
pub mod query;
pub mod table;

// Re-export main types for convenience
pub use catalog::Catalog;
pub use compare::CompareOp;
pub use error::{PathError, PathResult, QueryError, QueryResult};
pub use executor::Executor;
pub use expression::{Condition, Expression};
pub use path::{extract_path, FieldPath};
pub use plan::{format_plan, PlanNode};
pub use planner::{create_plan, Planner};
pub use query::{parse_query, AggregateFunction, Field, Query, Source};
pub use table::{InMemoryTable, OutputRecord, Row, RowIterator, Table};
