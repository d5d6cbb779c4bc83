//! Argument resolution and expression routing for the `recql` binary.
//!
//! An expression is one of three things:
//! - a `SELECT` statement, run through the query engine
//! - an inline filter such as `age>28`, run as `SELECT * WHERE age > 28`
//! - a path such as `.user.name`, extracted from every record
//!
//! Whatever the route, results can be pruned to a few top-level fields
//! (`--select`) and array results can be flattened to one line per element
//! (`--extract`).

use std::borrow::Cow;
use std::io::Write;
use std::sync::Arc;

use recql_core::{
    format_plan, parse_query, Catalog, Condition, Executor, FieldPath, PlanNode, Planner, Query,
    QueryResult, Row, RowIterator, Table,
};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::source::Input;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InvocationError {
    #[error("no input given and standard input is a terminal")]
    NoInput,

    #[error("interactive mode needs a file or inline JSON input; the prompt reads stdin")]
    InteractiveStdin,
}

/// Input of a command that takes no expression: the argument if given,
/// otherwise piped standard input.
pub fn resolve_input(input: Option<&str>, stdin_piped: bool) -> Result<Input, InvocationError> {
    match input {
        Some(arg) => Ok(Input::from_arg(arg)),
        None if stdin_piped => Ok(Input::Stdin),
        None => Err(InvocationError::NoInput),
    }
}

/// Input of an interactive session. Standard input is ruled out because the
/// prompt itself reads from it.
pub fn resolve_interactive_input(input: Option<&str>) -> Result<Input, InvocationError> {
    match input.map(Input::from_arg) {
        Some(Input::Stdin) | None => Err(InvocationError::InteractiveStdin),
        Some(input) => Ok(input),
    }
}

/// Work out the record source and the expression from the positional
/// arguments.
///
/// With piped standard input a single argument is the expression; without
/// it a single argument is the input. Missing expressions fall back to
/// `default_expression`.
pub fn resolve_arguments(
    input: Option<&str>,
    expression: Option<&str>,
    stdin_piped: bool,
    default_expression: &str,
) -> Result<(Input, String), InvocationError> {
    match (input, expression) {
        (Some(input), Some(expression)) => Ok((Input::from_arg(input), expression.to_string())),
        (Some(arg), None) if stdin_piped => Ok((Input::Stdin, arg.to_string())),
        (Some(input), None) => Ok((Input::from_arg(input), default_expression.to_string())),
        (None, _) if stdin_piped => Ok((Input::Stdin, default_expression.to_string())),
        (None, _) => Err(InvocationError::NoInput),
    }
}

/// What an expression asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Select(String),
    Filter(Condition),
    Path(FieldPath),
}

impl Route {
    /// A path that selects by an inline predicate (`sensors.*.type=temp.name`)
    /// wins over the filter reading of the same text.
    pub fn classify(expression: &str) -> Self {
        let trimmed = expression.trim();
        let is_select = trimmed
            .get(..6)
            .is_some_and(|head| head.eq_ignore_ascii_case("select"));
        if is_select {
            return Route::Select(trimmed.to_string());
        }

        let path = FieldPath::parse(trimmed);
        if path.selects_by_predicate() {
            return Route::Path(path);
        }
        match Condition::parse_inline(trimmed) {
            Some(condition) => Route::Filter(condition),
            None => Route::Path(path),
        }
    }
}

/// Output options shared by every route.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub pretty: bool,
    pub explain: bool,
    /// Write each element of an array result on its own line.
    pub extract: bool,
    /// Top-level fields kept in object results; empty keeps everything.
    pub select: Vec<String>,
}

impl RunOptions {
    fn reshapes(&self) -> bool {
        self.extract || !self.select.is_empty()
    }
}

/// Run `expression` against `table` and write the results to `sink`.
///
/// `table` is also registered in the catalog under its own name so that
/// `FROM <name>` resolves; queries without FROM scan it directly.
///
/// # Returns
/// Number of values written (zero when only the plan was printed)
pub fn run<W: Write>(
    expression: &str,
    table: Arc<dyn Table>,
    options: &RunOptions,
    sink: &mut W,
) -> QueryResult<usize> {
    let route = Route::classify(expression);
    tracing::debug!(?route, "routing expression");

    let query = match route {
        Route::Select(text) => parse_query(&text)?,
        Route::Filter(condition) => Query {
            fields: Vec::new(),
            source: None,
            filter: Some(condition.into()),
            group_by: None,
        },
        Route::Path(path) => return extract_paths(&path, table.as_ref(), options, sink),
    };

    let mut catalog = Catalog::new();
    catalog.register(table.clone());
    let plan = Planner::with_catalog(table, catalog).plan(&query)?;

    if options.explain {
        explain(&plan, sink)?;
        return Ok(0);
    }
    if options.reshapes() {
        return drain(plan.execute()?, None, options, sink);
    }
    Executor::new().pretty(options.pretty).execute(&plan, sink)
}

fn explain<W: Write>(plan: &PlanNode, sink: &mut W) -> QueryResult<()> {
    sink.write_all(format_plan(plan).as_bytes())?;
    sink.flush()?;
    Ok(())
}

/// Write `path` extracted from every record, skipping records where it
/// does not resolve.
fn extract_paths<W: Write>(
    path: &FieldPath,
    table: &dyn Table,
    options: &RunOptions,
    sink: &mut W,
) -> QueryResult<usize> {
    if options.explain {
        writeln!(sink, "└─ Extract(path: {})", path.as_str())?;
        return Ok(0);
    }
    drain(table.iterate()?, Some(path), options, sink)
}

/// Write every row of `rows`, or `path` taken from it, then close `rows`.
fn drain<W: Write>(
    mut rows: Box<dyn RowIterator>,
    path: Option<&FieldPath>,
    options: &RunOptions,
    sink: &mut W,
) -> QueryResult<usize> {
    let written = write_rows(rows.as_mut(), path, options, sink);
    // Close on every path; the first failure wins
    let closed = rows.close();
    let count = written?;
    closed?;
    sink.flush()?;
    Ok(count)
}

fn write_rows<W: Write>(
    rows: &mut dyn RowIterator,
    path: Option<&FieldPath>,
    options: &RunOptions,
    sink: &mut W,
) -> QueryResult<usize> {
    let mut count = 0;
    let mut skipped = 0;
    while rows.next() {
        let Some(row) = rows.row() else {
            continue;
        };
        match select_value(row, path) {
            Some(value) => count += emit(&value, options, sink)?,
            None => skipped += 1,
        }
    }
    tracing::debug!(written = count, skipped, "results written");

    match rows.error() {
        Some(err) => Err(err.detached()),
        None => Ok(count),
    }
}

fn select_value<'r>(row: &'r Row, path: Option<&FieldPath>) -> Option<Cow<'r, Value>> {
    let Some(path) = path else {
        return Some(Cow::Borrowed(row.as_value()));
    };
    match row.get_path(path) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::trace!(path = path.as_str(), error = %err, "record skipped");
            None
        }
    }
}

/// Write one result, flattened and pruned as `options` ask.
///
/// # Returns
/// Number of lines written
fn emit<W: Write>(value: &Value, options: &RunOptions, sink: &mut W) -> QueryResult<usize> {
    let items = match value {
        Value::Array(items) if options.extract => items.as_slice(),
        single => std::slice::from_ref(single),
    };
    for item in items {
        let item = prune(item, &options.select);
        if options.pretty {
            serde_json::to_writer_pretty(&mut *sink, item.as_ref())?;
        } else {
            serde_json::to_writer(&mut *sink, item.as_ref())?;
        }
        sink.write_all(b"\n")?;
    }
    Ok(items.len())
}

/// Keep only the `select` keys of an object, in `select` order. Missing keys
/// are left out and non-object values pass through.
fn prune<'a>(value: &'a Value, select: &[String]) -> Cow<'a, Value> {
    match value {
        Value::Object(map) if !select.is_empty() => {
            let pruned: Map<String, Value> = select
                .iter()
                .filter_map(|field| map.get(field).map(|v| (field.clone(), v.clone())))
                .collect();
            Cow::Owned(Value::Object(pruned))
        }
        _ => Cow::Borrowed(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recql_core::{CompareOp, InMemoryTable};
    use serde_json::json;

    #[test]
    fn test_resolve_arguments() {
        assert_eq!(
            resolve_arguments(Some("a.json"), Some(".name"), false, "."),
            Ok((Input::from_arg("a.json"), ".name".to_string()))
        );
        assert_eq!(
            resolve_arguments(Some("a.json"), None, false, "."),
            Ok((Input::from_arg("a.json"), ".".to_string()))
        );
        assert_eq!(
            resolve_arguments(Some("SELECT name"), None, true, "."),
            Ok((Input::Stdin, "SELECT name".to_string()))
        );
        assert_eq!(
            resolve_arguments(None, None, true, ".user"),
            Ok((Input::Stdin, ".user".to_string()))
        );
        assert_eq!(
            resolve_arguments(None, None, false, "."),
            Err(InvocationError::NoInput)
        );
    }

    #[test]
    fn test_classify() {
        assert!(matches!(Route::classify("  select name"), Route::Select(_)));
        assert!(matches!(Route::classify("SELECT *"), Route::Select(_)));
        assert_eq!(
            Route::classify("age>=30"),
            Route::Filter(Condition::new("age", CompareOp::GreaterThanOrEqual, json!(30)))
        );
        assert_eq!(Route::classify(".user.name"), Route::Path(FieldPath::parse(".user.name")));
        assert_eq!(Route::classify("user"), Route::Path(FieldPath::parse("user")));
    }

    #[test]
    fn test_classify_prefers_predicate_paths() {
        assert_eq!(
            Route::classify("sensors.*.type=temp.name"),
            Route::Path(FieldPath::parse("sensors.*.type=temp.name"))
        );
        assert_eq!(
            Route::classify("readings.*~=temp"),
            Route::Path(FieldPath::parse("readings.*~=temp"))
        );
        // A trailing comparison still filters records
        assert!(matches!(Route::classify("items.*.price>20"), Route::Filter(_)));
        assert!(matches!(Route::classify("user.age>28"), Route::Filter(_)));
    }

    #[test]
    fn test_resolve_input() {
        assert_eq!(resolve_input(Some("a.json"), false), Ok(Input::from_arg("a.json")));
        assert_eq!(resolve_input(None, true), Ok(Input::Stdin));
        assert_eq!(resolve_input(None, false), Err(InvocationError::NoInput));

        assert_eq!(resolve_interactive_input(Some("a.json")), Ok(Input::from_arg("a.json")));
        assert_eq!(
            resolve_interactive_input(Some("-")),
            Err(InvocationError::InteractiveStdin)
        );
        assert_eq!(resolve_interactive_input(None), Err(InvocationError::InteractiveStdin));
    }

    fn people() -> Arc<dyn Table> {
        Arc::new(InMemoryTable::new(
            "input",
            vec![
                json!({"name": "Alice", "age": 30, "city": {"name": "Rome"}}),
                json!({"name": "Bob", "age": 25}),
            ],
        ))
    }

    fn run_to_string(expression: &str, options: RunOptions) -> String {
        let mut out = Vec::new();
        run(expression, people(), &options, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_run_select() {
        assert_eq!(
            run_to_string("SELECT name FROM input WHERE age > 26", RunOptions::default()),
            "{\"name\":\"Alice\"}\n"
        );
    }

    #[test]
    fn test_run_filter() {
        assert_eq!(
            run_to_string("age<30", RunOptions::default()),
            "{\"name\":\"Bob\",\"age\":25}\n"
        );
    }

    #[test]
    fn test_run_path_skips_missing() {
        assert_eq!(run_to_string(".city.name", RunOptions::default()), "\"Rome\"\n");
    }

    #[test]
    fn test_run_predicate_path() {
        let table: Arc<dyn Table> = Arc::new(InMemoryTable::new(
            "input",
            vec![json!({"sensors": [
                {"name": "s1", "type": "temp"},
                {"name": "s2", "type": "humidity"},
                {"name": "s3", "type": "temp"}
            ]})],
        ));
        let mut out = Vec::new();
        run("sensors.*.type=temp.name", table, &RunOptions::default(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[\"s1\",\"s3\"]\n");
    }

    #[test]
    fn test_run_select_prunes_fields() {
        let options = RunOptions {
            select: vec![
                "age".to_string(),
                "missing".to_string(),
                "name".to_string(),
            ],
            ..RunOptions::default()
        };
        assert_eq!(
            run_to_string("age>20", options.clone()),
            "{\"age\":30,\"name\":\"Alice\"}\n{\"age\":25,\"name\":\"Bob\"}\n"
        );
        // Scalars pass through untouched
        assert_eq!(run_to_string(".name", options), "\"Alice\"\n\"Bob\"\n");
    }

    #[test]
    fn test_run_extract_flattens_arrays() {
        let table: Arc<dyn Table> = Arc::new(InMemoryTable::new(
            "input",
            vec![
                json!({"tags": ["a", "b"]}),
                json!({"tags": []}),
                json!({"tags": "c"}),
            ],
        ));
        let options = RunOptions {
            extract: true,
            ..RunOptions::default()
        };
        let mut out = Vec::new();
        let written = run(".tags", table.clone(), &options, &mut out).unwrap();
        assert_eq!(written, 3);
        assert_eq!(String::from_utf8(out).unwrap(), "\"a\"\n\"b\"\n\"c\"\n");

        // Whole records are objects and stay on one line
        let mut out = Vec::new();
        run("tags=b", table, &options, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\"tags\":[\"a\",\"b\"]}\n");
    }

    #[test]
    fn test_run_explain() {
        let options = RunOptions {
            explain: true,
            ..RunOptions::default()
        };
        assert_eq!(
            run_to_string("name=Bob", options),
            "└─ Filter(expression: name = 'Bob')\n   └─ Scan(table: default)\n"
        );
    }

    #[test]
    fn test_run_unknown_table() {
        let mut out = Vec::new();
        let err = run(
            "SELECT * FROM nowhere",
            people(),
            &RunOptions::default(),
            &mut out,
        )
        .unwrap_err();
        assert!(matches!(err, recql_core::QueryError::Plan(_)));
    }
}
