//! JSON Table Tests
//!
//! Queries run end to end over `JsonTable` sources backed by temporary
//! files:
//! - Line-delimited and array-wrapped documents
//! - Inline literals and single-use readers
//! - Decode failures after partial output
//! - Array-wrapped documents streamed element by element

use std::io::{Cursor, Write};
use std::sync::Arc;

use recql::{run, Input, JsonTable, RunOptions};
use recql_core::{create_plan, parse_query, Executor, QueryError, Table};
use serde_json::{json, Value};
use tempfile::NamedTempFile;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn file_table(file: &NamedTempFile) -> Arc<JsonTable> {
    Arc::new(JsonTable::new("input", Input::File(file.path().to_path_buf())))
}

fn query(table: Arc<JsonTable>, text: &str) -> Vec<Value> {
    let plan = create_plan(&parse_query(text).unwrap(), table).unwrap();
    Executor::new().collect(&plan).unwrap()
}

const USERS_JSONL: &str = r#"{"name": "Alice", "age": 30, "role": "admin"}
{"name": "Bob", "age": 25, "role": "user"}
{"name": "Carol", "age": 41, "role": "user"}
"#;

#[test]
fn test_jsonl_file() {
    let file = write_temp(USERS_JSONL);
    let results = query(file_table(&file), "SELECT name WHERE age > 26");
    assert_eq!(results, vec![json!({"name": "Alice"}), json!({"name": "Carol"})]);
}

#[test]
fn test_array_wrapped_file() {
    let file = write_temp(
        r#"[
        {"name": "Alice", "age": 30},
        {"name": "Bob", "age": 25}
    ]"#,
    );
    let results = query(file_table(&file), "SELECT COUNT(name), SUM(age)");
    assert_eq!(results, vec![json!({"COUNT_name": 2, "SUM_age": 55.0})]);
}

#[test]
fn test_file_scans_are_independent() {
    let file = write_temp(USERS_JSONL);
    let table = file_table(&file);
    let first = query(table.clone(), "SELECT name");
    let second = query(table, "SELECT name");
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}

#[test]
fn test_group_by_over_file() {
    let file = write_temp(USERS_JSONL);
    let results = query(
        file_table(&file),
        "SELECT role, COUNT(*) AS n FROM input GROUP BY role",
    );
    assert_eq!(
        results,
        vec![json!({"role": "admin", "n": 1}), json!({"role": "user", "n": 2})]
    );
}

#[test]
fn test_decode_error_keeps_partial_output() {
    let file = write_temp("{\"a\": 1}\n{\"a\": 2}\n{\"a\": \n");
    let plan = create_plan(&parse_query("SELECT a").unwrap(), file_table(&file)).unwrap();

    let mut out = Vec::new();
    let err = Executor::new().execute(&plan, &mut out).unwrap_err();
    assert!(matches!(err, QueryError::Source(_)), "{}", err);
    assert_eq!(String::from_utf8(out).unwrap(), "{\"a\":1}\n{\"a\":2}\n");
}

#[test]
fn test_missing_file_is_source_error() {
    let table = Arc::new(JsonTable::new("input", Input::File("/no/such/records.jsonl".into())));
    let plan = create_plan(&parse_query("SELECT *").unwrap(), table).unwrap();
    let err = Executor::new().collect(&plan).unwrap_err();
    assert!(matches!(err, QueryError::Source(_)));
}

#[test]
fn test_inline_literal_through_cli_routes() {
    let table: Arc<dyn Table> = Arc::new(JsonTable::new(
        "input",
        Input::from_arg(r#"[{"name": "Alice", "tags": ["a", "b"]}, {"name": "Bob"}]"#),
    ));

    let mut out = Vec::new();
    run("tags=b", table.clone(), &RunOptions::default(), &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "{\"name\":\"Alice\",\"tags\":[\"a\",\"b\"]}\n"
    );

    let mut out = Vec::new();
    let written = run(".name", table, &RunOptions::default(), &mut out).unwrap();
    assert_eq!(written, 2);
    assert_eq!(String::from_utf8(out).unwrap(), "\"Alice\"\n\"Bob\"\n");
}

#[test]
fn test_reader_table_second_scan_fails() {
    let reader = Cursor::new(USERS_JSONL.as_bytes().to_vec());
    let table = Arc::new(JsonTable::from_reader("input", reader));
    assert_eq!(query(table.clone(), "SELECT name").len(), 3);

    let plan = create_plan(&parse_query("SELECT name").unwrap(), table).unwrap();
    let err = Executor::new().collect(&plan).unwrap_err();
    assert!(matches!(err, QueryError::Source(_)));
}

#[test]
fn test_pretty_output_from_file() {
    let file = write_temp("{\"a\": {\"b\": 1}}");
    let mut out = Vec::new();
    let options = RunOptions {
        pretty: true,
        ..RunOptions::default()
    };
    run("SELECT a.b AS b FROM input", file_table(&file), &options, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "{\n  \"b\": 1\n}\n");
}

#[test]
fn test_array_wrapped_file_streams_past_bad_tail() {
    // Elements before the broken one are already out when decoding fails
    let file = write_temp("[{\"a\": 1}, {\"a\": 2}, {\"a\": }]");
    let plan = create_plan(&parse_query("SELECT a").unwrap(), file_table(&file)).unwrap();

    let mut out = Vec::new();
    let err = Executor::new().execute(&plan, &mut out).unwrap_err();
    assert!(err.to_string().contains("failed to decode record 3"), "{}", err);
    assert_eq!(String::from_utf8(out).unwrap(), "{\"a\":1}\n{\"a\":2}\n");
}
