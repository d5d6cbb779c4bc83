//! CLI Command Tests
//!
//! The whole-source commands run against temporary files:
//! - stats and validate reports
//! - convert and format between JSON and JSONL layouts
//! - result shaping with select and extract over file sources

use std::io::Write;
use std::sync::Arc;

use recql::commands::{cmd_convert, cmd_format, cmd_validate, execute};
use recql::{run, Command, Input, JsonTable, RecordFormat, RecordStats, RunOptions};
use serde_json::{json, Value};
use tempfile::NamedTempFile;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn file_table(file: &NamedTempFile) -> JsonTable {
    JsonTable::new("input", Input::File(file.path().to_path_buf()))
}

fn path_arg(file: &NamedTempFile) -> String {
    file.path().display().to_string()
}

const EVENTS_JSONL: &str = r#"{"id": 1, "kind": "login", "user": {"name": "alice"}, "tags": ["web"]}
{"id": 2, "kind": "logout", "user": null}
{"id": "3", "kind": "login", "user": {"name": "bob"}, "tags": ["cli", "api"]}
"#;

#[test]
fn test_stats_report() {
    let file = write_temp(EVENTS_JSONL);
    let mut out = Vec::new();
    execute(
        Command::Stats {
            input: Some(path_arg(&file)),
        },
        false,
        &mut out,
    )
    .unwrap();

    let report = String::from_utf8(out).unwrap();
    let expected = format!(
        "File: {}\nFormat: JSONL\nTotal records: 3\n\nFields:\n\
         \x20 id:\n    number: 2 (66.7%)\n    string: 1 (33.3%)\n\
         \x20 kind:\n    string: 3 (100.0%)\n\
         \x20 tags:\n    array: 2 (66.7%)\n\
         \x20 user:\n    null: 1 (33.3%)\n    object: 2 (66.7%)\n",
        path_arg(&file)
    );
    assert_eq!(report, expected);
}

#[test]
fn test_stats_of_array_document() {
    let file = write_temp(r#"[{"a": 1}, {"a": 2.5}]"#);
    let stats = RecordStats::gather(&file_table(&file)).unwrap();
    assert_eq!(stats.records, 2);
    assert_eq!(stats.format, RecordFormat::Json);
    assert_eq!(stats.fields["a"]["number"], 2);
}

#[test]
fn test_stats_without_input_needs_piped_stdin() {
    let mut out = Vec::new();
    let err = execute(Command::Stats { input: None }, false, &mut out).unwrap_err();
    assert!(err.to_string().contains("no input given"), "{}", err);
}

#[test]
fn test_validate() {
    let file = write_temp(EVENTS_JSONL);
    let mut out = Vec::new();
    assert_eq!(cmd_validate(&file_table(&file), &mut out).unwrap(), 3);
    assert_eq!(String::from_utf8(out).unwrap(), "✅ Valid JSONL file with 3 record(s)\n");

    let file = write_temp(r#"[{"a": 1}]"#);
    let mut out = Vec::new();
    cmd_validate(&file_table(&file), &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "✅ Valid JSON file with 1 record(s)\n");
}

#[test]
fn test_validate_failure_is_an_error() {
    let file = write_temp("{\"a\": 1}\n{\"a\": tru}\n");
    let mut out = Vec::new();
    let err = execute(
        Command::Validate {
            input: Some(path_arg(&file)),
        },
        false,
        &mut out,
    )
    .unwrap_err();
    assert!(format!("{:#}", err).contains("failed to decode record 2"), "{:#}", err);
    assert!(String::from_utf8(out).unwrap().starts_with("❌ Validation failed:"));
}

#[test]
fn test_convert_jsonl_to_json() {
    let file = write_temp("{\"a\":1}\n{\"a\":2}\n");
    let mut out = Vec::new();
    let count = cmd_convert(&file_table(&file), RecordFormat::Json, false, &mut out).unwrap();
    assert_eq!(count, 2);
    assert_eq!(String::from_utf8(out).unwrap(), "[{\"a\":1},{\"a\":2}]\n");
}

#[test]
fn test_convert_json_to_pretty_jsonl() {
    let file = write_temp(r#"[{"a": 1}, {"b": [true]}]"#);
    let mut out = Vec::new();
    execute(
        Command::Convert {
            input: path_arg(&file),
            to: RecordFormat::Jsonl,
            pretty: true,
        },
        false,
        &mut out,
    )
    .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "{\n  \"a\": 1\n}\n{\n  \"b\": [\n    true\n  ]\n}\n"
    );
}

#[test]
fn test_format_detects_array_layout() {
    let file = write_temp("[ {\"a\":1} ,\n  {\"a\":2} ]");
    let mut out = Vec::new();
    let format = cmd_format(&file_table(&file), None, true, &mut out).unwrap();
    assert_eq!(format, RecordFormat::Json);

    let written: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(written, json!([{"a": 1}, {"a": 2}]));
    assert!(String::from_utf8(out).unwrap().starts_with("[\n  {\n"));
}

#[test]
fn test_format_with_explicit_output() {
    let file = write_temp("[{\"a\":1},{\"a\":2}]");
    let mut out = Vec::new();
    execute(
        Command::Format {
            input: path_arg(&file),
            output: Some(RecordFormat::Jsonl),
            pretty: false,
        },
        false,
        &mut out,
    )
    .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "{\"a\":1}\n{\"a\":2}\n");
}

#[test]
fn test_select_and_extract_over_file() {
    let file = write_temp(EVENTS_JSONL);
    let table = Arc::new(file_table(&file));

    let options = RunOptions {
        select: vec!["id".to_string()],
        ..RunOptions::default()
    };
    let mut out = Vec::new();
    run("kind=login", table.clone(), &options, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "{\"id\":1}\n{\"id\":\"3\"}\n");

    let options = RunOptions {
        extract: true,
        ..RunOptions::default()
    };
    let mut out = Vec::new();
    let written = run(".tags", table, &options, &mut out).unwrap();
    assert_eq!(written, 3);
    assert_eq!(String::from_utf8(out).unwrap(), "\"web\"\n\"cli\"\n\"api\"\n");
}

#[test]
fn test_predicate_path_over_file() {
    let file = write_temp(
        r#"{"sensors": [{"type": "temp", "name": "s1"}, {"type": "hum", "name": "s2"}]}"#,
    );
    let mut out = Vec::new();
    run(
        "sensors.*.type=temp.name",
        Arc::new(file_table(&file)),
        &RunOptions::default(),
        &mut out,
    )
    .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "[\"s1\"]\n");
}
