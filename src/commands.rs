//! Whole-source commands: statistics, validation and layout conversion.
//!
//! Unlike expressions, these read every record of the input before writing
//! anything, so a decode failure leaves the output empty.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Context;
use clap::{ArgAction, Subcommand};
use recql_core::{QueryError, QueryResult, RowIterator};
use serde_json::Value;

use crate::cli::resolve_input;
use crate::source::{Input, JsonTable, RecordFormat};

/// Available commands besides the default expression mode
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the record count and the value types seen for each field
    Stats {
        /// File path, `-` for standard input, or an inline JSON literal
        input: Option<String>,
    },

    /// Check that the input decodes as JSON or JSONL
    Validate {
        /// File path, `-` for standard input, or an inline JSON literal
        input: Option<String>,
    },

    /// Rewrite the records as a JSON array or as JSONL
    Convert {
        /// File path, `-` for standard input, or an inline JSON literal
        input: String,

        /// Target layout
        #[arg(short, long, value_enum)]
        to: RecordFormat,

        /// Pretty-print each value
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        pretty: bool,
    },

    /// Re-indent the records, keeping the input layout unless told otherwise
    Format {
        /// File path, `-` for standard input, or an inline JSON literal
        input: String,

        /// Output layout; defaults to the layout of the input
        #[arg(short, long, value_enum)]
        output: Option<RecordFormat>,

        /// Pretty-print each value
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        pretty: bool,
    },
}

/// Execute a command, writing its report or records to `sink`.
pub fn execute<W: Write>(command: Command, stdin_piped: bool, sink: &mut W) -> anyhow::Result<()> {
    match command {
        Command::Stats { input } => {
            let table = open_table(resolve_input(input.as_deref(), stdin_piped)?);
            let stats = RecordStats::gather(&table)
                .with_context(|| format!("failed to read {}", table.input()))?;
            stats.write_report(&table.input().to_string(), sink)?;
        }
        Command::Validate { input } => {
            let table = open_table(resolve_input(input.as_deref(), stdin_piped)?);
            cmd_validate(&table, sink)?;
        }
        Command::Convert { input, to, pretty } => {
            let table = open_table(Input::from_arg(&input));
            cmd_convert(&table, to, pretty, sink)
                .with_context(|| format!("failed to convert {}", table.input()))?;
        }
        Command::Format {
            input,
            output,
            pretty,
        } => {
            let table = open_table(Input::from_arg(&input));
            cmd_format(&table, output, pretty, sink)
                .with_context(|| format!("failed to format {}", table.input()))?;
        }
    }
    sink.flush()?;
    Ok(())
}

fn open_table(input: Input) -> JsonTable {
    JsonTable::new("input", input)
}

/// Visit every record of `table` in order.
///
/// # Returns
/// The layout the input turned out to have
fn for_each_record(table: &JsonTable, mut visit: impl FnMut(&Value)) -> QueryResult<RecordFormat> {
    let mut records = table.scan()?;
    while records.next() {
        if let Some(row) = records.row() {
            visit(row.as_value());
        }
    }
    let failed = records.error().map(QueryError::detached);
    records.close()?;
    match failed {
        Some(err) => Err(err),
        None => Ok(records.format()),
    }
}

/// JSON type name used in statistics.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Record count and per-field type counts of a whole input.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordStats {
    pub records: usize,
    pub format: RecordFormat,
    /// Top-level field name to type name to number of records.
    pub fields: BTreeMap<String, BTreeMap<&'static str, usize>>,
}

impl RecordStats {
    /// Read `table` once and count the type of every top-level field.
    /// Records that are not objects count toward the total only.
    pub fn gather(table: &JsonTable) -> QueryResult<Self> {
        let mut records = 0;
        let mut fields: BTreeMap<String, BTreeMap<&'static str, usize>> = BTreeMap::new();

        let format = for_each_record(table, |record| {
            records += 1;
            if let Value::Object(map) = record {
                for (key, value) in map {
                    *fields
                        .entry(key.clone())
                        .or_default()
                        .entry(type_name(value))
                        .or_default() += 1;
                }
            }
        })?;

        tracing::debug!(records, fields = fields.len(), "gathered statistics");
        Ok(Self {
            records,
            format,
            fields,
        })
    }

    pub fn write_report<W: Write>(&self, label: &str, sink: &mut W) -> std::io::Result<()> {
        writeln!(sink, "File: {}", label)?;
        writeln!(sink, "Format: {}", self.format)?;
        writeln!(sink, "Total records: {}", self.records)?;
        writeln!(sink)?;
        writeln!(sink, "Fields:")?;
        for (field, types) in &self.fields {
            writeln!(sink, "  {}:", field)?;
            for (type_name, count) in types {
                let share = *count as f64 / self.records as f64 * 100.0;
                writeln!(sink, "    {}: {} ({:.1}%)", type_name, count, share)?;
            }
        }
        Ok(())
    }
}

/// Decode every record and report the outcome on `sink`.
///
/// # Returns
/// Number of valid records, or the first decode error after it was reported
pub fn cmd_validate<W: Write>(table: &JsonTable, sink: &mut W) -> QueryResult<usize> {
    let mut count = 0;
    match for_each_record(table, |_| count += 1) {
        Ok(format) => {
            writeln!(sink, "✅ Valid {} file with {} record(s)", format, count)?;
            Ok(count)
        }
        Err(err) => {
            writeln!(sink, "❌ Validation failed: {}", err)?;
            Err(err)
        }
    }
}

/// Read all records of `table`.
pub fn read_all(table: &JsonTable) -> QueryResult<(Vec<Value>, RecordFormat)> {
    let mut records = Vec::new();
    let format = for_each_record(table, |record| records.push(record.clone()))?;
    Ok((records, format))
}

/// Write `records` as one JSON array or as one value per line.
pub fn write_records<W: Write>(
    records: &[Value],
    format: RecordFormat,
    pretty: bool,
    sink: &mut W,
) -> QueryResult<()> {
    match format {
        RecordFormat::Json => {
            if pretty {
                serde_json::to_writer_pretty(&mut *sink, records)?;
            } else {
                serde_json::to_writer(&mut *sink, records)?;
            }
            sink.write_all(b"\n")?;
        }
        RecordFormat::Jsonl => {
            for record in records {
                if pretty {
                    serde_json::to_writer_pretty(&mut *sink, record)?;
                } else {
                    serde_json::to_writer(&mut *sink, record)?;
                }
                sink.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

/// Rewrite `table` in the `to` layout.
///
/// # Returns
/// Number of records written
pub fn cmd_convert<W: Write>(
    table: &JsonTable,
    to: RecordFormat,
    pretty: bool,
    sink: &mut W,
) -> QueryResult<usize> {
    let (records, from) = read_all(table)?;
    tracing::debug!(%from, %to, records = records.len(), "converting");
    write_records(&records, to, pretty, sink)?;
    Ok(records.len())
}

/// Rewrite `table` in `output`, or in its own layout when `output` is None.
///
/// # Returns
/// The layout written
pub fn cmd_format<W: Write>(
    table: &JsonTable,
    output: Option<RecordFormat>,
    pretty: bool,
    sink: &mut W,
) -> QueryResult<RecordFormat> {
    let (records, detected) = read_all(table)?;
    let format = output.unwrap_or(detected);
    write_records(&records, format, pretty, sink)?;
    Ok(format)
}
