//! Projection with array unwinding.
//!
//! Every field is extracted from the input row. When the sequence-valued
//! fields all share one non-zero length the row is zipped into that many
//! output rows, with scalar fields repeated. Any other shape yields a single
//! row holding the extracted values as they are.

use std::borrow::Cow;
use std::collections::VecDeque;

use serde_json::Value;

use crate::error::{QueryError, QueryResult};
use crate::query::Field;
use crate::table::{OutputRecord, Row, RowIterator};

pub(super) struct ProjectIterator {
    input: Box<dyn RowIterator>,
    fields: Vec<Field>,
    pending: VecDeque<Row>,
    current: Option<Row>,
    closed: bool,
}

impl ProjectIterator {
    pub(super) fn new(input: Box<dyn RowIterator>, fields: Vec<Field>) -> Self {
        Self {
            input,
            fields,
            pending: VecDeque::new(),
            current: None,
            closed: false,
        }
    }
}

impl RowIterator for ProjectIterator {
    fn next(&mut self) -> bool {
        loop {
            if let Some(row) = self.pending.pop_front() {
                self.current = Some(row);
                return true;
            }
            if !self.input.next() {
                self.current = None;
                return false;
            }
            if let Some(row) = self.input.row() {
                self.pending.extend(project_row(&self.fields, row));
            }
        }
    }

    fn row(&self) -> Option<&Row> {
        self.current.as_ref()
    }

    fn error(&self) -> Option<&QueryError> {
        self.input.error()
    }

    fn close(&mut self) -> QueryResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.pending.clear();
        self.current = None;
        self.input.close()
    }
}

/// Project one input row into one or more output rows.
pub(crate) fn project_row(fields: &[Field], row: &Row) -> Vec<Row> {
    // Failed extraction projects as null
    let values: Vec<Value> = fields
        .iter()
        .map(|field| {
            row.get_path(&field.path)
                .map(Cow::into_owned)
                .unwrap_or(Value::Null)
        })
        .collect();

    match zip_length(&values) {
        Some(len) => (0..len)
            .map(|i| {
                let record: OutputRecord = fields
                    .iter()
                    .zip(&values)
                    .map(|(field, value)| {
                        let value = match value {
                            Value::Array(items) => items[i].clone(),
                            scalar => scalar.clone(),
                        };
                        (field.alias.clone(), value)
                    })
                    .collect();
                Row::from(record)
            })
            .collect(),
        None => {
            let record: OutputRecord = fields
                .iter()
                .map(|field| field.alias.clone())
                .zip(values)
                .collect();
            vec![Row::from(record)]
        }
    }
}

/// Common length of the sequence-valued entries, when there is at least one
/// and they agree on a non-zero length.
fn zip_length(values: &[Value]) -> Option<usize> {
    let mut lengths = values.iter().filter_map(|v| v.as_array().map(Vec::len));
    let first = lengths.next()?;
    if first > 0 && lengths.all(|len| len == first) {
        Some(first)
    } else {
        None
    }
}
