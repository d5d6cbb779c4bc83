//! Grouped aggregation.
//!
//! The input is drained completely on the first `next`; only accumulator
//! state is kept per group. Groups are emitted sorted by key.

use std::borrow::Cow;
use std::collections::{BTreeMap, VecDeque};

use serde_json::Value;

use super::accumulator::Accumulator;
use crate::compare::format_value;
use crate::error::{QueryError, QueryResult};
use crate::path::FieldPath;
use crate::query::Field;
use crate::table::{OutputRecord, Row, RowIterator};

pub(super) struct AggregateIterator {
    input: Box<dyn RowIterator>,
    group_by: Option<FieldPath>,
    fields: Vec<Field>,
    results: Option<VecDeque<Row>>,
    current: Option<Row>,
    closed: bool,
}

/// Accumulators of one group, one slot per field.
struct GroupState {
    slots: Vec<Slot>,
}

enum Slot {
    Aggregate(Accumulator),
    /// Value of a plain field in the first row of the group.
    FirstSeen(Value),
}

impl GroupState {
    fn new(fields: &[Field], first_row: Option<&Row>) -> Self {
        let slots = fields
            .iter()
            .map(|field| match field.aggregate {
                Some(function) => Slot::Aggregate(Accumulator::new(function)),
                None => Slot::FirstSeen(
                    first_row
                        .and_then(|row| row.get_path(&field.path).ok())
                        .map_or(Value::Null, Cow::into_owned),
                ),
            })
            .collect();
        Self { slots }
    }

    fn update(&mut self, fields: &[Field], row: &Row) {
        for (field, slot) in fields.iter().zip(self.slots.iter_mut()) {
            let Slot::Aggregate(acc) = slot else {
                continue;
            };
            if field.counts_rows() {
                acc.count_row();
            } else if let Ok(value) = row.get_path(&field.path) {
                acc.feed(&value);
            }
        }
    }

    fn finish(self, key: &str, fields: &[Field], group_by: Option<&FieldPath>) -> Row {
        let record: OutputRecord = fields
            .iter()
            .zip(self.slots)
            .map(|(field, slot)| {
                let value = match slot {
                    Slot::Aggregate(acc) => acc.result(),
                    Slot::FirstSeen(_)
                        if group_by.is_some_and(|g| g.as_str() == field.path.as_str()) =>
                    {
                        Value::String(key.to_string())
                    }
                    Slot::FirstSeen(value) => value,
                };
                (field.alias.clone(), value)
            })
            .collect();
        Row::from(record)
    }
}

impl AggregateIterator {
    pub(super) fn new(
        input: Box<dyn RowIterator>,
        group_by: Option<FieldPath>,
        fields: Vec<Field>,
    ) -> Self {
        Self {
            input,
            group_by,
            fields,
            results: None,
            current: None,
            closed: false,
        }
    }

    fn group_key(&self, row: &Row) -> String {
        match &self.group_by {
            None => String::new(),
            Some(path) => row
                .get_path(path)
                .map_or_else(|_| "null".to_string(), |value| format_value(&value)),
        }
    }

    fn drain_input(&mut self) -> VecDeque<Row> {
        let mut groups: BTreeMap<String, GroupState> = BTreeMap::new();
        let mut rows_seen = 0usize;

        while self.input.next() {
            let Some(row) = self.input.row() else {
                continue;
            };
            rows_seen += 1;
            let key = self.group_key(row);
            tracing::trace!(group = %key, "aggregating row");
            groups
                .entry(key)
                .or_insert_with(|| GroupState::new(&self.fields, Some(row)))
                .update(&self.fields, row);
        }

        if self.input.error().is_some() {
            return VecDeque::new();
        }

        // Global aggregation over no rows still yields one row
        let has_aggregates = self.fields.iter().any(|f| f.aggregate.is_some());
        if rows_seen == 0 && self.group_by.is_none() && has_aggregates {
            groups.insert(String::new(), GroupState::new(&self.fields, None));
        }

        tracing::debug!(rows = rows_seen, groups = groups.len(), "aggregation drained input");
        groups
            .into_iter()
            .map(|(key, state)| state.finish(&key, &self.fields, self.group_by.as_ref()))
            .collect()
    }
}

impl RowIterator for AggregateIterator {
    fn next(&mut self) -> bool {
        if self.closed {
            self.current = None;
            return false;
        }
        if self.results.is_none() {
            let results = self.drain_input();
            self.results = Some(results);
        }
        self.current = self.results.as_mut().and_then(VecDeque::pop_front);
        self.current.is_some()
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
        self.results = None;
        self.current = None;
        self.input.close()
    }
}
