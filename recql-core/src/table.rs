//! Record-source boundary.
//!
//! The engine never opens files or streams itself. A [`Table`] hands out
//! independent [`RowIterator`]s and every plan node speaks the same pull
//! protocol on top of them.

use std::borrow::Cow;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{PathResult, QueryError, QueryResult};
use crate::path::FieldPath;

/// Output record with fields in declaration order.
pub type OutputRecord = Map<String, Value>;

/// One immutable record flowing through a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    value: Value,
}

impl Row {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Path lookup with the same semantics as top-level extraction.
    pub fn get(&self, path: &str) -> PathResult<Cow<'_, Value>> {
        FieldPath::parse(path).extract(&self.value)
    }

    pub fn get_path(&self, path: &FieldPath) -> PathResult<Cow<'_, Value>> {
        path.extract(&self.value)
    }

    /// The raw record, for serialization.
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

impl From<Value> for Row {
    fn from(value: Value) -> Self {
        Row::new(value)
    }
}

impl From<OutputRecord> for Row {
    fn from(record: OutputRecord) -> Self {
        Row::new(Value::Object(record))
    }
}

/// Pull-based cursor over rows.
///
/// `next` returns false both at the end and on failure; callers check
/// `error` after the loop. `close` must be called once by the consumer on
/// every exit path and is idempotent.
pub trait RowIterator {
    /// Advance to the next row.
    ///
    /// # Returns
    /// true if a row is available through `row()`
    fn next(&mut self) -> bool;

    /// Current row, valid only after `next()` returned true.
    fn row(&self) -> Option<&Row>;

    /// Error that stopped iteration, if any.
    fn error(&self) -> Option<&QueryError>;

    /// Release resources held by this iterator and its inputs.
    fn close(&mut self) -> QueryResult<()>;
}

/// A named source of records.
///
/// Implementations must hand out a fresh, independent iterator on every call.
/// Tables are shared read-only between plans, hence `Send + Sync`.
pub trait Table: Send + Sync {
    fn name(&self) -> &str;

    /// Open a new iterator over all records.
    ///
    /// # Returns
    /// A new iterator, or an error if the source cannot be opened
    fn iterate(&self) -> QueryResult<Box<dyn RowIterator>>;
}

/// A table backed by a vector of records. Useful for testing and embedding.
#[derive(Debug, Clone)]
pub struct InMemoryTable {
    name: String,
    records: Arc<Vec<Value>>,
}

impl InMemoryTable {
    pub fn new(name: impl Into<String>, records: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            records: Arc::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Table for InMemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn iterate(&self) -> QueryResult<Box<dyn RowIterator>> {
        Ok(Box::new(VecRowIterator::new(self.records.clone())))
    }
}

/// Iterator over a shared vector of records.
pub struct VecRowIterator {
    records: Arc<Vec<Value>>,
    index: usize,
    current: Option<Row>,
    closed: bool,
}

impl VecRowIterator {
    pub fn new(records: Arc<Vec<Value>>) -> Self {
        Self {
            records,
            index: 0,
            current: None,
            closed: false,
        }
    }
}

impl RowIterator for VecRowIterator {
    fn next(&mut self) -> bool {
        if self.closed {
            self.current = None;
            return false;
        }
        self.current = self.records.get(self.index).cloned().map(Row::new);
        if self.current.is_some() {
            self.index += 1;
        }
        self.current.is_some()
    }

    fn row(&self) -> Option<&Row> {
        self.current.as_ref()
    }

    fn error(&self) -> Option<&QueryError> {
        None
    }

    fn close(&mut self) -> QueryResult<()> {
        self.closed = true;
        self.current = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_lookup() {
        let row = Row::new(json!({"user": {"name": "Alice"}, "tags": ["a", "b"]}));
        assert_eq!(*row.get("user.name").unwrap(), json!("Alice"));
        assert_eq!(*row.get("tags.1").unwrap(), json!("b"));
        assert!(row.get("user.email").is_err());
        assert_eq!(row.as_value()["tags"], json!(["a", "b"]));
    }

    #[test]
    fn test_in_memory_iterators_are_independent() {
        let table = InMemoryTable::new("t", vec![json!({"a": 1}), json!({"a": 2})]);
        let mut first = table.iterate().unwrap();
        let mut second = table.iterate().unwrap();

        assert!(first.next());
        assert!(first.next());
        assert_eq!(first.row().unwrap().as_value(), &json!({"a": 2}));

        assert!(second.next());
        assert_eq!(second.row().unwrap().as_value(), &json!({"a": 1}));

        assert!(!first.next());
        assert!(first.row().is_none());
        assert!(first.error().is_none());
        first.close().unwrap();
        second.close().unwrap();
    }

    #[test]
    fn test_close_stops_iteration() {
        let table = InMemoryTable::new("t", vec![json!(1), json!(2)]);
        let mut iter = table.iterate().unwrap();
        assert!(iter.next());
        iter.close().unwrap();
        iter.close().unwrap();
        assert!(!iter.next());
    }
}
