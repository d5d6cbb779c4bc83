use crate::error::{QueryError, QueryResult};
use crate::expression::Expression;
use crate::table::{Row, RowIterator};

/// Skips input rows whose record fails the expression.
pub(super) struct FilterIterator {
    input: Box<dyn RowIterator>,
    expression: Expression,
    closed: bool,
}

impl FilterIterator {
    pub(super) fn new(input: Box<dyn RowIterator>, expression: Expression) -> Self {
        Self {
            input,
            expression,
            closed: false,
        }
    }
}

impl RowIterator for FilterIterator {
    fn next(&mut self) -> bool {
        while self.input.next() {
            if let Some(row) = self.input.row() {
                if self.expression.evaluate(row.as_value()) {
                    return true;
                }
            }
        }
        false
    }

    fn row(&self) -> Option<&Row> {
        self.input.row()
    }

    fn error(&self) -> Option<&QueryError> {
        self.input.error()
    }

    fn close(&mut self) -> QueryResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.input.close()
    }
}
