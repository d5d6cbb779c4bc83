//! Per-group aggregate state.

use std::cmp::Ordering;

use serde_json::Value;

use crate::compare::{as_number, compare_values, number_from_f64};
use crate::query::AggregateFunction;

/// Running state of one aggregate function over one group.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Count(u64),
    Sum(f64),
    Avg { sum: f64, count: u64 },
    Max(Option<Value>),
    Min(Option<Value>),
}

impl Accumulator {
    pub fn new(function: AggregateFunction) -> Self {
        match function {
            AggregateFunction::Count => Accumulator::Count(0),
            AggregateFunction::Sum => Accumulator::Sum(0.0),
            AggregateFunction::Avg => Accumulator::Avg { sum: 0.0, count: 0 },
            AggregateFunction::Max => Accumulator::Max(None),
            AggregateFunction::Min => Accumulator::Min(None),
        }
    }

    /// Feed an extracted value. A sequence is flattened one level and each
    /// element contributes on its own.
    pub fn feed(&mut self, value: &Value) {
        match value {
            Value::Array(items) => items.iter().for_each(|item| self.feed_scalar(item)),
            other => self.feed_scalar(other),
        }
    }

    /// One contribution per row, for `COUNT(*)`.
    pub fn count_row(&mut self) {
        if let Accumulator::Count(n) = self {
            *n += 1;
        }
    }

    fn feed_scalar(&mut self, value: &Value) {
        if value.is_null() {
            return;
        }
        match self {
            Accumulator::Count(n) => *n += 1,
            Accumulator::Sum(sum) => {
                if let Some(x) = as_number(value) {
                    *sum += x;
                }
            }
            Accumulator::Avg { sum, count } => {
                if let Some(x) = as_number(value) {
                    *sum += x;
                    *count += 1;
                }
            }
            Accumulator::Max(best) => replace_if(best, value, Ordering::Greater),
            Accumulator::Min(best) => replace_if(best, value, Ordering::Less),
        }
    }

    /// Final value of the aggregate.
    pub fn result(&self) -> Value {
        match self {
            Accumulator::Count(n) => Value::from(*n),
            Accumulator::Sum(sum) => Value::Number(number_from_f64(*sum)),
            Accumulator::Avg { sum, count } => {
                let avg = if *count == 0 { 0.0 } else { sum / *count as f64 };
                Value::Number(number_from_f64(avg))
            }
            Accumulator::Max(best) | Accumulator::Min(best) => best.clone().unwrap_or(Value::Null),
        }
    }
}

fn replace_if(best: &mut Option<Value>, candidate: &Value, wanted: Ordering) {
    let replace = match best {
        None => true,
        Some(current) => compare_values(candidate, current) == wanted,
    };
    if replace {
        *best = Some(candidate.clone());
    }
}
