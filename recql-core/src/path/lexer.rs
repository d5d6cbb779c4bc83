//! Segment tokenizer for the path mini-language.
//!
//! A path is a `.`-separated list of segments. Each segment is scanned in
//! three states: the key part, an optional comparison operator, and the
//! comparand literal of an inline predicate. Dots only separate segments
//! outside of quoted literals and back-quoted keys, and a dot that continues
//! a numeric comparand (`value>20.5`) belongs to the literal.

use serde_json::Value;

use super::{Predicate, Segment};
use crate::compare::{number_from_f64, CompareOp};

pub(super) struct PathLexer<'a> {
    input: &'a str,
    chars: Vec<char>,
    position: usize,
}

impl<'a> PathLexer<'a> {
    pub(super) fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            position: 0,
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// Split the whole input into segments.
    pub(super) fn tokenize(mut self) -> Vec<Segment> {
        // One leading dot is the root marker (`.user.name`, `.`)
        if self.current() == Some('.') {
            self.advance();
        }

        let mut segments = Vec::new();
        while self.position < self.chars.len() {
            segments.push(self.read_segment());
            // Consume the separator
            if self.current() == Some('.') {
                self.advance();
            }
        }

        tracing::trace!(path = self.input, count = segments.len(), "tokenized path");
        segments
    }

    fn read_segment(&mut self) -> Segment {
        let head = self.read_head();

        match self.read_operator() {
            Some(op) => {
                let literal = self.read_literal();
                let predicate = Predicate { op, literal };
                if is_wildcard(&head) {
                    Segment::Wildcard(Some(predicate))
                } else {
                    Segment::Filter {
                        field: head,
                        predicate,
                    }
                }
            }
            None if is_wildcard(&head) => Segment::Wildcard(None),
            None => Segment::Key(head),
        }
    }

    /// Key part: up to a separator or the start of an operator.
    fn read_head(&mut self) -> String {
        if self.current() == Some('`') {
            self.advance();
            let mut key = String::new();
            while let Some(ch) = self.current() {
                self.advance();
                if ch == '`' {
                    break;
                }
                key.push(ch);
            }
            return key;
        }

        let mut head = String::new();
        while let Some(ch) = self.current() {
            if ch == '.' || self.operator_at_cursor().is_some() {
                break;
            }
            head.push(ch);
            self.advance();
        }
        head
    }

    /// Operator starting at the cursor, with its length in chars.
    fn operator_at_cursor(&self) -> Option<(CompareOp, usize)> {
        let two: String = [self.current(), self.peek(1)].iter().flatten().collect();
        if two.chars().count() == 2 {
            if let Some(op) = CompareOp::from_symbol(&two) {
                return Some((op, 2));
            }
        }
        match self.current() {
            Some(ch @ ('=' | '>' | '<')) => {
                CompareOp::from_symbol(&ch.to_string()).map(|op| (op, 1))
            }
            _ => None,
        }
    }

    fn read_operator(&mut self) -> Option<CompareOp> {
        let (op, len) = self.operator_at_cursor()?;
        self.position += len;
        Some(op)
    }

    fn read_literal(&mut self) -> Value {
        match self.current() {
            Some(quote @ ('\'' | '"')) => {
                self.advance();
                let mut text = String::new();
                while let Some(ch) = self.current() {
                    self.advance();
                    if ch == quote {
                        break;
                    }
                    text.push(ch);
                }
                // Anything between the closing quote and the separator is dropped
                while let Some(ch) = self.current() {
                    if ch == '.' {
                        break;
                    }
                    self.advance();
                }
                Value::String(text)
            }
            _ => {
                let mut text = String::new();
                while let Some(ch) = self.current() {
                    if ch == '.' {
                        let continues_number = is_numeric_prefix(&text)
                            && self.peek(1).is_some_and(|c| c.is_ascii_digit());
                        if !continues_number {
                            break;
                        }
                    }
                    text.push(ch);
                    self.advance();
                }
                bare_literal(&text)
            }
        }
    }
}

fn is_wildcard(head: &str) -> bool {
    head == "*" || head == "%"
}

fn is_numeric_prefix(text: &str) -> bool {
    let digits = text.strip_prefix(&['-', '+'][..]).unwrap_or(text);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Type an unquoted comparand: numbers and booleans are recognised, anything
/// else is a string.
pub(crate) fn bare_literal(text: &str) -> Value {
    if let Ok(n) = text.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(f) = text.parse::<f64>() {
        if f.is_finite() {
            return Value::Number(number_from_f64(f));
        }
    }
    match text {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(text.to_string()),
    }
}
