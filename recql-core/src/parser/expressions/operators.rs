//! Comparison operator parsing.
//!
//! - Equality: `=`, `==`, `!=`, `<>`
//! - Relational: `<`, `<=`, `>`, `>=`
//! - Substring: `CONTAINS`, `~=`

use crate::compare::CompareOp;
use crate::lexer::Token;
use crate::parser::Parser;

impl Parser<'_> {
    /// Consume a comparison operator if one is next.
    pub(super) fn parse_comparison_operator(&mut self) -> Option<CompareOp> {
        let op = match self.current_token() {
            Token::Equal => CompareOp::Equal,
            Token::NotEqual => CompareOp::NotEqual,
            Token::LessThan => CompareOp::LessThan,
            Token::LessThanEq => CompareOp::LessThanOrEqual,
            Token::GreaterThan => CompareOp::GreaterThan,
            Token::GreaterThanEq => CompareOp::GreaterThanOrEqual,
            Token::Contains | Token::TildeEq => CompareOp::Contains,
            _ => return None,
        };
        self.advance();
        Some(op)
    }
}
