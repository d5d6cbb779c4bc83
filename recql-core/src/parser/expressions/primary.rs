//! Operand parsing: literals, paths, function calls and subqueries.

use crate::ast::{FuncCall, Literal, Operand, PathExpr, PathSegment};
use crate::error::QueryResult;
use crate::lexer::Token;
use crate::parser::Parser;

impl Parser<'_> {
    pub(crate) fn parse_operand(&mut self) -> QueryResult<Operand> {
        match self.current_token().clone() {
            Token::LeftParen if *self.peek_token(1) == Token::Select => {
                self.advance();
                let subquery = self.parse_select()?;
                self.expect(Token::RightParen, "')' after subquery")?;
                Ok(Operand::Subquery(Box::new(subquery)))
            }

            Token::Integer(n) => {
                self.advance();
                Ok(Operand::Literal(Literal::Integer(n)))
            }
            Token::Float(f) => {
                self.advance();
                Ok(Operand::Literal(Literal::Float(f)))
            }
            Token::String(s) => {
                self.advance();
                Ok(Operand::Literal(Literal::String(s)))
            }
            Token::True => {
                self.advance();
                Ok(Operand::Literal(Literal::Bool(true)))
            }
            Token::False => {
                self.advance();
                Ok(Operand::Literal(Literal::Bool(false)))
            }

            Token::Identifier(name) if *self.peek_token(1) == Token::LeftParen => {
                self.parse_function_call(name)
            }

            Token::Identifier(_)
            | Token::QuotedIdentifier(_)
            | Token::Star
            | Token::Percent
            | Token::Dot => Ok(Operand::Path(self.parse_path()?)),

            _ => Err(self.unexpected("operand")),
        }
    }

    fn parse_function_call(&mut self, name: String) -> QueryResult<Operand> {
        let offset = self.current_offset();
        self.advance(); // name
        self.advance(); // (

        let mut args = vec![self.parse_operand()?];
        while *self.current_token() == Token::Comma {
            self.advance();
            args.push(self.parse_operand()?);
        }
        self.expect(Token::RightParen, "')' after function arguments")?;

        Ok(Operand::Function(FuncCall { name, args, offset }))
    }

    /// `[.] segment (. segment)*` where a segment is an identifier, `*`, `%`
    /// or, after a dot, an array index. A lone `.` is the root path.
    pub(crate) fn parse_path(&mut self) -> QueryResult<PathExpr> {
        let offset = self.current_offset();
        let mut segments = Vec::new();

        let leading_dot = *self.current_token() == Token::Dot;
        if leading_dot {
            self.advance();
        }

        match self.parse_path_segment(leading_dot) {
            Some(segment) => segments.push(segment),
            None if leading_dot => return Ok(PathExpr { segments, offset }),
            None => return Err(self.unexpected("path")),
        }

        while *self.current_token() == Token::Dot {
            self.advance();
            match self.parse_path_segment(true) {
                Some(segment) => segments.push(segment),
                None => return Err(self.unexpected("path segment after '.'")),
            }
        }

        Ok(PathExpr { segments, offset })
    }

    fn parse_path_segment(&mut self, allow_index: bool) -> Option<PathSegment> {
        let segment = match self.current_token() {
            Token::Identifier(key) | Token::QuotedIdentifier(key) => PathSegment::Key(key.clone()),
            Token::Star | Token::Percent => PathSegment::Wildcard,
            Token::Integer(n) if allow_index && *n >= 0 => PathSegment::Index(*n as usize),
            _ => return None,
        };
        self.advance();
        Some(segment)
    }
}
