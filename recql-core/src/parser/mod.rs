//! Recursive-descent parser for SELECT statements.
//!
//! ```text
//! Select      := SELECT SelectField (',' SelectField)*
//!                [FROM FromClause] [WHERE Expr] [GROUP BY Path]
//! SelectField := Expr [AS Ident]
//! FromClause  := Ident | '(' Select ')'
//! Expr        := OrCond (OR OrCond)*
//! OrCond      := AndCond (AND AndCond)*
//! AndCond     := '(' Expr ')' | Operand [CompareOp Operand]
//! Operand     := FuncCall | Literal | Path | '(' Select ')'
//! ```

mod expressions;


use crate::ast::{FromClause, SelectField, SelectStatement};
use crate::error::{QueryError, QueryResult};
use crate::lexer::{Lexer, Spanned, Token};

static EOF: Token = Token::Eof;

pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Spanned>,
    position: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> QueryResult<Self> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self {
            source: input,
            tokens,
            position: 0,
        })
    }

    pub(crate) fn current_token(&self) -> &Token {
        self.peek_token(0)
    }

    /// Token `n` places ahead; past the end this is `Eof`.
    pub(crate) fn peek_token(&self, n: usize) -> &Token {
        self.tokens
            .get(self.position + n)
            .or_else(|| self.tokens.last())
            .map_or(&EOF, |s| &s.token)
    }

    pub(crate) fn current_offset(&self) -> usize {
        self.tokens
            .get(self.position)
            .map_or(self.source.len(), |s| s.offset)
    }

    pub(crate) fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    pub(crate) fn error_here(&self, message: impl Into<String>) -> QueryError {
        QueryError::parse(self.source, self.current_offset(), message)
    }

    pub(crate) fn unexpected(&self, expected: &str) -> QueryError {
        match self.current_token() {
            Token::Eof => self.error_here(format!("expected {}, found end of input", expected)),
            other => self.error_here(format!("expected {}, found {:?}", expected, other)),
        }
    }

    pub(crate) fn expect(&mut self, expected: Token, description: &str) -> QueryResult<()> {
        if *self.current_token() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(description))
        }
    }

    fn expect_identifier(&mut self) -> QueryResult<String> {
        match self.current_token().clone() {
            Token::Identifier(name) | Token::QuotedIdentifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Parse a complete statement. An optional trailing `;` is accepted.
    pub fn parse(&mut self) -> QueryResult<SelectStatement> {
        let statement = self.parse_select()?;

        if *self.current_token() == Token::Semicolon {
            self.advance();
        }
        if *self.current_token() != Token::Eof {
            return Err(self.unexpected("end of query"));
        }

        Ok(statement)
    }

    pub(crate) fn parse_select(&mut self) -> QueryResult<SelectStatement> {
        self.expect(Token::Select, "SELECT")?;

        let mut fields = vec![self.parse_select_field()?];
        while *self.current_token() == Token::Comma {
            self.advance();
            fields.push(self.parse_select_field()?);
        }

        let from = if *self.current_token() == Token::From {
            self.advance();
            Some(self.parse_from_clause()?)
        } else {
            None
        };

        let where_clause = if *self.current_token() == Token::Where {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };

        let group_by = if *self.current_token() == Token::Group {
            self.advance();
            self.expect(Token::By, "BY after GROUP")?;
            Some(self.parse_path()?)
        } else {
            None
        };

        Ok(SelectStatement {
            fields,
            from,
            where_clause,
            group_by,
        })
    }

    fn parse_select_field(&mut self) -> QueryResult<SelectField> {
        let offset = self.current_offset();
        let expr = self.parse_expression()?;

        let alias = if *self.current_token() == Token::As {
            self.advance();
            Some(self.expect_identifier()?)
        } else {
            None
        };

        Ok(SelectField {
            expr,
            alias,
            offset,
        })
    }

    fn parse_from_clause(&mut self) -> QueryResult<FromClause> {
        if *self.current_token() == Token::LeftParen {
            self.advance();
            let subquery = self.parse_select()?;
            self.expect(Token::RightParen, "')' after subquery")?;
            return Ok(FromClause::Subquery(Box::new(subquery)));
        }

        if matches!(
            self.current_token(),
            Token::Identifier(_) | Token::QuotedIdentifier(_)
        ) {
            Ok(FromClause::Table(self.expect_identifier()?))
        } else {
            Err(self.unexpected("table name or subquery"))
        }
    }
}

/// Parse a SELECT statement into its syntax tree.
pub fn parse(input: &str) -> QueryResult<SelectStatement> {
    Parser::new(input)?.parse()
}
