//! Boolean expression parsing: OR binds loosest, then AND, then a single
//! comparison or a parenthesized group.

mod operators;
mod primary;

use crate::ast::Expr;
use crate::error::QueryResult;
use crate::lexer::Token;
use crate::parser::Parser;

impl Parser<'_> {
    pub(crate) fn parse_expression(&mut self) -> QueryResult<Expr> {
        self.parse_or_expression()
    }

    fn parse_or_expression(&mut self) -> QueryResult<Expr> {
        let mut left = self.parse_and_expression()?;

        while *self.current_token() == Token::Or {
            self.advance();
            let right = self.parse_and_expression()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    fn parse_and_expression(&mut self) -> QueryResult<Expr> {
        let mut left = self.parse_condition()?;

        while *self.current_token() == Token::And {
            self.advance();
            let right = self.parse_condition()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    fn parse_condition(&mut self) -> QueryResult<Expr> {
        // `(SELECT ...)` is an operand, any other `(` opens a group
        if *self.current_token() == Token::LeftParen && *self.peek_token(1) != Token::Select {
            self.advance();
            let expr = self.parse_expression()?;
            self.expect(Token::RightParen, "')'")?;
            return Ok(expr);
        }

        let left = self.parse_operand()?;
        match self.parse_comparison_operator() {
            Some(op) => {
                let right = self.parse_operand()?;
                Ok(Expr::Comparison { left, op, right })
            }
            None => Ok(Expr::Operand(left)),
        }
    }
}
