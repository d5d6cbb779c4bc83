//! Tokenizer for the SELECT statement language.

use crate::error::{QueryError, QueryResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Select,
    From,
    Where,
    Group,
    By,
    As,
    And,
    Or,
    Contains,
    True,
    False,

    // Literals and identifiers
    Identifier(String),
    QuotedIdentifier(String), // `...`
    Integer(i64),
    Float(f64),
    String(String),

    // Operators
    Equal,         // = or ==
    NotEqual,      // != or <>
    LessThan,      // <
    LessThanEq,    // <=
    GreaterThan,   // >
    GreaterThanEq, // >=
    TildeEq,       // ~=
    Star,          // *
    Percent,       // %

    // Delimiters
    Comma,      // ,
    Dot,        // .
    LeftParen,  // (
    RightParen, // )
    Semicolon,  // ;

    Eof,
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub struct Lexer<'a> {
    source: &'a str,
    input: Vec<(usize, char)>,
    position: usize,
    current_char: Option<char>,
    after_dot: bool,
    /// Byte offset just past the previous token.
    prev_end: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let input: Vec<(usize, char)> = source.char_indices().collect();
        let current_char = input.first().map(|(_, c)| *c);

        Self {
            source,
            input,
            position: 0,
            current_char,
            after_dot: false,
            prev_end: 0,
        }
    }

    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.input.get(self.position).map(|(_, c)| *c);
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).map(|(_, c)| *c)
    }

    /// Byte offset of the cursor.
    fn offset(&self) -> usize {
        self.input
            .get(self.position)
            .map_or(self.source.len(), |(i, _)| *i)
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> QueryError {
        QueryError::parse(self.source, offset, message)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.current_char {
            self.advance();
            if ch == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance(); // skip /
        self.advance(); // skip *
        while let Some(ch) = self.current_char {
            if ch == '*' && self.peek() == Some('/') {
                self.advance();
                self.advance();
                break;
            }
            self.advance();
        }
    }

    fn read_number(&mut self) -> QueryResult<Token> {
        let start = self.offset();
        let mut num_str = String::new();
        let mut has_dot = false;

        if self.current_char == Some('-') {
            num_str.push('-');
            self.advance();
        }

        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() {
                num_str.push(ch);
                self.advance();
            } else if ch == '.' && !has_dot && !self.after_dot {
                // `tags.0.name` keeps the index an integer
                if self.peek().is_some_and(|next| next.is_ascii_digit()) {
                    has_dot = true;
                    num_str.push(ch);
                    self.advance();
                } else {
                    break;
                }
            } else {
                break;
            }
        }

        if has_dot {
            num_str
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| self.error(start, format!("invalid number '{}'", num_str)))
        } else {
            num_str
                .parse::<i64>()
                .map(Token::Integer)
                .map_err(|_| self.error(start, format!("invalid number '{}'", num_str)))
        }
    }

    fn read_string(&mut self, quote: char) -> QueryResult<Token> {
        let start = self.offset();
        self.advance(); // opening quote

        let mut string = String::new();
        while let Some(ch) = self.current_char {
            if ch == quote {
                // Doubled quote is an escaped quote
                if self.peek() == Some(quote) {
                    string.push(quote);
                    self.advance();
                    self.advance();
                } else {
                    self.advance();
                    return Ok(Token::String(string));
                }
            } else if ch == '\\' {
                self.advance();
                if let Some(escaped) = self.current_char {
                    string.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                    self.advance();
                }
            } else {
                string.push(ch);
                self.advance();
            }
        }

        Err(self.error(start, "unterminated string"))
    }

    fn read_identifier(&mut self) -> Token {
        // `msg.from` names a field, not the FROM keyword
        let path_segment = self.after_dot && self.offset() == self.prev_end;
        let mut ident = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if path_segment {
            return Token::Identifier(ident);
        }

        // Keywords are case-insensitive
        match ident.to_uppercase().as_str() {
            "SELECT" => Token::Select,
            "FROM" => Token::From,
            "WHERE" => Token::Where,
            "GROUP" => Token::Group,
            "BY" => Token::By,
            "AS" => Token::As,
            "AND" => Token::And,
            "OR" => Token::Or,
            "CONTAINS" => Token::Contains,
            "TRUE" => Token::True,
            "FALSE" => Token::False,
            _ => Token::Identifier(ident),
        }
    }

    fn read_quoted_identifier(&mut self) -> QueryResult<Token> {
        let start = self.offset();
        self.advance(); // opening backtick

        let mut ident = String::new();
        while let Some(ch) = self.current_char {
            self.advance();
            if ch == '`' {
                return Ok(Token::QuotedIdentifier(ident));
            }
            ident.push(ch);
        }

        Err(self.error(start, "unterminated quoted identifier"))
    }

    fn next_token(&mut self) -> QueryResult<Spanned> {
        loop {
            self.skip_whitespace();

            match self.current_char {
                Some('-') if self.peek() == Some('-') => self.skip_line_comment(),
                Some('/') if self.peek() == Some('*') => self.skip_block_comment(),
                _ => break,
            }
        }

        let offset = self.offset();
        let token = match self.current_char {
            None => Token::Eof,

            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some('-') if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_number()?,

            Some(quote @ ('\'' | '"')) => self.read_string(quote)?,
            Some('`') => self.read_quoted_identifier()?,

            Some(ch) if ch.is_alphabetic() || ch == '_' || ch == '$' => self.read_identifier(),

            Some('=') => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                }
                Token::Equal
            }

            Some('!') if self.peek() == Some('=') => {
                self.advance();
                self.advance();
                Token::NotEqual
            }

            Some('~') if self.peek() == Some('=') => {
                self.advance();
                self.advance();
                Token::TildeEq
            }

            Some('<') => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::LessThanEq
                } else if self.current_char == Some('>') {
                    self.advance();
                    Token::NotEqual
                } else {
                    Token::LessThan
                }
            }

            Some('>') => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::GreaterThanEq
                } else {
                    Token::GreaterThan
                }
            }

            Some(ch) => {
                let token = match ch {
                    '*' => Token::Star,
                    '%' => Token::Percent,
                    ',' => Token::Comma,
                    '.' => Token::Dot,
                    '(' => Token::LeftParen,
                    ')' => Token::RightParen,
                    ';' => Token::Semicolon,
                    other => {
                        return Err(self.error(offset, format!("unexpected character '{}'", other)));
                    }
                };
                self.advance();
                token
            }
        };

        Ok(Spanned { token, offset })
    }

    /// Tokenize the whole input. The last token is always `Eof`.
    pub fn tokenize(mut self) -> QueryResult<Vec<Spanned>> {
        let mut tokens = Vec::new();

        loop {
            let spanned = self.next_token()?;
            self.after_dot = spanned.token == Token::Dot;
            self.prev_end = self.offset();
            let is_eof = spanned.token == Token::Eof;
            tokens.push(spanned);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }
}
