use crate::{
    common::Span,
    error::{Error, Result},
    token::{Token, TokenKind},
};

use unicode_xid::UnicodeXID;

#[derive(Debug, Clone)]
pub struct Lexer {
    source: Vec<char>,

    start: usize,
    current: usize,
}

impl Lexer {
    pub fn from_str(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            start: 0,
            current: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) {
        self.current += 1;
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.current).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.source.get(self.current + 1).copied()
    }

    fn get_span(&self) -> Span {
        self.start..self.current
    }

    fn create_token(&self, kind: TokenKind) -> Token {
        Token {
            kind,
            value: self.source[self.start..self.current].iter().collect(),
            span: self.get_span(),
        }
    }

    /// Emits `double` when the next char is `second`, `single` otherwise.
    fn lex_pair(&mut self, second: char, double: TokenKind, single: TokenKind) -> Token {
        if self.peek() == Some(second) {
            self.advance();
            self.create_token(double)
        } else {
            self.create_token(single)
        }
    }

    /// Like `lex_pair`, but the first char is meaningless on its own.
    fn lex_required_pair(&mut self, first: char, second: char, double: TokenKind) -> Result<Token> {
        if self.peek() == Some(second) {
            self.advance();
            Ok(self.create_token(double))
        } else {
            Err(Error::lexical(
                format!("unrecognized character '{}', expected '{}{}'", first, first, second),
                self.get_span(),
            ))
        }
    }

    fn lex_number(&mut self) -> Token {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }

        // a dot only belongs to the literal when a fraction follows it
        if self.peek() == Some('.') && matches!(self.peek_next(), Some(c) if c.is_ascii_digit()) {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }

        self.create_token(TokenKind::Number)
    }

    fn lex_ident(&mut self) -> Token {
        while matches!(self.peek(), Some(c) if c.is_xid_continue()) {
            self.advance();
        }

        let lexeme = self.source[self.start..self.current].iter().collect::<String>();

        self.create_token(
            if let Some(keyword_kind) = TokenKind::from_keyword_str(&lexeme) {
                keyword_kind
            } else {
                TokenKind::Ident
            },
        )
    }

    pub fn lex(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek() {
            self.advance();

            match c {
                '(' => tokens.push(self.create_token(TokenKind::LeftParen)),
                ')' => tokens.push(self.create_token(TokenKind::RightParen)),
                '{' => tokens.push(self.create_token(TokenKind::LeftBrace)),
                '}' => tokens.push(self.create_token(TokenKind::RightBrace)),
                '[' => tokens.push(self.create_token(TokenKind::LeftBracket)),
                ']' => tokens.push(self.create_token(TokenKind::RightBracket)),
                ',' => tokens.push(self.create_token(TokenKind::Comma)),
                '.' => tokens.push(self.create_token(TokenKind::Dot)),
                ':' => tokens.push(self.create_token(TokenKind::Colon)),
                ';' => tokens.push(self.create_token(TokenKind::Semicolon)),

                '+' => tokens.push(self.create_token(TokenKind::Plus)),
                '-' => tokens.push(self.create_token(TokenKind::Minus)),
                '*' => tokens.push(self.create_token(TokenKind::Star)),
                '%' => tokens.push(self.create_token(TokenKind::Percent)),
                '/' => {
                    if self.peek() == Some('/') {
                        while !self.at_end() && self.peek() != Some('\n') {
                            self.advance();
                        }
                    } else {
                        tokens.push(self.create_token(TokenKind::Slash))
                    }
                }

                '=' => tokens.push(self.lex_pair('=', TokenKind::EqualEqual, TokenKind::Equal)),
                '<' => tokens.push(self.lex_pair('=', TokenKind::LesserEqual, TokenKind::Lesser)),
                '>' => tokens.push(self.lex_pair('=', TokenKind::GreaterEqual, TokenKind::Greater)),
                '!' => tokens.push(self.lex_required_pair('!', '=', TokenKind::BangEqual)?),
                '&' => tokens.push(self.lex_required_pair('&', '&', TokenKind::AndAnd)?),
                '|' => tokens.push(self.lex_required_pair('|', '|', TokenKind::OrOr)?),

                ' ' | '\t' | '\n' | '\r' => {
                    // do nothing
                }

                _ => {
                    if c.is_ascii_digit() {
                        tokens.push(self.lex_number())
                    } else if c == '_' || c.is_xid_start() {
                        tokens.push(self.lex_ident())
                    } else {
                        return Err(Error::lexical(
                            format!("unrecognized character '{}'", c),
                            self.get_span(),
                        ));
                    }
                }
            };

            self.start = self.current;
        }

        let end = self.source.len();
        tokens.push(Token {
            kind: TokenKind::Eof,
            value: String::new(),
            span: end..end,
        });

        tracing::debug!(count = tokens.len(), "tokenized source");

        Ok(tokens)
    }
}

/// Converts source text into tokens, always terminated by `TokenKind::Eof`.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::from_str(source).lex()
}
