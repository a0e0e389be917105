use crate::{common::Span, error::Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    Ident,
    Eof,

    // keywords
    Mut,
    Const,
    Null,
    True,
    False,
    If,
    Else,
    Elseif,
    Func,
    Return,

    // symbols
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,

    Comma,
    Dot,
    Colon,
    Semicolon,

    Equal,

    // binary operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // comparison operators
    Lesser,
    Greater,
    LesserEqual,
    GreaterEqual,
    EqualEqual,
    BangEqual,

    AndAnd,
    OrOr,
}

impl TokenKind {
    pub fn from_keyword_str(name: &str) -> Option<TokenKind> {
        match name {
            "mut" => Some(TokenKind::Mut),
            "const" => Some(TokenKind::Const),
            "null" => Some(TokenKind::Null),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "elseif" => Some(TokenKind::Elseif),
            "func" => Some(TokenKind::Func),
            "return" => Some(TokenKind::Return),
            _ => None,
        }
    }

    pub fn is_additive_op(&self) -> bool {
        matches!(*self, Self::Plus | Self::Minus)
    }

    pub fn is_multiplicative_op(&self) -> bool {
        matches!(*self, Self::Star | Self::Slash | Self::Percent)
    }

    pub fn is_comparative_op(&self) -> bool {
        matches!(
            *self,
            Self::Lesser
                | Self::Greater
                | Self::LesserEqual
                | Self::GreaterEqual
                | Self::EqualEqual
                | Self::BangEqual
        )
    }

    pub fn is_logical_op(&self) -> bool {
        matches!(*self, Self::AndAnd | Self::OrOr)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Token {
    pub fn error_at(&self, message: &str) -> Error {
        Error::syntax(message, self.span.clone())
    }

    /// Text used to name the token in diagnostics.
    pub fn describe(&self) -> String {
        if self.kind == TokenKind::Eof {
            "end of input".to_string()
        } else {
            format!("'{}'", self.value)
        }
    }
}
