use colored::Colorize;
use thiserror::Error as ThisError;

use crate::{
    common::{line_text, Location, Span},
    value::ValueKind,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can abort tokenizing, parsing or evaluating a program.
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum Error {
    #[error("{message}")]
    Lexical { message: String, span: Span },

    #[error("{message}")]
    Syntax { message: String, span: Span },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum RuntimeError {
    #[error("cannot resolve variable '{0}'")]
    UnresolvedVariable(String),

    #[error("cannot redeclare variable '{0}' in the same scope")]
    Redeclaration(String),

    #[error("cannot reassign constant '{0}'")]
    ConstantAssignment(String),

    #[error("'{name}' expects {expected} argument(s) but was called with {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("a {0} value is not callable")]
    NotCallable(ValueKind),

    #[error("cannot access a member of a {0} value")]
    NotAnObject(ValueKind),

    #[error("a computed member key must be a number, found {0}")]
    InvalidMemberKey(ValueKind),

    #[error("dotted member access needs an identifier field")]
    InvalidMemberField,

    #[error("only identifiers can be assigned to")]
    InvalidAssignmentTarget,

    #[error("branch condition must be a boolean, found {0}")]
    NonBooleanCondition(ValueKind),

    #[error("modulo by zero")]
    ModuloByZero,

    #[error("maximum call depth of {0} exceeded")]
    RecursionLimit(usize),

    #[error("function '{0}' was called after its declaring scope was dropped")]
    DroppedScope(String),

    #[error("failed to write output: {0}")]
    Output(String),
}

impl Error {
    pub fn lexical(message: impl Into<String>, span: Span) -> Self {
        Error::Lexical {
            message: message.into(),
            span,
        }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Error::Syntax {
            message: message.into(),
            span,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Error::Lexical { .. } => "Lexical Error",
            Error::Syntax { .. } => "Syntax Error",
            Error::Runtime(_) => "Runtime Error",
        }
    }

    pub fn span(&self) -> Option<&Span> {
        match self {
            Error::Lexical { span, .. } | Error::Syntax { span, .. } => Some(span),
            Error::Runtime(_) => None,
        }
    }

    /// Formats the error for a terminal, pointing at the offending source when
    /// the error carries a span.
    pub fn render(&self, source: &str) -> String {
        let mut out = format!("{}: {}\n", self.title().red().bold(), self.to_string().bold());

        if let Some(span) = self.span() {
            let location = Location::of(source, span.start);
            out.push_str(&format!("  {} {}\n", "-->".bright_blue(), location));

            if let Some(text) = line_text(source, location.line) {
                let width = span.end.saturating_sub(span.start).max(1);
                out.push_str(&format!("   {}\n", "|".bright_blue()));
                out.push_str(&format!(
                    "{} {} {}\n",
                    format!("{:3}", location.line).bright_blue(),
                    "|".bright_blue(),
                    text
                ));
                out.push_str(&format!(
                    "   {} {}{}\n",
                    "|".bright_blue(),
                    " ".repeat(location.column - 1),
                    "^".repeat(width).red().bold()
                ));
            }
        }

        out
    }
}
