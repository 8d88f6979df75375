use std::result;

use thiserror::Error;

use crate::token::{Token, TokenKind};

pub type Result<T> = result::Result<T, Error>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LexicalError {
    UnrecognizedCharacter,
    UnterminatedString,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyntaxError {
    UnexpectedToken,
    MissingExpectedToken,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuntimeError {
    UndefinedVariable,
    TypeError,
    ArityMismatch,
    UncallableValue,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("[line {line}:{column}] Error: {message}")]
    Lexical {
        kind: LexicalError,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("[line {}:{}] Error{}: {message}", .token.line, .token.column, location(.token))]
    Syntactic {
        kind: SyntaxError,
        token: Token,
        message: String,
    },
    #[error("[line {}:{}] Error{}: {message}", .token.line, .token.column, location(.token))]
    Runtime {
        kind: RuntimeError,
        token: Token,
        message: String,
    },
    #[error("Internal error: {0}")]
    Internal(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn lexical<S: Into<String>>(kind: LexicalError, line: usize, column: usize, message: S) -> Error {
        Error::Lexical { kind, line, column, message: message.into() }
    }

    pub fn syntactic<S: Into<String>>(kind: SyntaxError, token: Token, message: S) -> Error {
        Error::Syntactic { kind, token, message: message.into() }
    }

    pub fn runtime<S: Into<String>>(kind: RuntimeError, token: Token, message: S) -> Error {
        Error::Runtime { kind, token, message: message.into() }
    }

    pub fn internal<S: Into<String>>(message: S) -> Error {
        Error::Internal(message.into())
    }

    pub fn is_runtime_error(&self) -> bool {
        matches!(self, Error::Runtime { .. })
    }

    pub fn line(&self) -> usize {
        match self {
            Error::Lexical { line, .. } => *line,
            Error::Syntactic { token, .. } | Error::Runtime { token, .. } => token.line,
            Error::Internal(_) | Error::Io(_) => 0,
        }
    }

    pub fn runtime_kind(&self) -> Option<RuntimeError> {
        match self {
            Error::Runtime { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn syntax_kind(&self) -> Option<SyntaxError> {
        match self {
            Error::Syntactic { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn lexical_kind(&self) -> Option<LexicalError> {
        match self {
            Error::Lexical { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

fn location(token: &Token) -> String {
    if token.kind == TokenKind::EndOfFile {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}
