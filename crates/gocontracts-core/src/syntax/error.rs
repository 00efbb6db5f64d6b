//! Syntax errors reported for Go source

use thiserror::Error;

use super::span::Position;

/// What went wrong at a [`SyntaxError`]'s position
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    /// The parser had to assume a token or node that is not there.
    #[error("missing {0}")]
    Missing(String),

    /// Text the grammar could not place, starting with this token.
    #[error("unexpected {0}")]
    Unexpected(String),

    #[error("{0}")]
    Message(String),
}

/// A grammatical error in Go source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{pos}: {kind}")]
pub struct SyntaxError {
    pub pos: Position,
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub fn message(pos: Position, msg: impl Into<String>) -> Self {
        SyntaxError {
            pos,
            kind: SyntaxErrorKind::Message(msg.into()),
        }
    }
}
