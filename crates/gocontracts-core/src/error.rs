//! Error types for contract maintenance
//!
//! All fallible operations return `Result<T, Error>`. Processing a file
//! stops at the first error; no partial result is ever produced.

use std::path::PathBuf;

use thiserror::Error;

use crate::body::BodyError;
use crate::doc::DocError;
use crate::syntax::SyntaxError;

/// gocontracts error types
#[derive(Debug, Error)]
pub enum Error {
    /// A function's documentation does not describe a valid contract
    #[error("failed to parse comments of the function {function} on line {line}: {source}")]
    Documentation {
        function: String,
        line: usize,
        source: DocError,
    },

    /// Previously generated blocks in a function body are malformed
    #[error(transparent)]
    Body(#[from] BodyError),

    /// The source file is not valid Go
    #[error("{file}:{source}")]
    Syntax { file: String, source: SyntaxError },

    /// Reading or writing a file failed
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Coarse classification of an [`Error`], stable for machine consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Documentation,
    Body,
    Syntax,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Documentation { .. } => ErrorKind::Documentation,
            Error::Body(_) => ErrorKind::Body,
            Error::Syntax { .. } => ErrorKind::Syntax,
            Error::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Documentation => "documentation",
            ErrorKind::Body => "body",
            ErrorKind::Syntax => "syntax",
            ErrorKind::Io => "io",
        };
        f.write_str(name)
    }
}

/// Result type alias for gocontracts operations
pub type Result<T> = std::result::Result<T, Error>;
