//! Go syntax: the owned model contract maintenance works on
//!
//! Contract maintenance consumes the subject language through the
//! [`SourceParser`] trait, which yields functions, their bodies and the
//! file's comments with byte spans into the original text. [`GoParser`]
//! implements it over tree-sitter-go.

mod ast;
mod error;
mod go;
mod span;

pub use ast::{
    Block, Comment, CommentGroup, CommentLine, Expr, ExprKind, FuncDecl, IfStmt, SourceFile, Stmt, StmtKind,
};
pub use error::{SyntaxError, SyntaxErrorKind};
pub use go::GoParser;
pub use span::{LineIndex, Position, Span};

/// Parses Go source text into a [`SourceFile`]
pub trait SourceParser {
    /// Parse a complete file including its comments.
    ///
    /// # Errors
    /// Returns the first syntax error in source order.
    fn parse_file(&self, name: &str, text: &str) -> Result<SourceFile, SyntaxError>;
}
