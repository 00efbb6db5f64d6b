//! The parts of a Go file contract maintenance works with
//!
//! Only text is ever edited, so nodes record where things are rather
//! than what they contain: function bodies are lists of top-level
//! statements with their spans, and only `if` statements keep the
//! layout of their header.

use super::span::{LineIndex, Span};

// ── Source file ────────────────────────────────────────────

/// A parsed Go source file
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    /// Top-level function and method declarations in source order.
    pub functions: Vec<FuncDecl>,
    /// All comment groups of the file in source order.
    pub comments: Vec<CommentGroup>,
    pub lines: LineIndex,
}

impl SourceFile {
    pub fn functions(&self) -> impl Iterator<Item = &FuncDecl> {
        self.functions.iter()
    }

    /// Comment groups lying entirely inside `span`.
    pub fn comments_within(&self, span: Span) -> impl Iterator<Item = &CommentGroup> {
        self.comments
            .iter()
            .filter(move |group| span.start <= group.span().start && group.span().end <= span.end)
    }

    pub fn line_of(&self, offset: usize) -> usize {
        self.lines.line_of(offset)
    }
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: String,
    /// From the `func` keyword to the end of the body or signature.
    pub span: Span,
    pub line: usize,
    pub doc: Option<CommentGroup>,
    /// `None` for functions implemented outside Go.
    pub body: Option<Block>,
}

/// A brace-delimited statement list
#[derive(Debug, Clone)]
pub struct Block {
    /// Offset of `{`.
    pub lbrace: usize,
    /// Offset of `}`.
    pub rbrace: usize,
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn span(&self) -> Span {
        Span::new(self.lbrace, self.rbrace + 1)
    }
}

// ── Statements ─────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Stmt {
    pub span: Span,
    pub kind: StmtKind,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    If(IfStmt),
    /// Expression or type switch.
    Switch,
    Select,
    For,
    Defer,
    Go,
    Return,
    Block,
    Labeled,
    /// `var`, `const` or `type`.
    Decl,
    /// `break`, `continue`, `goto` or `fallthrough`.
    Branch,
    Empty,
    /// Expression, send, inc/dec, assignment or short variable declaration.
    Simple,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub init: Option<Span>,
    pub cond: Expr,
    /// The block executed when the condition holds.
    pub consequence: Span,
    pub has_else: bool,
}

// ── Expressions ────────────────────────────────────────────

/// An expression, seen only as deep as negating it requires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    /// An identifier or a predeclared constant such as `true`.
    Ident,
    /// `(x)`, holding the span of `x`.
    Paren(Span),
    /// `!x`: the span of `x`, and of its contents if `x` is parenthesized.
    Not { operand: Span, unparen: Span },
    Other,
}

// ── Comments ───────────────────────────────────────────────

/// A single `//` or `/* */` comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub span: Span,
    pub line: usize,
    pub end_line: usize,
    /// Raw text including the comment markers.
    pub text: String,
}

/// One line of comment text with its markers removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentLine {
    pub line: usize,
    pub text: String,
}

/// Comments with no token or blank line between them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentGroup {
    pub comments: Vec<Comment>,
    /// The group starts on the line of a preceding token.
    pub trailing: bool,
}

impl CommentGroup {
    pub fn new(comments: Vec<Comment>, trailing: bool) -> Self {
        CommentGroup { comments, trailing }
    }

    pub fn span(&self) -> Span {
        let start = self.comments.first().map_or(0, |c| c.span.start);
        let end = self.comments.last().map_or(start, |c| c.span.end);
        Span::new(start, end)
    }

    pub fn line(&self) -> usize {
        self.comments.first().map_or(0, |c| c.line)
    }

    pub fn end_line(&self) -> usize {
        self.comments.last().map_or(0, |c| c.end_line)
    }

    /// Marker-stripped lines, exactly one per source line.
    ///
    /// A single space after `//` is removed and trailing whitespace is
    /// trimmed. Tool directives such as `//go:generate` are skipped.
    pub fn lines(&self) -> Vec<CommentLine> {
        let mut lines = Vec::new();
        for comment in &self.comments {
            if let Some(body) = comment.text.strip_prefix("//") {
                if is_directive(body) {
                    continue;
                }
                let body = body.strip_prefix(' ').unwrap_or(body);
                lines.push(CommentLine {
                    line: comment.line,
                    text: body.trim_end().to_string(),
                });
            } else {
                let body = comment
                    .text
                    .strip_prefix("/*")
                    .and_then(|b| b.strip_suffix("*/"))
                    .unwrap_or(&comment.text);
                for (i, part) in body.split('\n').enumerate() {
                    lines.push(CommentLine {
                        line: comment.line + i,
                        text: part.trim_end().to_string(),
                    });
                }
            }
        }
        lines
    }

    /// The text of the group as `go/ast` renders it: leading blank lines
    /// dropped, runs of blank lines collapsed to one, and a final line
    /// break when the text is non-empty.
    pub fn text(&self) -> String {
        let mut kept: Vec<String> = Vec::new();
        for line in self.lines() {
            if !line.text.is_empty() || kept.last().is_some_and(|prev| !prev.is_empty()) {
                kept.push(line.text);
            }
        }
        if kept.last().is_some_and(|last| last.is_empty()) {
            kept.pop();
        }
        if kept.is_empty() {
            return String::new();
        }
        kept.push(String::new());
        kept.join("\n")
    }
}

/// `//go:generate`-style directives: no space after `//`, a lower-case
/// word, a colon and a lower-case letter or digit.
fn is_directive(body: &str) -> bool {
    let Some((word, rest)) = body.split_once(':') else {
        return false;
    };
    !word.is_empty()
        && word.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        && rest.bytes().next().is_some_and(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}
