//! Go source through tree-sitter
//!
//! tree-sitter-go builds the concrete syntax tree; this module lowers the
//! parts contract maintenance needs into the owned model of [`super::ast`].
//! Byte offsets come straight from `Node::start_byte`/`end_byte`.
//!
//! # Guarantees
//! - Only function bodies and `if` headers are lowered, never whole
//!   expressions, and every traversal is iterative, so nesting depth
//!   cannot exhaust the stack
//! - A tree containing any error or missing node is rejected with the
//!   position of the first one in source order

use tree_sitter::{Node, Tree};

use super::ast::{Block, Comment, CommentGroup, Expr, ExprKind, FuncDecl, IfStmt, SourceFile, Stmt, StmtKind};
use super::error::{SyntaxError, SyntaxErrorKind};
use super::span::{LineIndex, Position, Span};
use super::SourceParser;

/// Go parser backed by tree-sitter-go
#[derive(Debug, Clone, Copy, Default)]
pub struct GoParser;

impl SourceParser for GoParser {
    fn parse_file(&self, name: &str, text: &str) -> Result<SourceFile, SyntaxError> {
        let tree = parse_tree(text)?;
        let lines = LineIndex::new(text);
        let root = tree.root_node();
        if root.has_error() {
            return Err(first_error(root, text, &lines));
        }

        let comments = group_comments(collect_comments(root, text, &lines), text);
        let mut functions = Vec::new();
        for node in root.named_children(&mut root.walk()) {
            if matches!(node.kind(), "function_declaration" | "method_declaration") {
                functions.push(lower_function(node, text, &lines, &comments));
            }
        }

        tracing::trace!(file = name, functions = functions.len(), comments = comments.len(), "parsed Go source");
        Ok(SourceFile {
            name: name.to_string(),
            functions,
            comments,
            lines,
        })
    }
}

fn parse_tree(text: &str) -> Result<Tree, SyntaxError> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| SyntaxError::message(Position::START, format!("failed to load the Go grammar: {}", e)))?;
    parser
        .parse(text, None)
        .ok_or_else(|| SyntaxError::message(Position::START, "the Go parser gave up"))
}

// ── Traversal ──────────────────────────────────────────────

enum Walk {
    Descend,
    Skip,
    Stop,
}

/// Preorder walk over `root` and its descendants without recursion.
fn walk<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>) -> Walk) {
    let mut cursor = root.walk();
    loop {
        match visit(cursor.node()) {
            Walk::Stop => return,
            Walk::Descend if cursor.goto_first_child() => continue,
            _ => {}
        }
        loop {
            if cursor.node() == root {
                return;
            }
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

// ── Errors ─────────────────────────────────────────────────

fn first_error(root: Node, text: &str, lines: &LineIndex) -> SyntaxError {
    let mut found = None;
    walk(root, |node| {
        if node.is_missing() || node.is_error() {
            found = Some(node);
            Walk::Stop
        } else if node.has_error() {
            Walk::Descend
        } else {
            Walk::Skip
        }
    });

    let Some(node) = found else {
        return SyntaxError::message(Position::START, "syntax error");
    };
    if node.is_missing() {
        return SyntaxError {
            pos: lines.position(node.start_byte()),
            kind: SyntaxErrorKind::Missing(describe(node)),
        };
    }

    let mut leaf = node;
    while let Some(child) = leaf.child(0) {
        leaf = child;
    }
    SyntaxError {
        pos: lines.position(leaf.start_byte()),
        kind: SyntaxErrorKind::Unexpected(token_text(&text[leaf.start_byte()..leaf.end_byte()])),
    }
}

/// `'}'` for punctuation and keywords, `identifier` for named nodes.
fn describe(node: Node) -> String {
    if node.is_named() {
        node.kind().replace('_', " ")
    } else {
        format!("'{}'", node.kind())
    }
}

fn token_text(text: &str) -> String {
    match text {
        "" | "\0" => "EOF".to_string(),
        "\n" | "\r\n" => "newline".to_string(),
        _ => {
            let first_line = text.lines().next().unwrap_or(text);
            format!("'{}'", first_line.trim_end())
        }
    }
}

// ── Comments ───────────────────────────────────────────────

fn collect_comments(root: Node, text: &str, lines: &LineIndex) -> Vec<Comment> {
    let mut comments = Vec::new();
    walk(root, |node| {
        if node.kind() == "comment" {
            let span = Span::new(node.start_byte(), node.end_byte());
            comments.push(Comment {
                span,
                line: lines.line_of(span.start),
                end_line: lines.line_of(span.end.saturating_sub(1).max(span.start)),
                text: span.slice(text).trim_end_matches('\r').to_string(),
            });
            Walk::Skip
        } else {
            Walk::Descend
        }
    });
    comments
}

/// Groups comments the way `go/parser` does: adjacent lines with nothing
/// but whitespace between them. A group that starts after a token on the
/// same line only collects comments on that line.
fn group_comments(comments: Vec<Comment>, text: &str) -> Vec<CommentGroup> {
    let mut groups = Vec::new();
    let mut pending: Vec<Comment> = Vec::new();
    let mut trailing = false;

    for comment in comments {
        if let Some(last) = pending.last() {
            let reach = if trailing { 0 } else { 1 };
            let between = &text[last.span.end..comment.span.start];
            if between.trim().is_empty() && comment.line <= last.end_line + reach {
                pending.push(comment);
                continue;
            }
            groups.push(CommentGroup::new(std::mem::take(&mut pending), trailing));
        }
        trailing = follows_token(text, comment.span.start);
        pending.push(comment);
    }
    if !pending.is_empty() {
        groups.push(CommentGroup::new(pending, trailing));
    }
    groups
}

fn follows_token(text: &str, offset: usize) -> bool {
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    !text[line_start..offset].trim().is_empty()
}

/// The group directly above `func`, as `go/parser` attaches lead comments.
fn doc_comment(comments: &[CommentGroup], text: &str, start: usize, line: usize) -> Option<CommentGroup> {
    comments
        .iter()
        .rev()
        .find(|group| group.span().end <= start)
        .filter(|group| !group.trailing && group.end_line() + 1 == line)
        .filter(|group| text[group.span().end..start].trim().is_empty())
        .cloned()
}

// ── Declarations ───────────────────────────────────────────

fn lower_function(node: Node, text: &str, lines: &LineIndex, comments: &[CommentGroup]) -> FuncDecl {
    let start = node.start_byte();
    let line = lines.line_of(start);
    let name = node
        .child_by_field_name("name")
        .map(|n| text[n.start_byte()..n.end_byte()].to_string())
        .unwrap_or_default();
    let body = node.child_by_field_name("body").map(lower_block);
    tracing::trace!(function = %name, line, "lowered function declaration");
    FuncDecl {
        name,
        span: Span::new(start, node.end_byte()),
        line,
        doc: doc_comment(comments, text, start, line),
        body,
    }
}

fn lower_block(node: Node) -> Block {
    let mut stmts = Vec::new();
    for child in node.named_children(&mut node.walk()) {
        if child.kind() == "statement_list" {
            for stmt in child.named_children(&mut child.walk()) {
                if stmt.kind() != "comment" {
                    stmts.push(lower_stmt(stmt));
                }
            }
        } else if child.kind() != "comment" {
            stmts.push(lower_stmt(child));
        }
    }
    Block {
        lbrace: node.start_byte(),
        rbrace: node.end_byte().saturating_sub(1),
        stmts,
    }
}

// ── Statements ─────────────────────────────────────────────

fn lower_stmt(node: Node) -> Stmt {
    let kind = match node.kind() {
        "if_statement" => match lower_if(node) {
            Some(if_stmt) => StmtKind::If(if_stmt),
            None => StmtKind::Simple,
        },
        "expression_switch_statement" | "type_switch_statement" => StmtKind::Switch,
        "select_statement" => StmtKind::Select,
        "for_statement" => StmtKind::For,
        "defer_statement" => StmtKind::Defer,
        "go_statement" => StmtKind::Go,
        "return_statement" => StmtKind::Return,
        "block" => StmtKind::Block,
        "labeled_statement" => StmtKind::Labeled,
        "const_declaration" | "var_declaration" | "type_declaration" => StmtKind::Decl,
        "break_statement" | "continue_statement" | "goto_statement" | "fallthrough_statement" => StmtKind::Branch,
        "empty_statement" => StmtKind::Empty,
        _ => StmtKind::Simple,
    };
    Stmt {
        span: Span::new(node.start_byte(), node.end_byte()),
        kind,
    }
}

fn lower_if(node: Node) -> Option<IfStmt> {
    let cond = node.child_by_field_name("condition")?;
    let consequence = node.child_by_field_name("consequence")?;
    Some(IfStmt {
        init: node
            .child_by_field_name("initializer")
            .map(|n| Span::new(n.start_byte(), n.end_byte())),
        cond: lower_expr(cond),
        consequence: Span::new(consequence.start_byte(), consequence.end_byte()),
        has_else: node.child_by_field_name("alternative").is_some(),
    })
}

// ── Expressions ────────────────────────────────────────────

fn lower_expr(node: Node) -> Expr {
    let kind = match node.kind() {
        "identifier" | "true" | "false" | "nil" | "iota" => ExprKind::Ident,
        "parenthesized_expression" => match inner(node) {
            Some(inner) => ExprKind::Paren(span_of(inner)),
            None => ExprKind::Other,
        },
        "unary_expression" => {
            let is_not = node.child_by_field_name("operator").is_some_and(|op| op.kind() == "!");
            match node.child_by_field_name("operand") {
                Some(operand) if is_not => {
                    let unparen = match operand.kind() {
                        "parenthesized_expression" => inner(operand).map_or(span_of(operand), span_of),
                        _ => span_of(operand),
                    };
                    ExprKind::Not {
                        operand: span_of(operand),
                        unparen,
                    }
                }
                _ => ExprKind::Other,
            }
        }
        _ => ExprKind::Other,
    };
    Expr {
        span: span_of(node),
        kind,
    }
}

/// The expression inside a `parenthesized_expression`.
fn inner(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find(|child| child.kind() != "comment");
    found
}

fn span_of(node: Node) -> Span {
    Span::new(node.start_byte(), node.end_byte())
}
