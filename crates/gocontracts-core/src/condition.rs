//! Conditions: one documented bullet of a contract
//!
//! A bullet reads `* [label:] [init;] expr`. The initializer and the
//! expression are recovered by embedding the text as the header of an
//! `if` statement in a throwaway Go program and slicing the parsed
//! positions back out, so the user's own spacing survives.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::syntax::{ExprKind, Position, SourceParser, StmtKind, SyntaxError, SyntaxErrorKind};

/// Matches a bullet item; group 1 is the content.
static BULLET_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\*\s*(.*)\s*$").unwrap());

/// Splits a leading label off the content. The remainder may not start
/// with `=` so that `ok := m[k]; ok` keeps its short variable declaration.
static LABEL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z0-9_;.\-=' ]+\s*:)([^=].*)?$").unwrap());

const PLAYGROUND_PREFIX: &str = "package main\n\nfunc main() {\n\tif ";
const PLAYGROUND_SUFFIX: &str = " {\n\t\t// Do something\n\t}\n}\n";

/// Syntactic shape of a condition's expression, as far as negating it
/// is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// A lone identifier such as `ok`.
    Atom,
    /// Wrapped in parentheses as a whole.
    Parenthesized,
    /// `!x`; `kept` is the byte range of `x` in the expression text,
    /// without its parentheses if it has them.
    Negated { kept: Range<usize> },
    Other,
}

/// A pre- or postcondition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// Empty when the bullet has no label.
    pub label: String,
    /// Initialization statement, e.g. `_, ok := someMap[3]`; may be empty.
    pub init: String,
    /// The boolean expression exactly as written, trimmed.
    pub expr: String,
    pub shape: Shape,
}

impl Condition {
    /// The expression that holds when this condition is violated.
    pub fn negated(&self) -> String {
        match &self.shape {
            Shape::Atom | Shape::Parenthesized => format!("!{}", self.expr),
            Shape::Negated { kept } => self.expr[kept.clone()].trim().to_string(),
            Shape::Other => format!("!({})", self.expr),
        }
    }

    /// The condition as documented, without its label.
    pub fn text(&self) -> String {
        if self.init.is_empty() {
            self.expr.clone()
        } else {
            format!("{}; {}", self.init, self.expr)
        }
    }

    /// Message reported when the check fails, as a Go string literal.
    pub fn violation_message(&self) -> String {
        let mut msg = String::from("Violated: ");
        if !self.label.is_empty() {
            msg.push_str(&self.label);
            msg.push_str(": ");
        }
        msg.push_str(&self.text());
        go_quote(&msg)
    }
}

/// Parse one documentation line as a condition.
///
/// Returns `Ok(None)` if the line is not a bullet at all, which ends a
/// condition block rather than failing it. Syntax errors refer to
/// columns of the text after the label.
pub fn parse_condition<P: SourceParser + ?Sized>(parser: &P, line: &str) -> Result<Option<Condition>, SyntaxError> {
    let Some(caps) = BULLET_PATTERN.captures(line) else {
        return Ok(None);
    };
    let content = caps.get(1).map_or("", |m| m.as_str());

    let (label, parsable) = match LABEL_PATTERN.captures(content) {
        Some(caps) => {
            let label = caps.get(1).map_or("", |m| m.as_str()).trim();
            let label = label.strip_suffix(':').unwrap_or(label).trim();
            let rest = caps.get(2).map_or("", |m| m.as_str());
            (label.to_string(), rest.trim_matches(|c| c == ' ' || c == '\t'))
        }
        None => (String::new(), content.trim_matches(|c| c == ' ' || c == '\t')),
    };

    let (init, expr, shape) = split_condition(parser, parsable)?;

    Ok(Some(Condition { label, init, expr, shape }))
}

/// Split `init; expr` using the positions of a parsed `if` header and
/// classify the expression.
fn split_condition<P: SourceParser + ?Sized>(
    parser: &P,
    parsable: &str,
) -> Result<(String, String, Shape), SyntaxError> {
    let playground = format!("{}{}{}", PLAYGROUND_PREFIX, parsable, PLAYGROUND_SUFFIX);
    let file = parser
        .parse_file("", &playground)
        .map_err(|err| rebase(err, parsable.len()))?;

    let expected_lbrace = PLAYGROUND_PREFIX.len() + parsable.len() + 1;
    let if_stmt = file
        .functions()
        .next()
        .and_then(|func| func.body.as_ref())
        .filter(|body| body.stmts.len() == 1)
        .and_then(|body| match &body.stmts[0].kind {
            StmtKind::If(if_stmt) if if_stmt.consequence.start == expected_lbrace && !if_stmt.has_else => Some(if_stmt),
            _ => None,
        });
    let Some(if_stmt) = if_stmt else {
        return Err(SyntaxError::message(
            Position::START,
            "expected a single boolean expression, optionally preceded by a simple statement",
        ));
    };

    let init = match if_stmt.init {
        Some(span) => {
            let raw = playground[span.start..if_stmt.cond.span.start].trim();
            raw.strip_suffix(';').unwrap_or(raw).trim().to_string()
        }
        None => String::new(),
    };
    let cond = &if_stmt.cond;
    let expr = cond.span.slice(&playground).to_string();
    let shape = match &cond.kind {
        ExprKind::Ident => Shape::Atom,
        ExprKind::Paren(_) => Shape::Parenthesized,
        ExprKind::Not { unparen, .. } => Shape::Negated {
            kept: unparen.start - cond.span.start..unparen.end - cond.span.start,
        },
        ExprKind::Other => Shape::Other,
    };
    Ok((init, expr, shape))
}

/// Express an error in the playground as a column of the user's text.
fn rebase(err: SyntaxError, len: usize) -> SyntaxError {
    let offset = err.pos.offset.saturating_sub(PLAYGROUND_PREFIX.len());
    let (offset, kind) = if err.pos.offset < PLAYGROUND_PREFIX.len() {
        (0, err.kind)
    } else if offset >= len {
        let kind = match err.kind {
            SyntaxErrorKind::Unexpected(_) => SyntaxErrorKind::Unexpected("EOF".to_string()),
            other => other,
        };
        (len, kind)
    } else {
        (offset, err.kind)
    };
    SyntaxError {
        pos: Position {
            offset,
            line: 1,
            column: offset + 1,
        },
        kind,
    }
}

/// Quote `text` as a Go interpreted string literal.
pub fn go_quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{b}' => out.push_str("\\v"),
            c if c.is_control() => {
                let code = c as u32;
                if code <= 0xff {
                    out.push_str(&format!("\\x{:02x}", code));
                } else {
                    out.push_str(&format!("\\u{:04x}", code));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::GoParser;

    fn parse(line: &str) -> Condition {
        parse_condition(&GoParser, line)
            .unwrap_or_else(|err| panic!("failed to parse {:?}: {}", line, err))
            .unwrap_or_else(|| panic!("no condition matched in {:?}", line))
    }

    fn parse_error(line: &str) -> String {
        parse_condition(&GoParser, line).unwrap_err().to_string()
    }

    // ── Splitting ──────────────────────────────────────────

    #[test]
    fn test_only_condition() {
        let c = parse(" * x < 100");
        assert_eq!((c.label.as_str(), c.init.as_str(), c.expr.as_str()), ("", "", "x < 100"));
    }

    #[test]
    fn test_label_and_condition() {
        let c = parse(" * some label: x < 100");
        assert_eq!(c.label, "some label");
        assert_eq!(c.expr, "x < 100");
    }

    #[test]
    fn test_colon_inside_expression_is_not_a_label() {
        let c = parse(" * DoSomethingWithCopy(someArr[:]) == 0");
        assert_eq!(c.label, "");
        assert_eq!(c.expr, "DoSomethingWithCopy(someArr[:]) == 0");
    }

    #[test]
    fn test_short_statement() {
        let c = parse(" * _, ok := someMap[3]; ok");
        assert_eq!(c.label, "");
        assert_eq!(c.init, "_, ok := someMap[3]");
        assert_eq!(c.expr, "ok");
    }

    #[test]
    fn test_short_variable_declaration_is_not_a_label() {
        let c = parse("* ok := isOk(); ok");
        assert_eq!(c.label, "");
        assert_eq!(c.init, "ok := isOk()");
    }

    #[test]
    fn test_label_and_short_statement() {
        let c = parse(" * some label: _, ok := someMap[3]; ok");
        assert_eq!(c.label, "some label");
        assert_eq!(c.init, "_, ok := someMap[3]");
        assert_eq!(c.expr, "ok");
    }

    #[test]
    fn test_extra_whitespace_ignored() {
        let c = parse(" \t *  \t some label: \t   _, ok := someMap[3];  \t ok  \t ");
        assert_eq!(c.label, "some label");
        assert_eq!(c.init, "_, ok := someMap[3]");
        assert_eq!(c.expr, "ok");
    }

    #[test]
    fn test_whitespace_prefix_agnostic() {
        assert_eq!(parse("* x < 100").expr, "x < 100");
    }

    #[test]
    fn test_no_bullet_is_no_condition() {
        assert_eq!(parse_condition(&GoParser, "No condition could be matched.").unwrap(), None);
    }

    // ── Errors ─────────────────────────────────────────────

    fn column_of(message: &str) -> usize {
        let rest = message.strip_prefix("1:").unwrap_or_else(|| panic!("not on line 1: {}", message));
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().unwrap_or_else(|_| panic!("no column in {}", message))
    }

    #[test]
    fn test_unparsable_condition_points_at_end() {
        let err = parse_error("* x ==");
        assert!(column_of(&err) <= "x ==".len() + 1, "{}", err);
    }

    #[test]
    fn test_unparsable_condition_points_inside() {
        let err = parse_error("* x == )");
        assert!(column_of(&err) <= "x == )".len() + 1, "{}", err);
    }

    #[test]
    fn test_condition_past_the_end_reads_eof() {
        let err = rebase(
            SyntaxError {
                pos: Position {
                    offset: PLAYGROUND_PREFIX.len() + 9,
                    line: 4,
                    column: 10,
                },
                kind: SyntaxErrorKind::Unexpected("'{'".to_string()),
            },
            4,
        );
        assert_eq!(err.to_string(), "1:5: unexpected EOF");
    }

    #[test]
    fn test_deeply_nested_condition() {
        let depth = 1000;
        let c = parse(&format!("* {}x{}", "(".repeat(depth), ")".repeat(depth)));
        assert_eq!(c.shape, Shape::Parenthesized);
    }

    #[test]
    fn test_block_smuggled_into_condition() {
        assert!(parse_condition(&GoParser, "* x { } else if y").is_err());
    }

    // ── Negation ───────────────────────────────────────────

    #[test]
    fn test_negation_table() {
        let cases = [
            ("* x > 0", "!(x > 0)"),
            ("* ok", "!ok"),
            ("* (x > 0)", "!(x > 0)"),
            ("* !ok", "ok"),
            ("* !(x > 0)", "x > 0"),
            ("* !strings.HasPrefix(x, \"a\")", "strings.HasPrefix(x, \"a\")"),
            ("* strings.HasPrefix(result, \"hello\")", "!(strings.HasPrefix(result, \"hello\"))"),
        ];
        for (line, expected) in cases {
            assert_eq!(parse(line).negated(), expected, "negating {:?}", line);
        }
    }

    #[test]
    fn test_double_negation_restores_expression() {
        for line in ["* x > 0", "* a && b || c", "* f(x) == nil"] {
            let c = parse(line);
            let twice = parse(&format!("* {}", c.negated())).negated();
            assert_eq!(twice, c.expr, "double negation of {:?}", line);
        }
    }

    // ── Messages ───────────────────────────────────────────

    #[test]
    fn test_violation_message() {
        let c = parse(" * some condition: y > 3");
        assert_eq!(c.violation_message(), "\"Violated: some condition: y > 3\"");
        let c = parse(" * _, ok := someMap[3]; ok");
        assert_eq!(c.violation_message(), "\"Violated: _, ok := someMap[3]; ok\"");
    }

    #[test]
    fn test_go_quote_escapes() {
        assert_eq!(go_quote("a\"b\\c"), r#""a\"b\\c""#);
        assert_eq!(go_quote("tab\there\u{1}"), r#""tab\there\x01""#);
        assert_eq!(go_quote("ünïcode"), "\"ünïcode\"");
    }
}
