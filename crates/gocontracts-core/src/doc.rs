//! Contract parser: reads a function's contract from its documentation
//!
//! ```text
//! // SomeFunc does something.
//! //
//! // SomeFunc requires:
//! //  * x > 0
//! //  * limit: y < 100
//! //
//! // SomeFunc preamble:
//! //  previous := len(items)
//! //
//! // SomeFunc ensures:
//! //  * len(items) == previous + 1
//! ```
//!
//! Each line is first classified as a block header or plain text; the
//! plain lines are then consumed by a small state machine.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::condition::{parse_condition, Condition};
use crate::dedent::{dedent, trim_empty_lines};
use crate::syntax::{SourceParser, SyntaxError};

/// Go identifiers: a Unicode letter or `_`, then letters, digits or `_`.
static REQUIRES_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([\p{L}_][\p{L}\p{Nd}_]*)\s+requires\s*:\s*$").unwrap());

static ENSURES_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([\p{L}_][\p{L}\p{Nd}_]*)\s+ensures\s*:\s*$").unwrap());

static PREAMBLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([\p{L}_][\p{L}\p{Nd}_]*)('s)?\s+preamble\s*:\s*$").unwrap());

/// The contract documented for one function
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contract {
    pub preconditions: Vec<Condition>,
    pub postconditions: Vec<Condition>,
    /// Dedented snippet, lines joined by `\n`; empty if none.
    pub preamble: String,
}

impl Contract {
    pub fn is_empty(&self) -> bool {
        self.preconditions.is_empty() && self.postconditions.is_empty() && self.preamble.is_empty()
    }
}

/// The three kinds of documentation blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Requires,
    Ensures,
    Preamble,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Section::Requires => "pre-condition",
            Section::Ensures => "post-condition",
            Section::Preamble => "preamble",
        };
        f.write_str(name)
    }
}

/// What is wrong with a function's documentation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocErrorKind {
    #[error("{}", multiple_message(*.0))]
    Multiple(Section),

    #[error("expected function name {expected:?} in {section} block, but got {got:?}")]
    NameMismatch {
        section: Section,
        expected: String,
        got: String,
    },

    #[error("failed to parse a {section}: {source}")]
    Condition { section: Section, source: SyntaxError },
}

fn multiple_message(section: Section) -> &'static str {
    match section {
        Section::Requires => "multiple pre-condition blocks",
        Section::Ensures => "multiple post-condition blocks",
        Section::Preamble => "multiple preambles",
    }
}

/// A documentation error with the index of the offending line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct DocError {
    /// 0-based index into the documentation lines.
    pub index: usize,
    pub kind: DocErrorKind,
}

/// A classified documentation line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineToken<'a> {
    Header { section: Section, name: &'a str },
    Text(&'a str),
}

fn classify_line(line: &str) -> LineToken<'_> {
    let patterns = [
        (Section::Requires, &*REQUIRES_PATTERN),
        (Section::Ensures, &*ENSURES_PATTERN),
        (Section::Preamble, &*PREAMBLE_PATTERN),
    ];
    for (section, pattern) in patterns {
        if let Some(name) = pattern.captures(line).and_then(|caps| caps.get(1)) {
            return LineToken::Header {
                section,
                name: name.as_str(),
            };
        }
    }
    LineToken::Text(line)
}

/// Parse the contract of `function` from its documentation lines
pub fn parse_contract<P, S>(parser: &P, function: &str, lines: &[S]) -> Result<Contract, DocError>
where
    P: SourceParser + ?Sized,
    S: AsRef<str>,
{
    let tokens: Vec<LineToken> = lines.iter().map(|l| classify_line(l.as_ref())).collect();

    for section in [Section::Requires, Section::Ensures, Section::Preamble] {
        let mut headers = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| matches!(t, LineToken::Header { section: s, .. } if *s == section));
        if let (Some(_), Some((index, _))) = (headers.next(), headers.next()) {
            return Err(DocError {
                index,
                kind: DocErrorKind::Multiple(section),
            });
        }
    }

    let mut contract = Contract::default();
    let mut preamble_lines: Vec<&str> = Vec::new();
    let mut state: Option<Section> = None;

    for (index, token) in tokens.iter().enumerate() {
        let text = match *token {
            LineToken::Header { section, name } => {
                if name != function {
                    return Err(DocError {
                        index,
                        kind: DocErrorKind::NameMismatch {
                            section,
                            expected: function.to_string(),
                            got: name.to_string(),
                        },
                    });
                }
                state = Some(section);
                continue;
            }
            LineToken::Text(text) => text,
        };

        match state {
            None => {}
            Some(section @ (Section::Requires | Section::Ensures)) => {
                if text.trim_matches(|c| c == ' ' || c == '\t').is_empty() {
                    state = None;
                    continue;
                }
                let condition = parse_condition(parser, text).map_err(|source| DocError {
                    index,
                    kind: DocErrorKind::Condition { section, source },
                })?;
                match condition {
                    Some(condition) if section == Section::Requires => contract.preconditions.push(condition),
                    Some(condition) => contract.postconditions.push(condition),
                    None => state = None,
                }
            }
            Some(Section::Preamble) => {
                if text.starts_with([' ', '\t']) || text.is_empty() {
                    preamble_lines.push(text);
                } else {
                    state = None;
                }
            }
        }
    }

    if !preamble_lines.is_empty() {
        contract.preamble = trim_empty_lines(&dedent(&preamble_lines)).join("\n");
    }

    tracing::debug!(
        function,
        preconditions = contract.preconditions.len(),
        postconditions = contract.postconditions.len(),
        preamble = !contract.preamble.is_empty(),
        "parsed documented contract"
    );
    Ok(contract)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::GoParser;

    fn contract(lines: &[&str]) -> Contract {
        parse_contract(&GoParser, "SomeFunc", lines).unwrap()
    }

    fn error(lines: &[&str]) -> DocError {
        parse_contract(&GoParser, "SomeFunc", lines).unwrap_err()
    }

    fn exprs(conditions: &[Condition]) -> Vec<&str> {
        conditions.iter().map(|c| c.expr.as_str()).collect()
    }

    // ── Headers ────────────────────────────────────────────

    #[test]
    fn test_header_patterns() {
        assert!(matches!(classify_line("SomeFunc requires:"), LineToken::Header { section: Section::Requires, name: "SomeFunc" }));
        assert!(matches!(classify_line("  SomeFunc ensures :  "), LineToken::Header { section: Section::Ensures, .. }));
        assert!(matches!(classify_line("SomeFunc's preamble:"), LineToken::Header { section: Section::Preamble, .. }));
        assert!(matches!(classify_line("SomeFunc preamble:"), LineToken::Header { section: Section::Preamble, .. }));
        assert!(matches!(classify_line("SomeFunc requires: x"), LineToken::Text(_)));
    }

    #[test]
    fn test_unicode_function_names() {
        assert!(matches!(classify_line("Größe requires:"), LineToken::Header { section: Section::Requires, name: "Größe" }));
        assert!(matches!(classify_line("計算2 ensures:"), LineToken::Header { section: Section::Ensures, name: "計算2" }));
        assert!(matches!(classify_line("π's preamble:"), LineToken::Header { section: Section::Preamble, name: "π" }));
        let c = parse_contract(&GoParser, "Größe", &["Größe requires:", " * x > 0"]).unwrap();
        assert_eq!(exprs(&c.preconditions), vec!["x > 0"]);
    }

    // ── Blocks ─────────────────────────────────────────────

    #[test]
    fn test_requires_and_ensures() {
        let c = contract(&[
            "SomeFunc does something.",
            "",
            "SomeFunc requires:",
            " * x > 0",
            " * x < 100",
            " * some condition: y > 3",
            "",
            "SomeFunc ensures:",
            " * strings.HasPrefix(result, \"hello\")",
            "",
            "Some text here.",
        ]);
        assert_eq!(exprs(&c.preconditions), vec!["x > 0", "x < 100", "y > 3"]);
        assert_eq!(c.preconditions[2].label, "some condition");
        assert_eq!(exprs(&c.postconditions), vec!["strings.HasPrefix(result, \"hello\")"]);
        assert!(c.preamble.is_empty());
    }

    #[test]
    fn test_non_bullet_ends_block() {
        let c = contract(&["SomeFunc requires:", " * x > 0", "Unrelated paragraph.", " * y > 0"]);
        assert_eq!(exprs(&c.preconditions), vec!["x > 0"]);
    }

    #[test]
    fn test_bullets_outside_blocks_are_text() {
        let c = contract(&["Notes:", " * not a condition at all"]);
        assert!(c.is_empty());
    }

    #[test]
    fn test_preamble_is_dedented_and_trimmed() {
        let c = contract(&[
            "SomeFunc preamble:",
            "",
            "\tprevious := len(items)",
            "\tif previous > 0 {",
            "\t\tcheck()",
            "\t}",
            "",
            "SomeFunc ensures:",
            " * len(items) > previous",
        ]);
        assert_eq!(c.preamble, "previous := len(items)\nif previous > 0 {\n\tcheck()\n}");
        assert_eq!(c.postconditions.len(), 1);
    }

    #[test]
    fn test_preamble_keeps_inner_blank_lines() {
        let c = contract(&["SomeFunc's preamble:", "  a := 1", "", "  b := 2", "Done."]);
        assert_eq!(c.preamble, "a := 1\n\nb := 2");
    }

    // ── Errors ─────────────────────────────────────────────

    #[test]
    fn test_name_mismatch() {
        let err = error(&["SomeFunc does something.", "", "UnexpectedFunc ensures:", " * x > 0"]);
        assert_eq!(err.index, 2);
        assert_eq!(
            err.to_string(),
            "expected function name \"SomeFunc\" in post-condition block, but got \"UnexpectedFunc\""
        );
    }

    #[test]
    fn test_name_mismatch_in_preamble() {
        let err = error(&["Other preamble:", "  x := 1"]);
        assert_eq!(
            err.to_string(),
            "expected function name \"SomeFunc\" in preamble block, but got \"Other\""
        );
    }

    #[test]
    fn test_multiple_blocks() {
        let err = error(&["SomeFunc requires:", " * x > 0", "", "SomeFunc requires:", " * y > 0"]);
        assert_eq!(err.index, 3);
        assert_eq!(err.to_string(), "multiple pre-condition blocks");

        let err = error(&["SomeFunc ensures:", "SomeFunc ensures:"]);
        assert_eq!(err.to_string(), "multiple post-condition blocks");

        let err = error(&["SomeFunc preamble:", "SomeFunc's preamble:"]);
        assert_eq!(err.to_string(), "multiple preambles");
    }

    #[test]
    fn test_unparsable_condition() {
        let err = error(&["SomeFunc requires:", " * x > 0", " * x =="]);
        assert_eq!(err.index, 2);
        assert!(
            err.to_string().starts_with("failed to parse a pre-condition: 1:"),
            "{}",
            err
        );
    }
}
