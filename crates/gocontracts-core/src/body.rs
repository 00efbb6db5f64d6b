//! Body contract locator: finds previously generated blocks in a function body
//!
//! Generated code is re-found by its marker comments only. Each marker
//! must be followed by the statement the generator would have emitted,
//! and the blocks must form one contiguous run at the start of the body.
//!
//! # Guarantees
//!
//! - At most one block of each kind is reported.
//! - Reported blocks are pairwise disjoint and ordered precondition,
//!   preamble, postcondition.
//! - No top-level statement starts before the first block or between
//!   two blocks.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::syntax::{Block, CommentGroup, SourceFile, Span, Stmt, StmtKind};

static PRECONDITION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:Precondition|Pre-condition)(s?)\s*:?\s*$").unwrap());

static PREAMBLE_START_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Preamble\s+starts\.?\s*$").unwrap());

static PREAMBLE_END_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Preamble\s+ends\.?\s*$").unwrap());

static POSTCONDITION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:Postcondition|Post-condition)s?\s*:?\s*$").unwrap());

/// Start and end markers fused into one comment once the statements
/// between them were deleted.
const FUSED_PREAMBLE: &str = "Preamble starts.\nPreamble ends.";
const FUSED_INVERTED_PREAMBLE: &str = "Preamble ends.\nPreamble starts.";

// ── Errors ─────────────────────────────────────────────────

/// Kind of a generated block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Precondition,
    Preamble,
    Postcondition,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            BlockKind::Precondition => "pre-condition",
            BlockKind::Preamble => "preamble",
            BlockKind::Postcondition => "post-condition",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BodyErrorKind {
    #[error("found no statement after the comment {marker:?}")]
    NoStatementAfter { marker: String },

    #[error("expected {expected} statement after the comment {marker:?}")]
    UnexpectedStatement { expected: &'static str, marker: String },

    #[error("unexpected statement before the contract")]
    StatementBefore,

    #[error("unexpected statement between the contract blocks")]
    StatementBetween,

    #[error("unexpected {block} block before the {expected} block")]
    Misordered { block: BlockKind, expected: BlockKind },

    /// Two blocks intersect; `other_line` is where the second one starts.
    #[error("unexpected overlap in contract blocks")]
    Overlap { other_line: usize },

    #[error("duplicate pre-condition block found")]
    DuplicatePrecondition,

    #[error("duplicate post-condition block found")]
    DuplicatePostcondition,

    #[error("duplicate preamble start found")]
    DuplicatePreambleStart,

    #[error("duplicate preamble end found")]
    DuplicatePreambleEnd,

    #[error("preamble start marker without the end marker")]
    PreambleWithoutEnd,

    #[error("preamble end marker without the start marker")]
    PreambleWithoutStart,

    #[error("preamble start marker after the end marker")]
    PreambleInverted,
}

/// A malformed generated block in the body of `function`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyError {
    pub function: String,
    pub line: usize,
    pub kind: BodyErrorKind,
}

impl fmt::Display for BodyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            BodyErrorKind::Overlap { other_line } => write!(
                f,
                "unexpected overlap in contract blocks in function {} starting on lines {} and {}, respectively",
                self.function, self.line, other_line
            ),
            kind => write!(f, "{} in function {} on line {}", kind, self.function, self.line),
        }
    }
}

impl std::error::Error for BodyError {}

// ── Located blocks ─────────────────────────────────────────

/// Generated blocks found in one function body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BodyContractState {
    pub precondition: Option<Span>,
    pub preamble: Option<Span>,
    pub postcondition: Option<Span>,
    /// Offset of the first statement or comment at or after the end of
    /// the blocks (or anywhere in the body if there are none).
    pub next: Option<usize>,
}

impl BodyContractState {
    /// The blocks present, in canonical order.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockKind, Span)> {
        [
            (BlockKind::Precondition, self.precondition),
            (BlockKind::Preamble, self.preamble),
            (BlockKind::Postcondition, self.postcondition),
        ]
        .into_iter()
        .filter_map(|(kind, span)| span.map(|span| (kind, span)))
    }

    /// Smallest span covering every block.
    pub fn union(&self) -> Option<Span> {
        self.blocks()
            .map(|(_, span)| span)
            .reduce(|a, b| Span::new(a.start.min(b.start), a.end.max(b.end)))
    }

    pub fn is_empty(&self) -> bool {
        self.blocks().next().is_none()
    }
}

/// Recognized marker comments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Precondition { plural: bool },
    PreambleStart,
    PreambleEnd,
    FusedPreamble,
    FusedInvertedPreamble,
    Postcondition,
}

fn classify_marker(text: &str) -> Option<Marker> {
    if let Some(caps) = PRECONDITION_MARKER.captures(text) {
        let plural = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        return Some(Marker::Precondition { plural });
    }
    let marker = if text == FUSED_PREAMBLE {
        Marker::FusedPreamble
    } else if text == FUSED_INVERTED_PREAMBLE {
        Marker::FusedInvertedPreamble
    } else if PREAMBLE_START_MARKER.is_match(text) {
        Marker::PreambleStart
    } else if PREAMBLE_END_MARKER.is_match(text) {
        Marker::PreambleEnd
    } else if POSTCONDITION_MARKER.is_match(text) {
        Marker::Postcondition
    } else {
        return None;
    };
    Some(marker)
}

/// The text of a comment group as markers are matched against it.
fn marker_text(group: &CommentGroup) -> String {
    group.text().trim_matches(|c| c == '\n' || c == ' ' || c == '\t').to_string()
}

// ── Locator ────────────────────────────────────────────────

struct Locator<'a> {
    file: &'a SourceFile,
    function: &'a str,
    body: &'a Block,
}

impl<'a> Locator<'a> {
    fn error(&self, offset: usize, kind: BodyErrorKind) -> BodyError {
        BodyError {
            function: self.function.to_string(),
            line: self.file.line_of(offset),
            kind,
        }
    }

    /// First top-level statement starting after `offset`.
    fn statement_after(&self, offset: usize) -> Option<&'a Stmt> {
        self.body.stmts.iter().find(|stmt| stmt.span.start > offset)
    }

    /// Span of a block introduced by `group`, which must be followed by a
    /// statement matching `expected`.
    fn guarded_block(
        &self,
        group: &CommentGroup,
        marker: &str,
        expected: &'static str,
        accepts: fn(&StmtKind) -> bool,
    ) -> Result<Span, BodyError> {
        let start = group.span().start;
        let Some(stmt) = self.statement_after(start) else {
            return Err(self.error(
                start,
                BodyErrorKind::NoStatementAfter {
                    marker: marker.to_string(),
                },
            ));
        };
        if !accepts(&stmt.kind) {
            return Err(self.error(
                stmt.span.start,
                BodyErrorKind::UnexpectedStatement {
                    expected,
                    marker: marker.to_string(),
                },
            ));
        }
        Ok(Span::new(start, stmt.span.end))
    }

    fn scan_markers(&self) -> Result<BodyContractState, BodyError> {
        let mut state = BodyContractState::default();
        let mut preamble_start: Option<Span> = None;
        let mut preamble_end: Option<Span> = None;

        for group in self.file.comments_within(self.body.span()) {
            let text = marker_text(group);
            let Some(marker) = classify_marker(&text) else {
                continue;
            };
            let span = group.span();
            tracing::trace!(function = self.function, ?marker, line = group.line(), "found marker comment");

            match marker {
                Marker::Precondition { plural } => {
                    if state.precondition.is_some() {
                        return Err(self.error(span.start, BodyErrorKind::DuplicatePrecondition));
                    }
                    let block = if plural {
                        self.guarded_block(group, &text, "a 'switch'", |k| matches!(k, StmtKind::Switch))?
                    } else {
                        self.guarded_block(group, &text, "an 'if'", |k| matches!(k, StmtKind::If(_)))?
                    };
                    state.precondition = Some(block);
                }
                Marker::Postcondition => {
                    if state.postcondition.is_some() {
                        return Err(self.error(span.start, BodyErrorKind::DuplicatePostcondition));
                    }
                    let block = self.guarded_block(group, &text, "a 'defer'", |k| matches!(k, StmtKind::Defer))?;
                    state.postcondition = Some(block);
                }
                Marker::PreambleStart | Marker::PreambleEnd | Marker::FusedPreamble => {
                    if marker != Marker::PreambleEnd {
                        if preamble_start.is_some() {
                            return Err(self.error(span.start, BodyErrorKind::DuplicatePreambleStart));
                        }
                        preamble_start = Some(span);
                    }
                    if marker != Marker::PreambleStart {
                        if preamble_end.is_some() {
                            return Err(self.error(span.start, BodyErrorKind::DuplicatePreambleEnd));
                        }
                        preamble_end = Some(span);
                    }
                }
                Marker::FusedInvertedPreamble => {
                    return Err(self.error(span.start, BodyErrorKind::PreambleInverted));
                }
            }
        }

        state.preamble = match (preamble_start, preamble_end) {
            (None, None) => None,
            (Some(start), None) => return Err(self.error(start.start, BodyErrorKind::PreambleWithoutEnd)),
            (None, Some(end)) => return Err(self.error(end.start, BodyErrorKind::PreambleWithoutStart)),
            (Some(start), Some(end)) if start.start > end.start => {
                return Err(self.error(start.start, BodyErrorKind::PreambleInverted))
            }
            (Some(start), Some(end)) => Some(Span::new(start.start, end.end)),
        };
        Ok(state)
    }

    fn validate_disjoint(&self, blocks: &[(BlockKind, Span)]) -> Result<(), BodyError> {
        for (i, (_, a)) in blocks.iter().enumerate() {
            for (_, b) in &blocks[i + 1..] {
                if a.overlaps(b) {
                    return Err(self.error(
                        a.start,
                        BodyErrorKind::Overlap {
                            other_line: self.file.line_of(b.start),
                        },
                    ));
                }
            }
        }
        Ok(())
    }

    fn validate_order(&self, blocks: &[(BlockKind, Span)]) -> Result<(), BodyError> {
        for (i, (expected, a)) in blocks.iter().enumerate() {
            for (block, b) in &blocks[i + 1..] {
                if b.start < a.start {
                    return Err(self.error(
                        b.start,
                        BodyErrorKind::Misordered {
                            block: *block,
                            expected: *expected,
                        },
                    ));
                }
            }
        }
        Ok(())
    }

    fn validate_no_statements(&self, blocks: &[(BlockKind, Span)], union: Span) -> Result<(), BodyError> {
        if let Some(first) = self.body.stmts.first() {
            if first.span.start < union.start {
                return Err(self.error(first.span.start, BodyErrorKind::StatementBefore));
            }
        }
        for pair in blocks.windows(2) {
            let (prev, cur) = (pair[0].1, pair[1].1);
            let between = self
                .body
                .stmts
                .iter()
                .find(|stmt| stmt.span.start >= prev.end && stmt.span.start < cur.start);
            if let Some(stmt) = between {
                return Err(self.error(stmt.span.start, BodyErrorKind::StatementBetween));
            }
        }
        Ok(())
    }

    /// First statement or comment starting at or after `from`.
    fn next_content(&self, from: usize) -> Option<usize> {
        let stmt = self.body.stmts.iter().map(|s| s.span.start).find(|&start| start >= from);
        let comment = self
            .file
            .comments_within(self.body.span())
            .map(|group| group.span().start)
            .find(|&start| start >= from);
        match (stmt, comment) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn locate(&self) -> Result<BodyContractState, BodyError> {
        let mut state = self.scan_markers()?;
        let blocks: Vec<(BlockKind, Span)> = state.blocks().collect();

        let from = match state.union() {
            Some(union) => {
                self.validate_disjoint(&blocks)?;
                self.validate_order(&blocks)?;
                self.validate_no_statements(&blocks, union)?;
                union.end
            }
            None => self.body.lbrace + 1,
        };
        state.next = self.next_content(from);
        Ok(state)
    }
}

/// Locate and validate the generated blocks in the body of `function`.
pub fn locate(file: &SourceFile, function: &str, body: &Block) -> Result<BodyContractState, BodyError> {
    let state = Locator { file, function, body }.locate()?;
    tracing::debug!(
        function,
        precondition = state.precondition.is_some(),
        preamble = state.preamble.is_some(),
        postcondition = state.postcondition.is_some(),
        next = ?state.next,
        "located generated blocks"
    );
    Ok(state)
}
