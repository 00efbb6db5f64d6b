//! Text splicer: substitutes generated code into function bodies
//!
//! Everything outside the edited regions is copied byte for byte.

use crate::body::BodyContractState;

/// One function body to rewrite
#[derive(Debug, Clone)]
pub struct FuncEdit {
    /// Offset of the body's `{`.
    pub lbrace: usize,
    /// Offset of the body's `}`.
    pub rbrace: usize,
    pub state: BodyContractState,
    /// Generated code, possibly empty.
    pub code: String,
}

/// Where the backward scan from the next content stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Newline,
    Semicolon,
    /// End of the old blocks, with only spaces up to the next content.
    BlocksEnd,
    /// Opening brace: the first statement shares its line.
    Brace,
}

/// Apply `edits`, which must be sorted and non-overlapping, to `text`.
pub fn splice(text: &str, edits: &[FuncEdit]) -> String {
    let extra: usize = edits.iter().map(|e| e.code.len() + 4).sum();
    let mut out = String::with_capacity(text.len() + extra);
    let mut cursor = 0;
    for edit in edits {
        out.push_str(&text[cursor..=edit.lbrace]);
        cursor = apply(text, edit, &mut out);
    }
    out.push_str(&text[cursor..]);
    out
}

/// Write the new start of one body; returns the offset from which the
/// original text continues.
fn apply(text: &str, edit: &FuncEdit, out: &mut String) -> usize {
    let code = edit.code.as_str();
    keep_leading_comments(text, edit, out);

    let Some(next) = edit.state.next else {
        if !code.is_empty() {
            out.push('\n');
            out.push_str(code);
            out.push('\n');
        }
        return edit.rbrace;
    };

    if !text[edit.lbrace..edit.rbrace].contains('\n') {
        if code.is_empty() {
            out.push_str(&text[edit.lbrace + 1..=edit.rbrace]);
        } else {
            out.push('\n');
            out.push_str(code);
            out.push_str("\n\n\t");
            out.push_str(text[next..edit.rbrace].trim_end_matches([' ', '\t']));
            out.push_str("\n}");
        }
        return edit.rbrace + 1;
    }

    let floor = edit.state.union().map_or(edit.lbrace, |union| union.end);
    let (cursor, boundary) = scan_back(text.as_bytes(), next, floor);
    if code.is_empty() {
        return if boundary == Boundary::Brace { edit.lbrace + 1 } else { cursor };
    }
    out.push('\n');
    out.push_str(code);
    match boundary {
        Boundary::Newline => {
            out.push('\n');
            cursor
        }
        Boundary::Semicolon | Boundary::BlocksEnd => cursor,
        Boundary::Brace => {
            out.push_str("\n\n\t");
            next
        }
    }
}

/// Comments between `{` and the old blocks survive the rewrite, up to the
/// line break before the first block.
fn keep_leading_comments(text: &str, edit: &FuncEdit, out: &mut String) {
    let Some(union) = edit.state.union() else {
        return;
    };
    let leading = &text[edit.lbrace + 1..union.start];
    if leading.trim().is_empty() {
        return;
    }
    if let Some(nl) = leading.rfind('\n') {
        out.push_str(&leading[..nl]);
    }
}

/// Walk back from `next` to the closest line break or `;`, never past
/// `floor`. A line break found is reported at its `\r` if it has one.
fn scan_back(bytes: &[u8], next: usize, floor: usize) -> (usize, Boundary) {
    let mut cursor = next;
    loop {
        match bytes[cursor] {
            b'\n' if cursor > floor && bytes[cursor - 1] == b'\r' => return (cursor - 1, Boundary::Newline),
            b'\n' => return (cursor, Boundary::Newline),
            b';' => return (cursor, Boundary::Semicolon),
            b'{' if cursor == floor => return (cursor, Boundary::Brace),
            _ if cursor == floor => return (cursor, Boundary::BlocksEnd),
            _ => cursor -= 1,
        }
    }
}
