//! Whitespace normalization of documentation snippets
//!
//! Lines that are empty or contain only spaces and tabs are blank: they
//! take no part in finding the common indentation and come out empty.

/// Remove the longest run of leading spaces and tabs that all non-blank
/// lines share.
pub fn dedent<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let prefix = common_whitespace_prefix(lines);
    lines
        .iter()
        .map(|line| {
            let line = line.as_ref();
            if is_blank(line) {
                String::new()
            } else {
                line[prefix..].to_string()
            }
        })
        .collect()
}

/// Drop blank lines at the start and the end.
pub fn trim_empty_lines<S: AsRef<str>>(lines: &[S]) -> &[S] {
    let start = lines.iter().position(|l| !is_blank(l.as_ref())).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !is_blank(l.as_ref())).map_or(start, |i| i + 1);
    &lines[start..end]
}

fn is_blank(line: &str) -> bool {
    line.bytes().all(|b| b == b' ' || b == b'\t')
}

/// Length in bytes of the whitespace prefix shared by all non-blank lines.
fn common_whitespace_prefix<S: AsRef<str>>(lines: &[S]) -> usize {
    let mut non_blank = lines.iter().map(AsRef::as_ref).filter(|l| !is_blank(l));
    let Some(first) = non_blank.next() else {
        return 0;
    };

    let mut prefix = first
        .bytes()
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count();
    for line in non_blank {
        prefix = first.as_bytes()[..prefix]
            .iter()
            .zip(line.as_bytes())
            .take_while(|(a, b)| a == b)
            .count();
    }
    prefix
}
