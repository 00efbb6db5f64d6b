//! Code generator: renders a contract as Go statements
//!
//! The output is indented one tab (the function body level), blocks are
//! separated by one blank line and the text never ends with a line break.

use std::fmt::Write;

use crate::condition::Condition;
use crate::doc::Contract;

const INDENT: &str = "\t";

/// Render the checks of `contract`; empty if there is nothing to check.
pub fn generate(contract: &Contract) -> String {
    let mut blocks = Vec::with_capacity(3);
    if !contract.preconditions.is_empty() {
        blocks.push(preconditions(&contract.preconditions));
    }
    if !contract.preamble.is_empty() {
        blocks.push(preamble(&contract.preamble));
    }
    if !contract.postconditions.is_empty() {
        blocks.push(postconditions(&contract.postconditions));
    }
    blocks.join("\n\n")
}

fn preconditions(conditions: &[Condition]) -> String {
    let mut out = String::new();
    match conditions {
        [single] => {
            out.push_str("\t// Pre-condition\n");
            write_guard(&mut out, single, 1);
        }
        _ => {
            out.push_str("\t// Pre-conditions\n");
            write_switch(&mut out, conditions, 1);
        }
    }
    out
}

fn postconditions(conditions: &[Condition]) -> String {
    let mut out = String::new();
    out.push_str(match conditions {
        [_] => "\t// Post-condition\n",
        _ => "\t// Post-conditions\n",
    });
    out.push_str("\tdefer func() {\n");
    match conditions {
        [single] => write_guard(&mut out, single, 2),
        _ => write_switch(&mut out, conditions, 2),
    }
    out.push_str("\n\t}()");
    out
}

fn preamble(snippet: &str) -> String {
    let mut out = String::from("\t// Preamble starts.\n");
    for line in snippet.lines() {
        if !line.is_empty() {
            out.push_str(INDENT);
            out.push_str(line);
        }
        out.push('\n');
    }
    out.push_str("\t// Preamble ends.");
    out
}

/// `if [init; ]!cond { panic(msg) }` without a trailing line break.
fn write_guard(out: &mut String, condition: &Condition, depth: usize) {
    let indent = INDENT.repeat(depth);
    let _ = write!(out, "{indent}if ");
    if !condition.init.is_empty() {
        let _ = write!(out, "{}; ", condition.init);
    }
    let _ = writeln!(out, "{} {{", condition.negated());
    let _ = writeln!(out, "{indent}\tpanic({})", condition.violation_message());
    let _ = write!(out, "{indent}}}");
}

/// One `case` per condition plus a no-op default, without a trailing
/// line break.
fn write_switch(out: &mut String, conditions: &[Condition], depth: usize) {
    let indent = INDENT.repeat(depth);
    let _ = writeln!(out, "{indent}switch {{");
    for condition in conditions {
        if condition.init.is_empty() {
            let _ = writeln!(out, "{indent}case {}:", condition.negated());
        } else {
            let _ = writeln!(
                out,
                "{indent}case func() bool {{ {}; return {} }}():",
                condition.init,
                condition.negated()
            );
        }
        let _ = writeln!(out, "{indent}\tpanic({})", condition.violation_message());
    }
    let _ = writeln!(out, "{indent}default:");
    let _ = writeln!(out, "{indent}\t// Pass");
    let _ = write!(out, "{indent}}}");
}
