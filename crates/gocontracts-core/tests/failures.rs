//! Files that must be rejected, with the exact message reported.

use gocontracts_core::{synchronize, ErrorKind};

fn check_failure(name: &str, text: &str, kind: ErrorKind, expected: &str) {
    match synchronize(text, name, false) {
        Ok(out) => panic!("case {}: expected an error, got output:\n{}", name, out),
        Err(err) => {
            assert_eq!(err.to_string(), expected, "case {}: unexpected message", name);
            assert_eq!(err.kind(), kind, "case {}: unexpected kind", name);
        }
    }
}

/// Like `check_failure` for messages whose tail depends on the parser's
/// error recovery: only the prefix is fixed.
fn check_failure_prefix(name: &str, text: &str, kind: ErrorKind, prefix: &str) -> String {
    match synchronize(text, name, false) {
        Ok(out) => panic!("case {}: expected an error, got output:\n{}", name, out),
        Err(err) => {
            let message = err.to_string();
            assert!(message.starts_with(prefix), "case {}: unexpected message {:?}", name, message);
            assert_eq!(err.kind(), kind, "case {}: unexpected kind", name);
            message
        }
    }
}

#[test]
fn statement_between_blocks() {
    let text = r#"package somepkg

// SomeFunc does something.
//
// SomeFunc requires:
// * x > 0
//
// SomeFunc ensures:
// * result == "oi"
//
// Some text here.
func SomeFunc(x int, y int) (result string, err error) {
	// Pre-condition
	if !(x > 0) {
		panic("Violated: x > 0")
	}

	panic("hello")

	// Post-condition
	defer func() {
		if !(result == "oi") {
			panic("Violated: result == \"oi\"")
		}
	}();

	return
}
"#;
    check_failure(
        "statement_between_blocks",
        text,
        ErrorKind::Body,
        "unexpected statement between the contract blocks in function SomeFunc on line 18",
    );
}

#[test]
fn statement_before_contract() {
    let text = r#"package somepkg

// SomeFunc does something.
//
// SomeFunc requires:
// * x > 0
func SomeFunc(x int, y int) (result string, err error) {
	print("hello")

	// Pre-condition
	if !(x > 0) {
		panic("Violated: x > 0")
	}

	return
}
"#;
    check_failure(
        "statement_before_contract",
        text,
        ErrorKind::Body,
        "unexpected statement before the contract in function SomeFunc on line 8",
    );
}

#[test]
fn no_switch_in_preconditions() {
    let text = "package somepkg\n\n// SomeFunc does something.\nfunc SomeFunc(x int) {\n\t// Pre-conditions\n\tpanic(\"hello\")\n\n\treturn\n}\n";
    check_failure(
        "no_switch_in_preconditions",
        text,
        ErrorKind::Body,
        "expected a 'switch' statement after the comment \"Pre-conditions\" in function SomeFunc on line 6",
    );
}

#[test]
fn no_defer_in_postcondition() {
    let text = r#"package somepkg

// SomeFunc does something.
//
// SomeFunc ensures:
//  * x > 0
func SomeFunc(x int, y int) (result string, err error) {
	// Pre-condition
	if !(x > 0) {
		panic("Violated: x > 0")
	}

	// Post-condition

	return
}
"#;
    check_failure(
        "no_defer_in_postcondition",
        text,
        ErrorKind::Body,
        "expected a 'defer' statement after the comment \"Post-condition\" in function SomeFunc on line 15",
    );
}

#[test]
fn no_statement_after_postcondition() {
    let text = "package somepkg\n\nfunc SomeFunc(x int) {\n\t// Post-condition\n}\n";
    check_failure(
        "no_statement_after_postcondition",
        text,
        ErrorKind::Body,
        "found no statement after the comment \"Post-condition\" in function SomeFunc on line 4",
    );
}

#[test]
fn unmatched_function_in_precondition() {
    let text = "package somepkg\n\n// SomeFunc does something.\n//\n// UnexpectedFunc requires:\n// * x > 0\nfunc SomeFunc(x int, y int) (result string, err error) {\n\treturn\n}\n";
    check_failure(
        "unmatched_function_in_precondition",
        text,
        ErrorKind::Documentation,
        "failed to parse comments of the function SomeFunc on line 5: \
         expected function name \"SomeFunc\" in pre-condition block, but got \"UnexpectedFunc\"",
    );
}

#[test]
fn unmatched_function_in_postcondition() {
    let text = "package somepkg\n\n// SomeFunc does something.\n//\n// UnexpectedFunc ensures:\n//  * x > 0\nfunc SomeFunc(x int, y int) (result string, err error) {\n\treturn\n}\n";
    check_failure(
        "unmatched_function_in_postcondition",
        text,
        ErrorKind::Documentation,
        "failed to parse comments of the function SomeFunc on line 5: \
         expected function name \"SomeFunc\" in post-condition block, but got \"UnexpectedFunc\"",
    );
}

#[test]
fn unparsable_condition() {
    let text = "package somepkg\n\n// SomeFunc requires:\n//  * x > 0\n//  * x >\nfunc SomeFunc(x int) {}\n";
    check_failure_prefix(
        "unparsable_condition",
        text,
        ErrorKind::Documentation,
        "failed to parse comments of the function SomeFunc on line 5: failed to parse a pre-condition: 1:",
    );
}

#[test]
fn duplicate_requires_block() {
    let text = "package somepkg\n\n// SomeFunc requires:\n//  * x > 0\n//\n// SomeFunc requires:\n//  * x < 3\nfunc SomeFunc(x int) {}\n";
    check_failure(
        "duplicate_requires_block",
        text,
        ErrorKind::Documentation,
        "failed to parse comments of the function SomeFunc on line 6: multiple pre-condition blocks",
    );
}

#[test]
fn unparsable_file() {
    let text = "package somepkg\n\n// SomeFunc does something.\n//\n// UnexpectedFunc ensures:\n//  * x > 0\nfunc SomeFunc(x int, y int) (result string, err error) {\n\tresult =\n}\n";
    let message = check_failure_prefix("unparsable_file", text, ErrorKind::Syntax, "unparsable_file:");
    let rest = &message["unparsable_file:".len()..];
    assert!(["7:", "8:", "9:"].iter().any(|line| rest.starts_with(line)), "wrong line in {:?}", message);
    assert!(
        rest.contains(": missing ") || rest.contains(": unexpected "),
        "wrong description in {:?}",
        message
    );
}

#[test]
fn failure_in_a_later_function_discards_earlier_edits() {
    let text = "package somepkg\n\n// A requires:\n//  * x > 0\nfunc A(x int) {}\n\nfunc B() {\n\t// Preamble ends.\n}\n";
    check_failure(
        "later_function",
        text,
        ErrorKind::Body,
        "preamble end marker without the start marker in function B on line 8",
    );
}
