//! gocontracts core - design-by-contract for Go source files
//!
//! Contracts are written in a function's documentation and mirrored as
//! generated checks at the top of its body:
//!
//! ```text
//! // Abs returns the absolute value of x.
//! //
//! // Abs ensures:
//! //  * result >= 0
//! func Abs(x int) (result int) {
//! 	// Post-condition
//! 	defer func() {
//! 		if !(result >= 0) {
//! 			panic("Violated: result >= 0")
//! 		}
//! 	}()
//! 	...
//! ```
//!
//! # Architecture
//!
//! ```text
//! Go text → syntax::GoParser (tree-sitter-go) → SourceFile
//!              ├─ doc comment → doc::parse_contract → Contract → codegen::generate
//!              └─ body        → body::locate       → BodyContractState
//!                                                          ↓
//!                                               splice::splice → Go text
//! ```
//!
//! # Guarantees
//!
//! - **Idempotent**: synchronizing twice equals synchronizing once
//! - **Faithful**: bytes outside the rewritten block regions never change
//! - **All or nothing**: any error aborts the whole file

pub mod body;
pub mod codegen;
pub mod condition;
pub mod dedent;
pub mod doc;
pub mod error;
pub mod fs;
pub mod process;
pub mod splice;
pub mod syntax;

pub use body::{BlockKind, BodyContractState, BodyError, BodyErrorKind};
pub use condition::Condition;
pub use doc::{Contract, DocError, DocErrorKind};
pub use error::{Error, ErrorKind, Result};
pub use fs::{process_file, process_in_place};
pub use syntax::{GoParser, SourceParser};

/// Synchronize `text` with the built-in Go parser.
///
/// See [`process::synchronize`] for the semantics.
pub fn synchronize(text: &str, file_name: &str, remove: bool) -> Result<String> {
    process::synchronize(&GoParser, text, file_name, remove)
}
