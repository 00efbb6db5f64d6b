//! Synchronization of a whole file
//!
//! Every function is handled independently: its documented contract is
//! parsed, the generated blocks already in its body are located, and the
//! two are turned into one edit. Edits are applied together once all
//! functions passed, so a failure leaves nothing half-done.

use crate::body::locate;
use crate::codegen::generate;
use crate::doc::{parse_contract, Contract};
use crate::error::{Error, Result};
use crate::splice::{splice, FuncEdit};
use crate::syntax::{FuncDecl, SourceParser};

/// Bring the generated checks of every function in `text` in line with
/// its documentation, or strip them all if `remove` is set.
///
/// `file_name` only prefixes syntax errors.
pub fn synchronize<P: SourceParser + ?Sized>(parser: &P, text: &str, file_name: &str, remove: bool) -> Result<String> {
    let file = parser.parse_file(file_name, text).map_err(|source| Error::Syntax {
        file: file_name.to_string(),
        source,
    })?;

    let mut edits = Vec::new();
    for func in file.functions() {
        let Some(body) = &func.body else {
            continue;
        };

        let contract = if remove {
            Contract::default()
        } else {
            documented_contract(parser, func)?
        };
        let state = locate(&file, &func.name, body)?;

        if contract.is_empty() && state.is_empty() {
            continue;
        }

        tracing::debug!(function = %func.name, line = func.line, "computed edit");
        edits.push(FuncEdit {
            lbrace: body.lbrace,
            rbrace: body.rbrace,
            state,
            code: generate(&contract),
        });
    }

    tracing::debug!(file = file_name, edits = edits.len(), remove, "synchronized file");
    if edits.is_empty() {
        return Ok(text.to_string());
    }
    Ok(splice(text, &edits))
}

fn documented_contract<P: SourceParser + ?Sized>(parser: &P, func: &FuncDecl) -> Result<Contract> {
    let Some(doc) = &func.doc else {
        return Ok(Contract::default());
    };
    let lines = doc.lines();
    let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
    parse_contract(parser, &func.name, &texts).map_err(|source| Error::Documentation {
        function: func.name.clone(),
        line: lines.get(source.index).map_or_else(|| doc.line(), |l| l.line),
        source,
    })
}
