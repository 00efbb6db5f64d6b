//! File-level entry points
//!
//! In-place updates go through a fresh temporary file in the same
//! directory that is renamed over the original, so readers never observe
//! a partially written file.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};
use crate::process::synchronize;
use crate::syntax::GoParser;

const TEMP_PREFIX: &str = ".gocontracts-";

/// Read `path` and return its synchronized text.
pub fn process_file(path: impl AsRef<Path>, remove: bool) -> Result<String> {
    let path = path.as_ref();
    let text = read(path)?;
    synchronize(&GoParser, &text, &path.display().to_string(), remove)
}

/// Synchronize `path` and atomically replace it if anything changed.
///
/// Returns whether the file was rewritten.
pub fn process_in_place(path: impl AsRef<Path>, remove: bool) -> Result<bool> {
    let path = path.as_ref();
    let text = read(path)?;
    let updated = synchronize(&GoParser, &text, &path.display().to_string(), remove)?;
    if updated == text {
        tracing::debug!(path = %path.display(), "file already up to date");
        return Ok(false);
    }

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let permissions = fs::metadata(path)
        .map_err(|e| Error::io("stat", path, e))?
        .permissions();

    // The temporary file is deleted when dropped on any early return.
    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(dir)
        .map_err(|e| Error::io("create a temporary file in", dir, e))?;
    tmp.write_all(updated.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| Error::io("write", tmp.path(), e))?;
    tmp.as_file()
        .set_permissions(permissions)
        .map_err(|e| Error::io("set permissions of", tmp.path(), e))?;
    tmp.persist(path).map_err(|e| Error::io("replace", path, e.error))?;

    tracing::debug!(path = %path.display(), "wrote file");
    Ok(true)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io("read", path, e))
}
