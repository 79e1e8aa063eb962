//! Output file writes.
//!
//! Pages are written to a temporary file in the destination directory and
//! renamed into place, so a reader never observes a half-written page.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::OutputWriteFailure;

/// What [`write_atomic`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was created or replaced.
    Written,
    /// The file already held exactly these bytes and was left untouched.
    Unchanged,
}

/// Create `dir` and any missing parents.
///
/// # Errors
///
/// Returns [`OutputWriteFailure`] if the directory cannot be created.
pub fn ensure_dir(dir: &Path) -> Result<(), OutputWriteFailure> {
    fs::create_dir_all(dir).map_err(|e| OutputWriteFailure::new(dir, e))
}

/// Atomically replace `path` with `contents`.
///
/// Skips the write when the existing file is byte-identical, which keeps
/// modification times stable across runs that change nothing.
///
/// # Errors
///
/// Returns [`OutputWriteFailure`] naming the path that could not be written.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<WriteOutcome, OutputWriteFailure> {
    if fs::read(path).is_ok_and(|existing| existing == contents) {
        tracing::debug!("unchanged {}", path.display());
        return Ok(WriteOutcome::Unchanged);
    }

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    ensure_dir(dir)?;

    let fail = |e: std::io::Error| OutputWriteFailure::new(path, e);
    let mut tmp = tempfile::Builder::new()
        .prefix(".ghpi-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(fail)?;
    tmp.write_all(contents).map_err(fail)?;
    tmp.as_file().sync_all().map_err(fail)?;
    make_world_readable(tmp.path()).map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;

    tracing::debug!("wrote {}", path.display());
    Ok(WriteOutcome::Written)
}

// Temp files are created 0600; published pages must be readable by a web server.
#[cfg(unix)]
fn make_world_readable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn make_world_readable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
