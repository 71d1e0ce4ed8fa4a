//! Plain-text import and export against the local filesystem.
//!
//! Failures are logged and returned; none of them touch the session or the
//! room. Content is read and written as UTF-8.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::language::Language;
use crate::session::{Session, SessionError};

/// File name offered for exports when the user does not pick one.
pub const DEFAULT_EXPORT_NAME: &str = "code.txt";

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("path has no file name: {0}")]
    NoFileName(String),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Read `path` and import it into the session's buffer.
///
/// The language comes from the file name's extension.
pub fn import_path(session: &mut Session, path: impl AsRef<Path>) -> Result<Language, FileError> {
    let path = path.as_ref();
    let result = read_named(path).and_then(|(name, content)| Ok(session.import_file(&name, content)?));
    if let Err(e) = &result {
        warn!(path = %path.display(), error = %e, "file import failed");
    }
    result
}

/// Write `content` to `path`, replacing any existing file.
pub fn export_path(path: impl AsRef<Path>, content: &str) -> Result<(), FileError> {
    let path = path.as_ref();
    match std::fs::write(path, content) {
        Ok(()) => {
            info!(path = %path.display(), len = content.len(), "exported buffer");
            Ok(())
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "file export failed");
            Err(e.into())
        }
    }
}

/// Write `content` to [`DEFAULT_EXPORT_NAME`] inside `dir` and return the path.
pub fn export_default(dir: impl AsRef<Path>, content: &str) -> Result<PathBuf, FileError> {
    let path = dir.as_ref().join(DEFAULT_EXPORT_NAME);
    export_path(&path, content)?;
    Ok(path)
}

fn read_named(path: &Path) -> Result<(String, String), FileError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| FileError::NoFileName(path.display().to_string()))?;
    let content = std::fs::read_to_string(path)?;
    Ok((name, content))
}

#[cfg(test)]
#[path = "files_test.rs"]
mod tests;
