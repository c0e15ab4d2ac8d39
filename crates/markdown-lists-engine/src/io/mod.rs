use relative_path::RelativePath;
use std::fs;
use std::path::{Path, PathBuf};

use crate::editing::EditSession;
use crate::lists::ListEditWatcher;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read a markdown file and return its content
pub fn read_file(relative_path: &RelativePath, notes_root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(notes_root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read_to_string(&absolute_path).map_err(IoError::Io)
}

/// Write content to a markdown file
pub fn write_file(
    relative_path: &RelativePath,
    notes_root: &Path,
    content: &str,
) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(notes_root);

    // Create parent directories if they don't exist
    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(&absolute_path, content).map_err(IoError::Io)
}

/// Open a file for editing; a missing file starts as an empty session
pub fn open_session(
    relative_path: &RelativePath,
    notes_root: &Path,
    watcher: ListEditWatcher,
) -> Result<EditSession, IoError> {
    let content = match read_file(relative_path, notes_root) {
        Ok(content) => content,
        Err(IoError::NotFound(path)) => {
            log::info!("{} does not exist yet, starting empty", path.display());
            String::new()
        }
        Err(e) => return Err(e),
    };
    Ok(EditSession::new(&content, watcher))
}

/// Write the session's buffer back to disk
pub fn save_session(
    session: &EditSession,
    relative_path: &RelativePath,
    notes_root: &Path,
) -> Result<(), IoError> {
    write_file(relative_path, notes_root, &session.text())
}
