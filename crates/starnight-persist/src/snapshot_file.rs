//! Whole-store snapshots kept on disk between runs.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;
use starnight_store::Store;
use tracing::{debug, info};

use crate::error::{PersistError, PersistResult};

/// Restore `store` from the snapshot at `path`.
///
/// Returns `false` and leaves the store at its current values when the file
/// does not exist.
///
/// # Errors
///
/// Returns [`PersistError::SnapshotFile`] when the file cannot be read or
/// parsed, and [`PersistError::ShapeMismatch`] when its layout is wrong.
pub fn load_into(store: &Store, path: &Path) -> PersistResult<bool> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no snapshot file; keeping defaults");
            return Ok(false);
        }
        Err(err) => return Err(file_error("read", path, err)),
    };
    let data: Value = serde_json::from_str(&text).map_err(|err| file_error("parse", path, err))?;
    store
        .restore(&data, &[])
        .map_err(PersistError::ShapeMismatch)?;
    info!(path = %path.display(), "snapshot loaded");
    Ok(true)
}

/// Write the full snapshot of `store` to `path` as pretty JSON.
///
/// Parent directories are created as needed and the file is replaced
/// atomically.
///
/// # Errors
///
/// Returns [`PersistError::SnapshotFile`] naming the failed operation.
pub fn save(store: &Store, path: &Path) -> PersistResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| file_error("create_dir", parent, err))?;
    }
    let mut text = serde_json::to_string_pretty(&store.snapshot())
        .map_err(|err| file_error("serialize", path, err))?;
    text.push('\n');

    let staging = path.with_extension("json.tmp");
    fs::write(&staging, text).map_err(|err| file_error("write", &staging, err))?;
    fs::rename(&staging, path).map_err(|err| file_error("rename", path, err))?;
    debug!(path = %path.display(), "snapshot saved");
    Ok(())
}

fn file_error(
    operation: &'static str,
    path: &Path,
    source: impl std::error::Error + Send + Sync + 'static,
) -> PersistError {
    PersistError::SnapshotFile {
        operation,
        path: path.to_path_buf(),
        source: Box::new(source),
    }
}
