use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::PersistenceError;

pub(super) fn ensure_parent_dir(path: &Path) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub(super) fn sync_parent_dir(path: &Path) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        if parent.as_os_str().is_empty() {
            return Ok(());
        }
        File::open(parent)?.sync_all()?;
    }
    Ok(())
}

/// Sibling path a file is staged at before it is renamed into place.
pub(super) fn staging_path(path: &Path) -> PathBuf {
    sibling_with_suffix(path, ".tmp")
}

/// Sibling path the previous version of a file is kept at during a save.
pub(super) fn backup_path(path: &Path) -> PathBuf {
    sibling_with_suffix(path, ".bak")
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Absolute form of `path` with its parent directory resolved, so different
/// spellings of one file compare equal. The parent must exist.
pub(super) fn resolved_path(path: &Path) -> Result<PathBuf, PersistenceError> {
    let file_name = path.file_name().ok_or_else(|| {
        PersistenceError::InvalidData(format!("{} does not name a file", path.display()))
    })?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok(fs::canonicalize(parent)?.join(file_name))
}

/// Keeps the current content of `path` at its backup sibling. Returns the
/// backup location, or `None` when there was nothing to keep.
pub(super) fn preserve_previous(path: &Path) -> Result<Option<PathBuf>, PersistenceError> {
    if !path.try_exists()? {
        return Ok(None);
    }

    let backup = backup_path(path);
    discard(&backup);
    if fs::hard_link(path, &backup).is_err() {
        fs::copy(path, &backup)?;
    }
    Ok(Some(backup))
}

/// Writes `path` through `encode` and syncs it to disk.
pub(super) fn write_synced<F>(path: &Path, encode: F) -> Result<(), PersistenceError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), PersistenceError>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    encode(&mut writer)?;
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|error| PersistenceError::Io(error.into_error()))?;
    file.sync_all()?;
    Ok(())
}

pub(super) fn discard(path: &Path) {
    if let Err(error) = fs::remove_file(path) {
        if error.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), %error, "failed to remove staged file");
        }
    }
}
