//! Utility functions for sprig
//!
//! File helpers shared by the store, the staging area and the repository
//! configuration. Every persisted file goes through [`write_json`], which
//! writes to a temporary file in the destination directory and renames it
//! over the target, so a crash mid-write never leaves a truncated file.

use crate::error::{Result, SprigError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::trace;

/// Atomic file write (write to temp file then rename)
///
/// The temporary file is created next to `path` so the final rename stays
/// on one filesystem. If any step fails the temporary file is removed and
/// the target is left untouched.
///
/// # Errors
///
/// - [`SprigError::Io`] if writing the temporary file or the rename fails
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| SprigError::internal(format!("Path {:?} has no parent directory", path)))?;
    fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| SprigError::Io(e.error))?;

    trace!("Wrote {} bytes to {:?}", content.len(), path);
    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    atomic_write(path, &json)
}

/// Read and decode a JSON file
///
/// Returns `Ok(None)` when the file does not exist. A file that exists but
/// does not decode is reported as [`SprigError::CorruptStore`].
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| SprigError::corrupt(path, e.to_string()))
}
