use std::{
    ffi::OsString,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{domain::Transaction, errors::Result};

/// Sibling staging path: `snapshot.json` stages as `snapshot.json.tmp`.
pub(crate) fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replaces `path` with `contents`, staging to a sibling file and renaming it into place so a
/// reader never sees a half-written file.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let staging = staging_path(path);
    let mut file = File::create(&staging)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    fs::rename(&staging, path)?;
    Ok(())
}

/// Writes a snapshot (a JSON array of transaction records) to disk atomically.
pub fn save_snapshot_to_file(records: &[Transaction], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    write_atomic(path, &json)?;
    tracing::debug!(path = %path.display(), count = records.len(), "saved snapshot");
    Ok(())
}

/// Loads a snapshot (a JSON array of transaction records) from disk.
pub fn load_snapshot_from_file(path: &Path) -> Result<Vec<Transaction>> {
    let data = fs::read_to_string(path)?;
    let records: Vec<Transaction> = serde_json::from_str(&data)?;
    tracing::debug!(path = %path.display(), count = records.len(), "loaded snapshot");
    Ok(records)
}
