//! JSON snapshot codec for the storage file.
//!
//! The file is a single JSON object mapping each key to
//! `{"value": <json>, "expirationTime": <epoch millis or -1>}`. Every persist
//! rewrites the whole document.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::entry::{Entry, Record, RecordRef};
use crate::error::PersistError;
use crate::store::Store;

/// Writes every entry of `store` to `path`, replacing the previous contents.
///
/// The size ceiling is checked against the file currently on disk, before
/// anything is written. A file that is already larger than `max_file_bytes`
/// makes the call fail with [`PersistError::FileSizeExceeded`] and is left
/// untouched. The new snapshot goes to a sibling temporary file first and is
/// renamed into place.
pub fn save(store: &Store, path: &Path, max_file_bytes: u64) -> Result<(), PersistError> {
    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == ErrorKind::NotFound => 0,
        Err(e) => return Err(PersistError::io(path, e)),
    };
    if size > max_file_bytes {
        return Err(PersistError::FileSizeExceeded {
            path: path.to_path_buf(),
            size,
            max: max_file_bytes,
        });
    }

    let snapshot: BTreeMap<&str, RecordRef<'_>> = store
        .iter()
        .map(|(key, entry)| (key.as_str(), entry.to_record()))
        .collect();
    let bytes = serde_json::to_vec(&snapshot).map_err(PersistError::Encode)?;

    write_replace(path, &bytes)?;
    tracing::debug!(
        entries = snapshot.len(),
        bytes = bytes.len(),
        "Persisted store to {}",
        path.display()
    );
    Ok(())
}

/// Reads the storage file at `path`, dropping entries already expired at `now_millis`.
///
/// A missing or empty file yields an empty map. A document that does not
/// parse is logged and also yields an empty map; only filesystem errors are
/// returned.
pub fn load(path: &Path, now_millis: i64) -> Result<HashMap<String, Entry>, PersistError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(PersistError::io(path, e)),
    };
    if bytes.is_empty() {
        return Ok(HashMap::new());
    }

    match decode(path, &bytes, now_millis) {
        Ok(entries) => Ok(entries),
        Err(err @ PersistError::MalformedStorageFile { .. }) => {
            tracing::warn!(error = %err, "Ignoring unreadable storage file");
            Ok(HashMap::new())
        }
        Err(err) => Err(err),
    }
}

fn decode(
    path: &Path,
    bytes: &[u8],
    now_millis: i64,
) -> Result<HashMap<String, Entry>, PersistError> {
    let records: HashMap<String, Record> =
        serde_json::from_slice(bytes).map_err(|source| PersistError::MalformedStorageFile {
            path: path.to_path_buf(),
            source,
        })?;

    let total = records.len();
    let entries: HashMap<String, Entry> = records
        .into_iter()
        .map(|(key, record)| (key, Entry::from(record)))
        .filter(|(_, entry)| !entry.is_expired(now_millis))
        .collect();

    tracing::info!(
        loaded = entries.len(),
        expired = total - entries.len(),
        "Loaded store from {}",
        path.display()
    );
    Ok(entries)
}

fn write_replace(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    let tmp = temp_path(path);
    fs::write(&tmp, bytes).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        PersistError::io(&tmp, e)
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        PersistError::io(path, e)
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
