//! Preference store backed by a JSON object on disk

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use super::PreferenceStore;
use crate::error::{HotkeyError, Result};

/// Preference store persisted as a single JSON file
///
/// The whole file is rewritten on every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = match fs::read(&path) {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|source| HotkeyError::DecodingFailed {
                    key: path.display().to_string(),
                    source,
                })?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(HotkeyError::Store { path, source }),
        };

        debug!(path = %path.display(), entries = entries.len(), "preference store opened");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        let io_err = |source: io::Error| HotkeyError::Store {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let bytes = serde_json::to_vec_pretty(&self.entries).map_err(|source| {
            HotkeyError::EncodingFailed {
                key: self.path.display().to_string(),
                source,
            }
        })?;

        // Write-then-rename: the old file stays intact until the new one is complete
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries
            .get(key)
            .and_then(|value| serde_json::to_vec(value).ok())
    }

    fn set(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        let value: Value =
            serde_json::from_slice(&value).map_err(|source| HotkeyError::EncodingFailed {
                key: key.to_string(),
                source,
            })?;
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::{Key, Modifier, Modifiers, Name};
    use crate::store::StoredShortcut;
    use tempfile::TempDir;

    fn stored() -> StoredShortcut {
        StoredShortcut {
            key: Some(Key::K),
            modifiers: Modifiers::from([Modifier::Command]),
            name: Name::with_prefix("palette", "app."),
        }
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("shortcuts.json")).unwrap();
        assert!(store.get("anything").is_none());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("shortcuts.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        store.set("app.palette", stored().encode().unwrap()).unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        let bytes = reopened.get("app.palette").unwrap();
        let back = StoredShortcut::decode("app.palette", &bytes).unwrap();
        assert_eq!(back, stored());
    }

    #[test]
    fn test_remove_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shortcuts.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        store.set("app.palette", stored().encode().unwrap()).unwrap();
        store.remove("app.palette").unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert!(reopened.get("app.palette").is_none());
    }

    #[test]
    fn test_rejects_non_json_value() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::open(dir.path().join("s.json")).unwrap();
        let err = store.set("k", b"\xff".to_vec()).unwrap_err();
        assert!(matches!(err, HotkeyError::EncodingFailed { .. }));
    }

    #[test]
    fn test_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.json");
        fs::write(&path, "{ not json").unwrap();
        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, HotkeyError::DecodingFailed { .. }));
    }
}
