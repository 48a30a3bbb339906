//! Persistence of shortcut values
//!
//! The core writes a [`StoredShortcut`] when a registration succeeds and
//! removes it when the registration goes away. Entries are keyed by the
//! name's combined value.

mod file;
mod memory;

use serde::{Deserialize, Serialize};

use crate::error::{HotkeyError, Result};
use crate::hotkey::{Key, Modifiers, Name};

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Key-value store for serialized shortcuts
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    fn set(&mut self, key: &str, value: Vec<u8>) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Serialized form of a registration's current value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredShortcut {
    pub key: Option<Key>,
    pub modifiers: Modifiers,
    pub name: Name,
}

impl StoredShortcut {
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|source| HotkeyError::EncodingFailed {
            key: self.name.combined_value(),
            source,
        })
    }

    pub fn decode(key: &str, bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|source| HotkeyError::DecodingFailed {
            key: key.to_string(),
            source,
        })
    }

    /// Read and decode the entry stored for `name`, if any
    pub fn load(store: &dyn PreferenceStore, name: &Name) -> Result<Option<Self>> {
        let key = name.combined_value();
        store
            .get(&key)
            .map(|bytes| Self::decode(&key, &bytes))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::Modifier;

    #[test]
    fn test_round_trip_preserves_key_and_modifiers() {
        let stored = StoredShortcut {
            key: Some(Key::Space),
            modifiers: Modifiers::from([Modifier::Shift, Modifier::Option]),
            name: Name::with_prefix("toggle", "app."),
        };

        let bytes = stored.encode().unwrap();
        let back = StoredShortcut::decode("app.toggle", &bytes).unwrap();
        assert_eq!(back.key, Some(Key::Space));
        assert_eq!(back.modifiers, stored.modifiers);
        assert_eq!(back, stored);
    }

    #[test]
    fn test_field_names() {
        let stored = StoredShortcut {
            key: None,
            modifiers: Modifiers::empty(),
            name: Name::new("x"),
        };
        let json = String::from_utf8(stored.encode().unwrap()).unwrap();
        assert!(json.contains("\"key\":null"));
        assert!(json.contains("\"modifiers\":[]"));
        assert!(json.contains("\"name\""));
    }

    #[test]
    fn test_decode_garbage() {
        let err = StoredShortcut::decode("x", b"not json").unwrap_err();
        assert!(matches!(err, HotkeyError::DecodingFailed { .. }));
    }

    #[test]
    fn test_load_missing_entry() {
        let store = MemoryStore::new();
        let loaded = StoredShortcut::load(&store, &Name::new("absent")).unwrap();
        assert!(loaded.is_none());
    }
}
