//! In-memory preference store

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::PreferenceStore;
use crate::error::Result;

/// Preference store kept in memory; clones share the same entries
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        self.entries.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
