use std::collections::HashMap;
use std::sync::RwLock;

use super::{KvStore, StoreError};

/// In-process store. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a key, typically with a JSON fixture.
    pub fn with_entry(self, key: &str, value: impl Into<Vec<u8>>) -> Self {
        if let Ok(mut map) = self.entries.write() {
            map.insert(key.to_string(), value.into());
        }
        self
    }
}

impl KvStore for MemoryKvStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let map = self
            .entries
            .read()
            .map_err(|e| StoreError::Unavailable(format!("memory store lock: {e}")))?;
        Ok(map.get(key).cloned())
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut map = self
            .entries
            .write()
            .map_err(|e| StoreError::Unavailable(format!("memory store lock: {e}")))?;
        map.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
