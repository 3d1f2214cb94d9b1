use super::storage::PromptStore;
use crate::error::{ChatError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// In-process store. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryPromptStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryPromptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| ChatError::HandoffError("prompt store lock poisoned".to_string()))
    }
}

impl PromptStore for MemoryPromptStore {
    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn take(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.remove(key))
    }

    fn contains(&self, key: &str) -> bool {
        self.lock()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
}
