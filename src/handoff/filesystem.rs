use super::storage::PromptStore;
use crate::error::{ChatError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One JSON file per key under a cache directory, so a prompt published by
/// one process can be picked up by the next.
pub struct FilesystemPromptStore {
    dir: PathBuf,
}

impl FilesystemPromptStore {
    /// Store under the user cache directory (`~/.cache/streamchat/handoff`).
    pub fn new() -> Result<Self> {
        let cache_dir = dirs::cache_dir().ok_or_else(|| {
            ChatError::HandoffError("could not determine cache directory".to_string())
        })?;
        Ok(Self::with_dir(cache_dir.join("streamchat").join("handoff")))
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ChatError::HandoffError(format!("invalid handoff key: {}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }
}

impl PromptStore for FilesystemPromptStore {
    fn put(&self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        self.ensure_dir()?;
        fs::write(path, value)?;
        Ok(())
    }

    fn take(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key)?;

        // Claim the entry with a rename first; only one process can win it.
        let claimed = self.dir.join(format!("{}.{}.taken", key, Uuid::new_v4()));
        match fs::rename(&path, &claimed) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let content = fs::read_to_string(&claimed);
        let _ = fs::remove_file(&claimed);
        Ok(Some(content?))
    }

    fn contains(&self, key: &str) -> bool {
        self.entry_path(key)
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    fn clear(&self) -> Result<()> {
        if let Ok(entries) = fs::read_dir(&self.dir) {
            for entry in entries.filter_map(|e| e.ok()) {
                let path = entry.path();
                if path.is_file() {
                    fs::remove_file(path)?;
                }
            }
        }
        Ok(())
    }
}
