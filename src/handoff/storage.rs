use crate::error::Result;

/// Ephemeral keyed store backing the prompt handoff.
pub trait PromptStore: Send + Sync {
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Read and remove the entry in one step; at most one caller gets it.
    fn take(&self, key: &str) -> Result<Option<String>>;

    fn contains(&self, key: &str) -> bool;

    /// Drop every entry.
    fn clear(&self) -> Result<()>;
}
