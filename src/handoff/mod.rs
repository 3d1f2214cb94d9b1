//! One-time transfer of a user's first message into a freshly created session.
//!
//! The origin publishes under a new session id; the session consumes it once
//! when it opens. Entries are removed on every consume, whatever the outcome.

mod filesystem;
mod memory;
mod storage;

pub use filesystem::FilesystemPromptStore;
pub use memory::MemoryPromptStore;
pub use storage::PromptStore;

use crate::error::{ChatError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Prompts older than this are discarded unread.
pub const HANDOFF_TTL_MINUTES: i64 = 5;

pub fn handoff_key(session_id: &str) -> String {
    format!("chat-initial-{}", session_id)
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PendingPrompt {
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl PendingPrompt {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.created_at() {
            Some(created_at) => now - created_at > Duration::minutes(HANDOFF_TTL_MINUTES),
            None => true,
        }
    }
}

#[derive(Debug)]
enum HandoffOutcome {
    Delivered(String),
    Missing,
    Expired,
    Corrupt,
}

pub struct PromptHandoff<S: PromptStore> {
    store: S,
}

impl<S: PromptStore> PromptHandoff<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn publish(&self, session_id: &str, content: &str) -> Result<()> {
        self.publish_at(session_id, content, Utc::now())
    }

    pub fn publish_at(
        &self,
        session_id: &str,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::HandoffError(
                "cannot hand off an empty prompt".to_string(),
            ));
        }

        let record = PendingPrompt {
            content: content.to_string(),
            timestamp: created_at.timestamp_millis(),
        };
        self.store
            .put(&handoff_key(session_id), &serde_json::to_string(&record)?)?;
        debug!(session_id, "published pending prompt");
        Ok(())
    }

    /// Take the pending prompt for `session_id`, if one is present and fresh.
    pub fn consume(&self, session_id: &str) -> Option<String> {
        self.consume_at(session_id, Utc::now())
    }

    pub fn consume_at(&self, session_id: &str, now: DateTime<Utc>) -> Option<String> {
        let outcome = match self.store.take(&handoff_key(session_id)) {
            Ok(Some(raw)) => match serde_json::from_str::<PendingPrompt>(&raw) {
                Ok(prompt) if prompt.is_expired_at(now) => HandoffOutcome::Expired,
                Ok(prompt) => HandoffOutcome::Delivered(prompt.content),
                Err(_) => HandoffOutcome::Corrupt,
            },
            Ok(None) => HandoffOutcome::Missing,
            Err(e) => {
                warn!(session_id, error = %e, "failed to read pending prompt");
                HandoffOutcome::Corrupt
            }
        };

        match outcome {
            HandoffOutcome::Delivered(content) => {
                debug!(session_id, "consumed pending prompt");
                Some(content)
            }
            other => {
                debug!(session_id, outcome = ?other, "no pending prompt");
                None
            }
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.store.clear()
    }
}
