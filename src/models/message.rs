use super::part::Part;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of most recent messages sent to the backend with each request.
pub const DEFAULT_CONTEXT_LIMIT: usize = 50;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub parts: Vec<Part>,
}

/// A turn as the backend stores it: a role and a flat content string.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HistoryEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        let mut message = Self {
            id: Uuid::new_v4().to_string(),
            role,
            parts,
        };
        message.normalize_parts();
        message
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }

    /// An assistant turn with no content yet; holds the empty placeholder part.
    pub fn assistant(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Assistant,
            parts: vec![Part::text("")],
        }
    }

    pub fn from_history(entry: HistoryEntry) -> Self {
        Self {
            id: entry.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            role: entry.role,
            parts: vec![Part::text(entry.content)],
        }
    }

    /// A message never has zero parts.
    pub fn normalize_parts(&mut self) {
        if self.parts.is_empty() {
            self.parts.push(Part::text(""));
        }
    }

    /// True while the message only holds the empty placeholder part.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.parts.as_slice(), [Part::Text { text }] if text.is_empty())
    }

    /// Concatenated answer text, reasoning excluded.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Keep only the `limit` most recent messages, in their original order.
pub fn truncate_messages(messages: &[Message], limit: usize) -> &[Message] {
    if messages.len() <= limit {
        messages
    } else {
        &messages[messages.len() - limit..]
    }
}
