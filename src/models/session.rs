use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    /// Idle and accepting input.
    #[default]
    Ready,
    /// Request issued, nothing received yet.
    Submitted,
    Streaming,
    /// Last operation failed; new sends are still accepted.
    Error,
}

impl ChatStatus {
    /// Whether a request is in flight.
    pub fn is_busy(self) -> bool {
        matches!(self, ChatStatus::Submitted | ChatStatus::Streaming)
    }
}

impl fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChatStatus::Ready => "ready",
            ChatStatus::Submitted => "submitted",
            ChatStatus::Streaming => "streaming",
            ChatStatus::Error => "error",
        };
        f.write_str(name)
    }
}
