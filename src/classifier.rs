//! Maps a failed request onto the recovery the session should offer.
//!
//! The backend reports failures as free text, so the default rules are
//! keyword heuristics. They sit behind [`ErrorClassifier`] so a structured
//! error code can replace them without touching the session state machine.

use crate::error::ChatError;
use serde::Serialize;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Credentials are no longer valid; the user must sign in again.
    SessionExpired,
    /// Connectivity problem; retrying the same input may succeed.
    NetworkError,
    Generic,
}

pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, error: &ChatError) -> ErrorKind;
}

const SESSION_EXPIRED_TERMS: &[&str] = &["unauthorized", "401", "session", "authentication"];

const NETWORK_TERMS: &[&str] = &[
    "network",
    "fetch",
    "connection",
    "timeout",
    "timed out",
    "etimedout",
    "econnrefused",
    "econnreset",
];

/// Case-insensitive keyword matching over the error message.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

impl ErrorClassifier for KeywordClassifier {
    fn classify(&self, error: &ChatError) -> ErrorKind {
        let message = match error {
            ChatError::ApiError { status: 401, .. } => return ErrorKind::SessionExpired,
            ChatError::NetworkError(e) if e.status().map(|s| s.as_u16()) == Some(401) => {
                return ErrorKind::SessionExpired
            }
            // Match on the underlying error, not the "Network error" prefix.
            ChatError::NetworkError(e) => e.to_string(),
            other => other.to_string(),
        }
        .to_lowercase();
        if contains_any(&message, SESSION_EXPIRED_TERMS) {
            return ErrorKind::SessionExpired;
        }
        if error.is_transport_fault() || contains_any(&message, NETWORK_TERMS) {
            return ErrorKind::NetworkError;
        }
        ErrorKind::Generic
    }
}

fn contains_any(message: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| message.contains(term))
}
