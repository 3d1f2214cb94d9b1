use std::fmt;

#[derive(Debug)]
pub enum ChatError {
    ApiError {
        status: u16,
        message: String,
    },
    ConfigError(String),
    HandoffError(String),
    NetworkError(reqwest::Error),
    Timeout,
    /// Error reported by the backend inside the response stream.
    StreamError(String),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
    YamlError(serde_yaml::Error),
    Other(String),
}

impl ChatError {
    /// Whether the failure happened below the HTTP layer (connect, read, stall).
    pub fn is_transport_fault(&self) -> bool {
        match self {
            ChatError::NetworkError(e) => !e.is_status() && !e.is_decode(),
            ChatError::Timeout | ChatError::IoError(_) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::ApiError { status, message } => {
                write!(f, "API error (status {}): {}", status, message)
            }
            ChatError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            ChatError::HandoffError(msg) => write!(f, "Handoff error: {}", msg),
            ChatError::NetworkError(e) => write!(f, "Network error: {}", e),
            ChatError::Timeout => write!(f, "Request timeout"),
            ChatError::StreamError(msg) => write!(f, "{}", msg),
            ChatError::IoError(e) => write!(f, "IO error: {}", e),
            ChatError::JsonError(e) => write!(f, "JSON error: {}", e),
            ChatError::YamlError(e) => write!(f, "YAML error: {}", e),
            ChatError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ChatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChatError::NetworkError(e) => Some(e),
            ChatError::IoError(e) => Some(e),
            ChatError::JsonError(e) => Some(e),
            ChatError::YamlError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::NetworkError(err)
    }
}

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        ChatError::IoError(err)
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::JsonError(err)
    }
}

impl From<serde_yaml::Error> for ChatError {
    fn from(err: serde_yaml::Error) -> Self {
        ChatError::YamlError(err)
    }
}

impl From<anyhow::Error> for ChatError {
    fn from(err: anyhow::Error) -> Self {
        ChatError::Other(err.to_string())
    }
}

impl From<String> for ChatError {
    fn from(msg: String) -> Self {
        ChatError::Other(msg)
    }
}

impl From<&str> for ChatError {
    fn from(msg: &str) -> Self {
        ChatError::Other(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
