use crate::classifier::ErrorKind;

/// User-visible notification raised by a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    SessionExpired { message: String },
    /// Offers a retry; the collaborator calls `ChatController::retry`.
    NetworkError { message: String },
    Failed { message: String },
}

impl Notice {
    pub(crate) fn for_failure(kind: ErrorKind, detail: &str) -> Self {
        match kind {
            ErrorKind::SessionExpired => Notice::SessionExpired {
                message: "Session expired. Redirecting to login...".to_string(),
            },
            ErrorKind::NetworkError => Notice::NetworkError {
                message: "Network error. Please check your connection.".to_string(),
            },
            ErrorKind::Generic => Notice::Failed {
                message: if detail.trim().is_empty() {
                    "An error occurred while sending message".to_string()
                } else {
                    detail.to_string()
                },
            },
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Notice::SessionExpired { message }
            | Notice::NetworkError { message }
            | Notice::Failed { message } => message,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Notice::NetworkError { .. })
    }
}

/// Where the collaborator should take the user next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    SignIn,
    /// Replace the current location with this chat id.
    Chat(String),
}

/// Callbacks from a controller to the page that owns it.
pub trait SessionHooks: Send {
    fn notify(&mut self, _notice: Notice) {}

    fn navigate(&mut self, _route: Route) {}

    /// Every successful stream completion.
    fn on_finish(&mut self) {}

    /// The deferred prompt was dispatched (not necessarily answered).
    fn on_initial_prompt_sent(&mut self) {}
}

pub struct NoopHooks;

impl SessionHooks for NoopHooks {}
