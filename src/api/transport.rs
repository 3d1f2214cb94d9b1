use crate::api::models::{RequestBody, Trigger};
use crate::error::{ChatError, Result};
use crate::models::{truncate_messages, Location, Message, DEFAULT_CONTEXT_LIMIT};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::fmt;
use std::sync::Arc;

/// Source of the bearer token, asked once per request since tokens expire.
#[async_trait]
pub trait TokenSupplier: Send + Sync {
    /// `None` when no identity is available; the request goes out unauthenticated.
    async fn token(&self) -> Result<Option<String>>;
}

/// A fixed token, e.g. read from configuration.
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

#[async_trait]
impl TokenSupplier for StaticToken {
    async fn token(&self) -> Result<Option<String>> {
        Ok(self.0.clone())
    }
}

/// Builds request descriptors against one backend.
#[derive(Debug, Clone)]
pub struct TransportFactory {
    base_url: String,
    context_limit: usize,
}

impl TransportFactory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            context_limit: DEFAULT_CONTEXT_LIMIT,
        }
    }

    pub fn with_context_limit(mut self, limit: usize) -> Self {
        self.context_limit = limit.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build(
        &self,
        session_id: &str,
        token_supplier: Arc<dyn TokenSupplier>,
        location: Option<Location>,
    ) -> ChatTransport {
        ChatTransport {
            endpoint: format!("{}/api/v1/chat/{}", self.base_url, session_id),
            session_id: session_id.to_string(),
            token_supplier,
            location,
            context_limit: self.context_limit,
            generation: 0,
        }
    }
}

/// Request descriptor for one session. Rebuilt, never patched, when its
/// inputs change.
#[derive(Clone)]
pub struct ChatTransport {
    endpoint: String,
    session_id: String,
    token_supplier: Arc<dyn TokenSupplier>,
    location: Option<Location>,
    context_limit: usize,
    generation: u64,
}

impl ChatTransport {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Whether this descriptor was built from exactly these inputs.
    pub fn matches(
        &self,
        session_id: &str,
        token_supplier: &Arc<dyn TokenSupplier>,
        location: Option<Location>,
    ) -> bool {
        self.session_id == session_id
            && Arc::ptr_eq(&self.token_supplier, token_supplier)
            && self.location == location
    }

    /// Resolve headers for one request; the token is fetched every call.
    pub async fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = self.token_supplier.token().await? {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
                    ChatError::Other(format!("Invalid authorization header: {}", e))
                })?,
            );
        }

        Ok(headers)
    }

    pub fn body(&self, messages: &[Message], trigger: Trigger) -> RequestBody {
        RequestBody {
            id: self.session_id.clone(),
            trigger,
            messages: truncate_messages(messages, self.context_limit).to_vec(),
            location: self.location,
        }
    }
}

impl fmt::Debug for ChatTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatTransport")
            .field("endpoint", &self.endpoint)
            .field("location", &self.location)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
