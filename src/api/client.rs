use crate::api::models::RequestBody;
use crate::api::streaming::{decode_event_stream, EventStream};
use crate::api::transport::ChatTransport;
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use tracing::debug;

/// Where the controller sends requests. The HTTP implementation is the
/// production one; tests script their own.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Issue one request and return its decoded response events.
    async fn open_stream(&self, transport: &ChatTransport, body: RequestBody)
        -> Result<EventStream>;
}

pub struct HttpBackend {
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn open_stream(
        &self,
        transport: &ChatTransport,
        body: RequestBody,
    ) -> Result<EventStream> {
        let headers = transport.headers().await?;

        debug!(
            endpoint = transport.endpoint(),
            messages = body.messages.len(),
            "opening chat stream"
        );
        let response = self
            .client
            .post(transport.endpoint())
            .headers(headers)
            .json(&body)
            .send()
            .await?;

        debug!(status = %response.status(), "chat stream response");

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChatError::ApiError {
                status,
                message: error_text,
            });
        }

        Ok(decode_event_stream(response.bytes_stream()))
    }
}
