use crate::models::{Location, Message};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// What caused a request to be issued.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Trigger {
    SubmitMessage,
    RegenerateMessage,
}

#[derive(Serialize, Debug, Clone)]
pub struct RequestBody {
    pub id: String,
    pub trigger: Trigger,
    pub messages: Vec<Message>,
    pub location: Option<Location>,
}

/// One event of the UI message stream, as carried on a `data:` line.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WireEvent {
    Start {
        #[serde(rename = "messageId", default)]
        message_id: Option<String>,
        #[serde(rename = "messageMetadata", default)]
        message_metadata: Option<Value>,
    },
    TextStart {
        id: String,
    },
    TextDelta {
        id: String,
        delta: String,
    },
    TextEnd {
        id: String,
    },
    ReasoningStart {
        id: String,
    },
    ReasoningDelta {
        id: String,
        delta: String,
    },
    ReasoningEnd {
        id: String,
    },
    MessageMetadata {
        #[serde(rename = "messageMetadata")]
        message_metadata: Value,
    },
    Finish {
        #[serde(rename = "finishReason", default)]
        finish_reason: Option<String>,
        #[serde(rename = "messageMetadata", default)]
        message_metadata: Option<Value>,
    },
    Abort {
        #[serde(default)]
        reason: Option<String>,
    },
    Error {
        #[serde(rename = "errorText")]
        error_text: String,
    },
    /// Step markers, tool events, sources, data parts.
    #[serde(other)]
    Ignored,
}

/// Metadata attached to the assistant message by the backend.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct FinishMetadata {
    #[serde(rename = "chatId", default)]
    pub chat_id: Option<String>,
    #[serde(rename = "isNewChat", default)]
    pub is_new_chat: Option<bool>,
}

impl FinishMetadata {
    /// Lenient: metadata of an unexpected shape carries nothing.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Fields present in `other` override ours.
    pub fn merge(&mut self, other: FinishMetadata) {
        if other.chat_id.is_some() {
            self.chat_id = other.chat_id;
        }
        if other.is_new_chat.is_some() {
            self.is_new_chat = other.is_new_chat;
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Text,
    Reasoning,
}

/// One increment of streamed content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub kind: ChunkKind,
    pub text: String,
    /// Stream block the increment belongs to; consecutive increments of one
    /// block grow the same part.
    pub block: Option<String>,
}

impl Chunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: ChunkKind::Text,
            text: text.into(),
            block: None,
        }
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            kind: ChunkKind::Reasoning,
            text: text.into(),
            block: None,
        }
    }

    pub fn in_block(mut self, block: impl Into<String>) -> Self {
        self.block = Some(block.into());
        self
    }
}

/// Decoded stream event, in the order the controller applies them.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    Start {
        message_id: Option<String>,
        metadata: FinishMetadata,
    },
    Chunk(Chunk),
    Metadata(FinishMetadata),
    Finish(FinishMetadata),
    /// Backend cancelled the generation.
    Abort,
    /// Backend reported a failure inside the stream.
    Error(String),
}

impl StreamEvent {
    /// Map a wire event; block lifecycle markers carry nothing to apply.
    pub fn from_wire(event: WireEvent) -> Option<Self> {
        match event {
            WireEvent::Start {
                message_id,
                message_metadata,
            } => Some(StreamEvent::Start {
                message_id,
                metadata: message_metadata
                    .as_ref()
                    .map(FinishMetadata::from_value)
                    .unwrap_or_default(),
            }),
            WireEvent::TextDelta { id, delta } => {
                Some(StreamEvent::Chunk(Chunk::text(delta).in_block(id)))
            }
            WireEvent::ReasoningDelta { id, delta } => {
                Some(StreamEvent::Chunk(Chunk::reasoning(delta).in_block(id)))
            }
            WireEvent::MessageMetadata { message_metadata } => Some(StreamEvent::Metadata(
                FinishMetadata::from_value(&message_metadata),
            )),
            WireEvent::Finish {
                finish_reason,
                message_metadata,
            } => {
                debug!(?finish_reason, "stream finish event");
                Some(StreamEvent::Finish(
                    message_metadata
                        .as_ref()
                        .map(FinishMetadata::from_value)
                        .unwrap_or_default(),
                ))
            }
            WireEvent::Abort { reason } => {
                debug!(?reason, "stream abort event");
                Some(StreamEvent::Abort)
            }
            WireEvent::Error { error_text } => Some(StreamEvent::Error(error_text)),
            WireEvent::TextStart { .. }
            | WireEvent::TextEnd { .. }
            | WireEvent::ReasoningStart { .. }
            | WireEvent::ReasoningEnd { .. }
            | WireEvent::Ignored => None,
        }
    }
}
