use super::hooks::{NoopHooks, Notice, Route, SessionHooks};
use crate::api::models::{Chunk, ChunkKind, FinishMetadata, RequestBody, StreamEvent, Trigger};
use crate::api::{ChatBackend, ChatTransport, StaticToken, TokenSupplier, TransportFactory};
use crate::classifier::{ErrorClassifier, ErrorKind, KeywordClassifier};
use crate::error::{ChatError, Result};
use crate::models::{ChatStatus, Location, Message, Part, Role};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DEFAULT_STREAM_TIMEOUT_SECS: u64 = 30;

/// What applying one streamed event changed.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// The event carried nothing visible (message start, metadata).
    Pending,
    Part {
        message: usize,
        part: usize,
        kind: ChunkKind,
        delta: String,
        new_part: bool,
    },
    Finished {
        migrated_to: Option<String>,
    },
    /// The backend cancelled the generation.
    Aborted,
    Failed {
        kind: ErrorKind,
        message: String,
    },
}

#[derive(Debug, Clone)]
struct LastSent {
    content: String,
}

/// The in-flight request. Dropping it cancels the network task.
struct ActiveRequest {
    events: mpsc::UnboundedReceiver<Result<StreamEvent>>,
    task: JoinHandle<()>,
    /// Index of the assistant message this request is filling.
    assistant: Option<usize>,
    message_id: Option<String>,
    metadata: FinishMetadata,
    /// Kind and block id of the part currently growing.
    open_block: Option<(ChunkKind, String)>,
}

impl Drop for ActiveRequest {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Owns one chat: its messages, its status, and the request in flight.
pub struct ChatController {
    id: String,
    messages: Vec<Message>,
    status: ChatStatus,
    read_only: bool,
    backend: Arc<dyn ChatBackend>,
    factory: TransportFactory,
    token_supplier: Arc<dyn TokenSupplier>,
    location: Option<Location>,
    transport: ChatTransport,
    classifier: Box<dyn ErrorClassifier>,
    hooks: Box<dyn SessionHooks>,
    stream_timeout: Duration,
    last_sent: Option<LastSent>,
    initial_prompt: Option<String>,
    initial_prompt_sent: bool,
    active: Option<ActiveRequest>,
    last_error: Option<(ErrorKind, String)>,
}

impl ChatController {
    pub fn new(
        id: impl Into<String>,
        backend: Arc<dyn ChatBackend>,
        factory: TransportFactory,
    ) -> Self {
        let id = id.into();
        let token_supplier: Arc<dyn TokenSupplier> = Arc::new(StaticToken::anonymous());
        let transport = factory.build(&id, token_supplier.clone(), None);
        Self {
            id,
            messages: Vec::new(),
            status: ChatStatus::Ready,
            read_only: false,
            backend,
            factory,
            token_supplier,
            location: None,
            transport,
            classifier: Box::new(KeywordClassifier),
            hooks: Box::new(NoopHooks),
            stream_timeout: Duration::from_secs(DEFAULT_STREAM_TIMEOUT_SECS),
            last_sent: None,
            initial_prompt: None,
            initial_prompt_sent: false,
            active: None,
            last_error: None,
        }
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = normalized(messages);
        self
    }

    pub fn with_token_supplier(mut self, token_supplier: Arc<dyn TokenSupplier>) -> Self {
        self.set_token_supplier(token_supplier);
        self
    }

    pub fn with_location(mut self, location: Option<Location>) -> Self {
        self.set_location(location);
        self
    }

    pub fn with_hooks(mut self, hooks: Box<dyn SessionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_classifier(mut self, classifier: Box<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_stream_timeout(mut self, stream_timeout: Duration) -> Self {
        self.stream_timeout = stream_timeout;
        self
    }

    /// Prompt handed off by the page that created this chat. Sent once by
    /// [`poll_initial_prompt`](Self::poll_initial_prompt).
    pub fn with_initial_prompt(mut self, prompt: Option<String>) -> Self {
        self.initial_prompt = prompt;
        self
    }

    /// A read-only chat only plays back its messages.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn status(&self) -> ChatStatus {
        self.status
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn transport(&self) -> &ChatTransport {
        &self.transport
    }

    pub fn last_error(&self) -> Option<(ErrorKind, &str)> {
        self.last_error
            .as_ref()
            .map(|(kind, message)| (*kind, message.as_str()))
    }

    pub fn can_retry(&self) -> bool {
        self.last_sent.is_some()
    }

    /// Append a user turn and request a reply. Returns whether a request was
    /// issued.
    pub fn send(&mut self, text: &str) -> bool {
        if self.read_only {
            debug!(session_id = %self.id, "send ignored on read-only chat");
            return false;
        }
        if self.status.is_busy() {
            debug!(session_id = %self.id, status = %self.status, "send ignored while busy");
            return false;
        }
        if text.trim().is_empty() {
            return false;
        }

        self.last_sent = Some(LastSent {
            content: text.to_string(),
        });
        self.messages.push(Message::user_text(text));
        self.issue(Trigger::SubmitMessage);
        true
    }

    /// Cancel the request in flight. Content received so far stays.
    pub fn stop(&mut self) -> bool {
        if self.read_only {
            return false;
        }
        let Some(active) = self.active.take() else {
            return false;
        };
        drop(active);

        info!(session_id = %self.id, "chat request stopped");
        self.enter_ready();
        true
    }

    /// Drop the latest assistant reply and ask for a new one.
    pub fn regenerate(&mut self) -> bool {
        if self.read_only || self.status.is_busy() {
            return false;
        }
        let keep = match self.messages.last() {
            Some(last) if last.role == Role::Assistant => self.messages.len() - 1,
            _ => self.messages.len(),
        };
        if keep == 0 {
            return false;
        }

        self.messages.truncate(keep);
        self.issue(Trigger::RegenerateMessage);
        true
    }

    /// Send the last submitted content again as a new user turn.
    pub fn retry(&mut self) -> bool {
        let Some(last_sent) = self.last_sent.clone() else {
            return false;
        };
        self.send(&last_sent.content)
    }

    /// Replace the whole history, e.g. after loading it from the backend.
    /// A request in flight is cancelled first.
    pub fn set_messages(&mut self, messages: Vec<Message>) {
        if self.active.take().is_some() {
            self.status = ChatStatus::Ready;
        }
        self.messages = normalized(messages);
    }

    pub fn set_location(&mut self, location: Option<Location>) {
        if self.location != location {
            self.location = location;
            self.rebuild_transport();
        }
    }

    pub fn set_token_supplier(&mut self, token_supplier: Arc<dyn TokenSupplier>) {
        if !Arc::ptr_eq(&self.token_supplier, &token_supplier) {
            self.token_supplier = token_supplier;
            self.rebuild_transport();
        }
    }

    /// Send the deferred prompt if it is due. Safe to call any number of
    /// times; the prompt goes out at most once.
    pub fn poll_initial_prompt(&mut self) -> bool {
        if self.initial_prompt_sent || self.read_only || self.status != ChatStatus::Ready {
            return false;
        }
        let Some(prompt) = self.initial_prompt.clone() else {
            return false;
        };

        self.initial_prompt_sent = true;
        let dispatched = self.send(&prompt);
        if dispatched {
            info!(session_id = %self.id, "initial prompt sent");
            self.hooks.on_initial_prompt_sent();
        }
        dispatched
    }

    /// Wait for and apply the next event of the request in flight. `None`
    /// when nothing is in flight.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        let received = self.active.as_mut()?.events.recv().await;
        let update = match received {
            Some(Ok(event)) => self.apply_event(event),
            Some(Err(error)) => self.fail(error),
            None => self.complete(FinishMetadata::default()),
        };
        Some(update)
    }

    /// Apply events until no request is in flight.
    pub async fn run_until_settled(&mut self) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        while let Some(update) = self.next_update().await {
            updates.push(update);
        }
        updates
    }

    fn issue(&mut self, trigger: Trigger) {
        let body = self.transport.body(&self.messages, trigger);
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(pump_stream(
            self.backend.clone(),
            self.transport.clone(),
            body,
            self.stream_timeout,
            tx,
        ));

        self.active = Some(ActiveRequest {
            events: rx,
            task,
            assistant: None,
            message_id: None,
            metadata: FinishMetadata::default(),
            open_block: None,
        });
        self.last_error = None;
        self.status = ChatStatus::Submitted;
        debug!(session_id = %self.id, ?trigger, messages = self.messages.len(), "chat request issued");
    }

    fn apply_event(&mut self, event: StreamEvent) -> SessionUpdate {
        match event {
            StreamEvent::Start {
                message_id,
                metadata,
            } => {
                if let Some(active) = self.active.as_mut() {
                    if active.assistant.is_none() && message_id.is_some() {
                        active.message_id = message_id;
                    }
                    active.metadata.merge(metadata);
                }
                SessionUpdate::Pending
            }
            StreamEvent::Metadata(metadata) => {
                if let Some(active) = self.active.as_mut() {
                    active.metadata.merge(metadata);
                }
                SessionUpdate::Pending
            }
            StreamEvent::Chunk(chunk) => self.apply_chunk(chunk),
            StreamEvent::Finish(metadata) => self.complete(metadata),
            StreamEvent::Abort => {
                self.active = None;
                info!(session_id = %self.id, "chat request aborted by backend");
                self.enter_ready();
                SessionUpdate::Aborted
            }
            StreamEvent::Error(text) => self.fail(ChatError::StreamError(text)),
        }
    }

    fn apply_chunk(&mut self, chunk: Chunk) -> SessionUpdate {
        let Some(active) = self.active.as_mut() else {
            return SessionUpdate::Pending;
        };

        let message_index = match active.assistant {
            Some(index) => index,
            None => {
                let id = active
                    .message_id
                    .take()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                self.messages.push(Message {
                    id,
                    role: Role::Assistant,
                    parts: Vec::new(),
                });
                let index = self.messages.len() - 1;
                active.assistant = Some(index);
                index
            }
        };

        if self.status == ChatStatus::Submitted {
            self.status = ChatStatus::Streaming;
            debug!(session_id = %self.id, "first chunk received");
        }

        let parts = &mut self.messages[message_index].parts;
        let continues_block = match (&chunk.block, &active.open_block) {
            (Some(block), Some((kind, open))) => *kind == chunk.kind && block == open,
            _ => false,
        } && !parts.is_empty();

        let new_part = if continues_block {
            if let Some(Part::Text { text } | Part::Reasoning { text }) = parts.last_mut() {
                text.push_str(&chunk.text);
            }
            false
        } else {
            parts.push(match chunk.kind {
                ChunkKind::Text => Part::text(chunk.text.clone()),
                ChunkKind::Reasoning => Part::reasoning(chunk.text.clone()),
            });
            active.open_block = chunk.block.map(|block| (chunk.kind, block));
            true
        };

        SessionUpdate::Part {
            message: message_index,
            part: parts.len() - 1,
            kind: chunk.kind,
            delta: chunk.text,
            new_part,
        }
    }

    fn complete(&mut self, metadata: FinishMetadata) -> SessionUpdate {
        let mut collected = FinishMetadata::default();
        if let Some(active) = self.active.take() {
            collected = active.metadata.clone();
        }
        collected.merge(metadata);

        let migrated_to = match collected.chat_id {
            Some(chat_id) if collected.is_new_chat == Some(true) && chat_id != self.id => {
                self.migrate_identity(chat_id.clone());
                Some(chat_id)
            }
            _ => None,
        };

        debug!(session_id = %self.id, messages = self.messages.len(), "chat stream finished");
        self.hooks.on_finish();
        self.enter_ready();
        SessionUpdate::Finished { migrated_to }
    }

    /// Take on the id the backend assigned. Messages stay as they are.
    fn migrate_identity(&mut self, chat_id: String) {
        info!(from = %self.id, to = %chat_id, "chat id reassigned by backend");
        self.id = chat_id.clone();
        self.rebuild_transport();
        self.hooks.navigate(Route::Chat(chat_id));
    }

    fn fail(&mut self, error: ChatError) -> SessionUpdate {
        self.active = None;

        let kind = self.classifier.classify(&error);
        let message = error.to_string();
        warn!(session_id = %self.id, error = %message, ?kind, "chat request failed");

        self.status = ChatStatus::Error;
        self.last_error = Some((kind, message.clone()));
        self.hooks.notify(Notice::for_failure(kind, &message));
        if kind == ErrorKind::SessionExpired {
            self.hooks.navigate(Route::SignIn);
        }

        SessionUpdate::Failed { kind, message }
    }

    fn enter_ready(&mut self) {
        self.status = ChatStatus::Ready;
        self.poll_initial_prompt();
    }

    fn rebuild_transport(&mut self) {
        let generation = self.transport.generation() + 1;
        self.transport = self
            .factory
            .build(&self.id, self.token_supplier.clone(), self.location)
            .with_generation(generation);
        debug!(session_id = %self.id, generation, "transport rebuilt");
    }
}

fn normalized(mut messages: Vec<Message>) -> Vec<Message> {
    for message in &mut messages {
        message.normalize_parts();
    }
    messages
}

fn is_terminal(event: &StreamEvent) -> bool {
    matches!(
        event,
        StreamEvent::Finish(_) | StreamEvent::Abort | StreamEvent::Error(_)
    )
}

/// Network side of a request: open the stream and forward its events until
/// it ends, fails, stalls, or the controller hangs up.
async fn pump_stream(
    backend: Arc<dyn ChatBackend>,
    transport: ChatTransport,
    body: RequestBody,
    chunk_timeout: Duration,
    tx: mpsc::UnboundedSender<Result<StreamEvent>>,
) {
    let mut stream = match timeout(chunk_timeout, backend.open_stream(&transport, body)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            let _ = tx.send(Err(e));
            return;
        }
        Err(_) => {
            let _ = tx.send(Err(ChatError::Timeout));
            return;
        }
    };

    loop {
        match timeout(chunk_timeout, stream.next()).await {
            Ok(Some(Ok(event))) => {
                let terminal = is_terminal(&event);
                if tx.send(Ok(event)).is_err() || terminal {
                    return;
                }
            }
            Ok(Some(Err(e))) => {
                let _ = tx.send(Err(e));
                return;
            }
            Ok(None) => return,
            Err(_) => {
                warn!(
                    endpoint = transport.endpoint(),
                    timeout_secs = chunk_timeout.as_secs(),
                    "no data received before timeout"
                );
                let _ = tx.send(Err(ChatError::Timeout));
                return;
            }
        }
    }
}
