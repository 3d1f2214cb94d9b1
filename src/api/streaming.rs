use crate::api::models::{StreamEvent, WireEvent};
use crate::error::{ChatError, Result};
use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::collections::VecDeque;
use tracing::debug;

/// Decoded events of one response, in delivery order.
pub type EventStream = BoxStream<'static, Result<StreamEvent>>;

/// Incremental decoder for a server-sent event body carrying UI stream JSON.
///
/// Bytes may arrive split anywhere, including inside a multi-byte character;
/// only complete lines are decoded.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    incomplete_line: Vec<u8>,
    done: bool,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once `data: [DONE]` has been seen; later bytes are ignored.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        if self.done {
            return Vec::new();
        }
        self.incomplete_line.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(line_end) = self.incomplete_line.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.incomplete_line.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            if let Some(event) = self.process_line(line.trim_end_matches('\r')) {
                events.push(event);
            }
            if self.done {
                self.incomplete_line.clear();
                break;
            }
        }
        events
    }

    /// Flush a final line that was not newline-terminated.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.done || self.incomplete_line.is_empty() {
            return Vec::new();
        }
        let line = std::mem::take(&mut self.incomplete_line);
        let line = String::from_utf8_lossy(&line);
        self.process_line(line.trim_end_matches('\r'))
            .into_iter()
            .collect()
    }

    fn process_line(&mut self, line: &str) -> Option<StreamEvent> {
        if line.is_empty() || line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.find(':') {
            Some(colon_pos) => (line[..colon_pos].trim(), line[colon_pos + 1..].trim_start()),
            None => (line.trim(), ""),
        };

        match field {
            "data" => {
                if value == "[DONE]" {
                    self.done = true;
                    return None;
                }
                match serde_json::from_str::<WireEvent>(value) {
                    Ok(event) => StreamEvent::from_wire(event),
                    Err(e) => {
                        debug!(error = %e, "skipping malformed stream event");
                        None
                    }
                }
            }
            "event" | "id" | "retry" => {
                debug!(field, value, "sse field");
                None
            }
            _ => {
                debug!(field, "unknown sse field");
                None
            }
        }
    }
}

struct DecodeState {
    bytes: BoxStream<'static, Result<Bytes>>,
    decoder: EventStreamDecoder,
    pending: VecDeque<StreamEvent>,
    exhausted: bool,
}

/// Adapt a raw body stream into decoded events. A transport error ends the
/// stream after being yielded.
pub fn decode_event_stream<S, E>(bytes: S) -> EventStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<ChatError> + 'static,
{
    let state = DecodeState {
        bytes: bytes.map(|chunk| chunk.map_err(Into::into)).boxed(),
        decoder: EventStreamDecoder::new(),
        pending: VecDeque::new(),
        exhausted: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((Ok(event), state));
            }
            if state.exhausted || state.decoder.is_done() {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.feed(&chunk);
                    state.pending.extend(events);
                }
                Some(Err(e)) => {
                    state.exhausted = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.exhausted = true;
                    let events = state.decoder.finish();
                    state.pending.extend(events);
                }
            }
        }
    })
    .boxed()
}
