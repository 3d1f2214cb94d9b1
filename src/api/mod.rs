pub mod client;
pub mod models;
pub mod streaming;
pub mod transport;

pub use client::{ChatBackend, HttpBackend};
pub use models::{Chunk, ChunkKind, FinishMetadata, RequestBody, StreamEvent, Trigger};
pub use streaming::{decode_event_stream, EventStream, EventStreamDecoder};
pub use transport::{ChatTransport, StaticToken, TokenSupplier, TransportFactory};
