use crate::models::DEFAULT_CONTEXT_LIMIT;
use crate::session::DEFAULT_STREAM_TIMEOUT_SECS;

pub fn default_stream_timeout() -> u64 {
    DEFAULT_STREAM_TIMEOUT_SECS
}

pub fn default_context_limit() -> usize {
    DEFAULT_CONTEXT_LIMIT
}

pub fn default_accuracy() -> f64 {
    0.0
}
