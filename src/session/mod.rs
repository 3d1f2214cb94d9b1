mod controller;
mod hooks;

pub use controller::{ChatController, SessionUpdate, DEFAULT_STREAM_TIMEOUT_SECS};
pub use hooks::{NoopHooks, Notice, Route, SessionHooks};
