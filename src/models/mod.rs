mod location;
mod message;
mod part;
mod session;

pub use location::Location;
pub use message::{truncate_messages, HistoryEntry, Message, Role, DEFAULT_CONTEXT_LIMIT};
pub use part::Part;
pub use session::ChatStatus;
