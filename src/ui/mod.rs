mod output;

pub use output::{display_delta, display_message, display_notice, format_delta, format_part, role_label};
