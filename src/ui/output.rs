use crate::api::ChunkKind;
use crate::models::{Message, Part, Role};
use crate::session::Notice;
use colored::*;
use std::io::{self, Write};

/// Format one part for the terminal.
pub fn format_part(part: &Part) -> String {
    match part {
        Part::Text { text } => text.clone(),
        Part::Reasoning { text } => {
            // Clean up markdown formatting for display
            let reasoning = text.replace("**", "").trim().to_string();
            format!("[reasoning] {}", reasoning).dimmed().to_string()
        }
        Part::File { url, media_type } => format!("[file {}] {}", media_type, url).cyan().to_string(),
    }
}

pub fn role_label(role: Role) -> ColoredString {
    match role {
        Role::User => "you".green().bold(),
        Role::Assistant => "assistant".cyan().bold(),
        Role::System => "system".yellow().bold(),
    }
}

/// Display a whole message, parts in order.
pub fn display_message(message: &Message) {
    println!("{}", role_label(message.role));
    for part in &message.parts {
        let formatted = format_part(part);
        if !formatted.is_empty() {
            println!("{}", formatted);
        }
    }
    println!();
}

/// Render a streamed increment. `part` is its index in the message; a new
/// reasoning part is always labelled.
pub fn format_delta(kind: ChunkKind, delta: &str, part: usize, new_part: bool) -> String {
    let separator = if new_part && part > 0 { "\n" } else { "" };
    match kind {
        ChunkKind::Text => format!("{}{}", separator, delta),
        ChunkKind::Reasoning if new_part => {
            format!("{}{}{}", separator, "[reasoning] ".dimmed(), delta.dimmed())
        }
        ChunkKind::Reasoning => delta.dimmed().to_string(),
    }
}

/// Print a streamed increment as it arrives.
pub fn display_delta(
    kind: ChunkKind,
    delta: &str,
    part: usize,
    new_part: bool,
) -> io::Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", format_delta(kind, delta, part, new_part))?;
    stdout.flush()
}

pub fn display_notice(notice: &Notice) {
    eprintln!("{}", notice.message().red());
    if notice.is_retryable() {
        eprintln!("{}", "Type /retry to send your last message again.".dimmed());
    }
}
