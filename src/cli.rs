use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chat")]
#[command(about = "Streaming chat client", long_about = None)]
pub struct Args {
    #[arg(
        long = "api-url",
        global = true,
        help = "Backend base URL (e.g., http://localhost:8000)"
    )]
    pub api_url: Option<String>,

    #[arg(
        long = "location",
        global = true,
        help = "Send a location with each request (format: lat,lon[,accuracy])"
    )]
    pub location: Option<String>,

    #[arg(
        long = "timeout",
        global = true,
        help = "Seconds to wait for stream data before giving up"
    )]
    pub stream_timeout: Option<u64>,

    #[arg(short = 'v', long = "verbose", global = true, help = "Verbose logging")]
    pub verbose: bool,

    #[arg(long = "clear-handoffs", help = "Discard all pending handed-off prompts")]
    pub clear_handoffs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a new chat with a first message
    New {
        #[arg(
            long = "detach",
            help = "Only hand the prompt off; print the chat id and exit"
        )]
        detach: bool,

        #[arg(required = true, help = "First message of the chat")]
        prompt: Vec<String>,
    },
    /// Open a chat, sending its handed-off prompt if one is waiting
    Open {
        #[arg(help = "Chat id")]
        id: String,
    },
    /// Play back a history file without sending anything
    View {
        #[arg(help = "JSON file with [{role, content}] entries")]
        history: PathBuf,
    },
}
