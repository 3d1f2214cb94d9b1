use clap::Parser;
use colored::*;
use std::fs;
use std::path::Path;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use streamchat::api::{HttpBackend, StaticToken, TokenSupplier, TransportFactory};
use streamchat::cli::{Args, Command};
use streamchat::config::{Config, JsonConfig};
use streamchat::error::{ChatError, Result};
use streamchat::handoff::{FilesystemPromptStore, PromptHandoff};
use streamchat::models::{HistoryEntry, Message};
use streamchat::session::{ChatController, Notice, Route, SessionHooks, SessionUpdate};
use streamchat::ui::{display_delta, display_message, display_notice};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let file_verbose = JsonConfig::load()
        .ok()
        .and_then(|config| config.session.verbose)
        .unwrap_or(false);
    init_tracing(args.verbose || file_verbose);

    if let Err(e) = run(args).await {
        eprintln!("{} {}", "Error:".red(), e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<()> {
    let handoff = PromptHandoff::new(FilesystemPromptStore::new()?);

    if args.clear_handoffs {
        handoff.clear()?;
        println!("{}", "All pending prompts cleared.".green());
        if args.command.is_none() {
            return Ok(());
        }
    }

    let Some(command) = args.command.as_ref() else {
        print_usage();
        process::exit(1);
    };

    match command {
        Command::New { detach, prompt } => {
            let config = Config::from_env_and_args(&args)?;
            let id = Uuid::new_v4().to_string();
            handoff.publish(&id, &prompt.join(" "))?;

            if *detach {
                println!("{}", id);
                eprintln!("{}", format!("Open it with: chat open {}", id).dimmed());
                return Ok(());
            }
            open_chat(&config, &handoff, &id).await
        }
        Command::Open { id } => {
            let config = Config::from_env_and_args(&args)?;
            open_chat(&config, &handoff, id).await
        }
        Command::View { history } => view_history(history, args.api_url.as_deref()),
    }
}

fn print_usage() {
    eprintln!("{}", "Usage: chat [OPTIONS] <COMMAND>".red());
    eprintln!("{}", "  new <prompt>      Start a new chat with a first message".dimmed());
    eprintln!("{}", "  open <id>         Open a chat".dimmed());
    eprintln!("{}", "  view <history>    Play back a history file".dimmed());
    eprintln!("{}", "      --clear-handoffs  Discard pending handed-off prompts".dimmed());
}

/// Prints notices as they happen and remembers whether the user must sign in.
struct TerminalHooks {
    sign_in_required: Arc<AtomicBool>,
}

impl SessionHooks for TerminalHooks {
    fn notify(&mut self, notice: Notice) {
        println!();
        display_notice(&notice);
    }

    fn navigate(&mut self, route: Route) {
        match route {
            Route::SignIn => {
                self.sign_in_required.store(true, Ordering::SeqCst);
                eprintln!("{}", "Sign in again, then reopen this chat.".yellow());
            }
            Route::Chat(id) => {
                eprintln!("{}", format!("\nChat continues as {}", id).dimmed());
            }
        }
    }
}

async fn open_chat(
    config: &Config,
    handoff: &PromptHandoff<FilesystemPromptStore>,
    id: &str,
) -> Result<()> {
    let initial_prompt = handoff.consume(id);
    let token_supplier: Arc<dyn TokenSupplier> = match &config.token {
        Some(token) => Arc::new(StaticToken::new(token.clone())),
        None => Arc::new(StaticToken::anonymous()),
    };
    let sign_in_required = Arc::new(AtomicBool::new(false));

    let mut controller = ChatController::new(
        id,
        Arc::new(HttpBackend::new()?),
        config.transport_factory(),
    )
    .with_token_supplier(token_supplier)
    .with_location(config.location)
    .with_stream_timeout(tokio::time::Duration::from_secs(config.stream_timeout))
    .with_hooks(Box::new(TerminalHooks {
        sign_in_required: sign_in_required.clone(),
    }))
    .with_initial_prompt(initial_prompt.clone());

    println!("{}", format!("Chat {}", controller.id()).green());
    if let Some(prompt) = &initial_prompt {
        println!("{}\n{}\n", "you".green().bold(), prompt);
    }

    controller.poll_initial_prompt();
    drain_updates(&mut controller).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if sign_in_required.load(Ordering::SeqCst) {
            break;
        }

        let mut stdout = tokio::io::stdout();
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/retry" => {
                if !controller.retry() {
                    eprintln!("{}", "Nothing to retry.".dimmed());
                }
            }
            "/regenerate" => {
                if !controller.regenerate() {
                    eprintln!("{}", "Nothing to regenerate.".dimmed());
                }
            }
            text => {
                controller.send(text);
            }
        }

        drain_updates(&mut controller).await?;
    }

    Ok(())
}

/// Print the response as it streams in. Ctrl-C stops the request.
async fn drain_updates(controller: &mut ChatController) -> Result<()> {
    if controller.status().is_busy() {
        println!("{}", "assistant".cyan().bold());
    }

    loop {
        tokio::select! {
            update = controller.next_update() => match update {
                None => break,
                Some(SessionUpdate::Part { kind, delta, new_part, part, .. }) => {
                    display_delta(kind, &delta, part, new_part)?;
                }
                Some(SessionUpdate::Finished { .. }) => println!("\n"),
                Some(SessionUpdate::Aborted) => println!("\n{}", "(stopped by server)".dimmed()),
                Some(SessionUpdate::Failed { .. }) | Some(SessionUpdate::Pending) => {}
            },
            _ = tokio::signal::ctrl_c() => {
                if controller.stop() {
                    println!("\n{}\n", "(stopped)".dimmed());
                }
            }
        }
    }

    Ok(())
}

fn view_history(path: &Path, api_url: Option<&str>) -> Result<()> {
    let contents = fs::read_to_string(path)?;
    let entries: Vec<HistoryEntry> = serde_json::from_str(&contents)?;
    let messages: Vec<Message> = entries.into_iter().map(Message::from_history).collect();
    if messages.is_empty() {
        return Err(ChatError::Other(format!("{} holds no messages", path.display())));
    }

    let factory = TransportFactory::new(api_url.unwrap_or("http://localhost"));
    let controller = ChatController::new(
        Uuid::new_v4().to_string(),
        Arc::new(HttpBackend::new()?),
        factory,
    )
    .with_messages(messages)
    .read_only(true);

    for message in controller.messages() {
        display_message(message);
    }
    Ok(())
}
