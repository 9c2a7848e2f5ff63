// Ragdesk - terminal front end for the chat orchestrator

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ragdesk::models::session::{model_display_name, NoticeLevel, SUPPORTED_MODELS};
use ragdesk::services::chat::ChatOrchestrator;
use ragdesk::services::ingest::IngestFile;
use ragdesk::utils::broadcast::recv_skipping_lag;
use ragdesk::{AppState, SubmitOutcome};
use ragdesk_core::StreamEvent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ragdesk")]
#[command(about = "Tool-calling chat sessions over a streaming completion backend")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: ~/.ragdesk/config.json)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Interactive chat (default)
    Chat,
    /// Run one tool and print its result as JSON
    Tool {
        name: String,
        /// Arguments as a JSON object
        #[arg(default_value = "{}")]
        args: String,
    },
    /// List saved sessions
    Sessions,
    /// Send documents to the RAG build workflow
    Ingest { paths: Vec<PathBuf> },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,ragdesk=info")))
        .init();

    let args = Args::parse();
    let state = AppState::initialize(args.config)
        .await
        .context("Failed to initialize")?;

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(&state).await,
        Commands::Tool { name, args } => {
            let args: serde_json::Value =
                serde_json::from_str(&args).context("Tool arguments must be JSON")?;
            let result = state.dispatcher().execute(&name, args).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Commands::Sessions => {
            print_sessions(&state.orchestrator()).await;
            Ok(())
        }
        Commands::Ingest { paths } => ingest(&state, &paths).await,
    }
}

async fn ingest(state: &AppState, paths: &[PathBuf]) -> Result<()> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(IngestFile::from_path(path).await?);
    }
    let outcome = state.ingest().trigger(files).await?;
    match outcome.error {
        Some(error) => println!("{} ({})", outcome.message, error),
        None => println!("{}", outcome.message),
    }
    Ok(())
}

async fn print_sessions(orchestrator: &ChatOrchestrator) {
    let active = orchestrator.state().await.session_id;
    let sessions = orchestrator.sessions().await;
    if sessions.is_empty() {
        println!("No saved sessions.");
    }
    for session in sessions {
        let marker = if session.id == active { "*" } else { " " };
        println!(
            "{} {}  {}  {}",
            marker,
            session.id,
            session.created_at.format("%Y-%m-%d %H:%M"),
            session.title
        );
    }
}

const HELP: &str = "\
/new              start a new session
/sessions         list saved sessions
/switch <id>      open a saved session
/delete <id>      delete a session
/clear            clear the current chat
/model [id]       show or change the model
/ingest <paths>   send documents to the RAG build workflow
/quit             exit";

async fn run_chat(state: &AppState) -> Result<()> {
    let orchestrator = state.orchestrator();
    spawn_printers(&orchestrator);

    println!("ragdesk ({}) - /help for commands", model_display_name(&orchestrator.state().await.model));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        match command {
            "/quit" | "/exit" => break,
            "/help" => println!("{}", HELP),
            "/new" => {
                orchestrator.new_session().await;
            }
            "/sessions" => print_sessions(&orchestrator).await,
            "/switch" if !rest.is_empty() => {
                if orchestrator.switch_session(rest).await {
                    for message in orchestrator.state().await.messages {
                        println!("[{:?}] {}", message.role, message.content);
                    }
                }
            }
            "/delete" if !rest.is_empty() => orchestrator.delete_session(rest).await,
            "/clear" => orchestrator.clear_messages().await,
            "/model" if rest.is_empty() => {
                let current = orchestrator.state().await.model;
                for model in SUPPORTED_MODELS {
                    let marker = if model.id == current { "*" } else { " " };
                    println!("{} {:<14} {}", marker, model.id, model.name);
                }
            }
            "/model" => orchestrator.update_model(rest).await,
            "/ingest" => {
                let paths: Vec<PathBuf> = rest.split_whitespace().map(PathBuf::from).collect();
                if let Err(e) = ingest(state, &paths).await {
                    eprintln!("error: {:#}", e);
                }
            }
            _ if command.starts_with('/') => println!("Unknown command. /help for commands"),
            _ => match orchestrator.submit(line).await {
                SubmitOutcome::Finalized(message) => {
                    if !message.content.is_empty() {
                        println!();
                    }
                }
                SubmitOutcome::Rejected(reason) => println!("(not sent: {:?})", reason),
                SubmitOutcome::Detached => {}
            },
        }
    }

    // Keep an unsaved conversation on exit
    orchestrator.autosave_if_dirty().await;
    Ok(())
}

/// Echo streamed text and notices as they arrive
fn spawn_printers(orchestrator: &Arc<ChatOrchestrator>) {
    let mut chunks = orchestrator.subscribe_chunks();
    tokio::spawn(async move {
        while let Some(chunk) = recv_skipping_lag(&mut chunks).await {
            match chunk.event {
                StreamEvent::TextDelta { content } => {
                    print!("{}", content);
                    let _ = std::io::stdout().flush();
                }
                StreamEvent::ToolExecuted { call } => {
                    let status = if call.result.is_failure() { "failed" } else { "ok" };
                    println!("\n[tool {} {}]", call.name, status);
                }
                _ => {}
            }
        }
    });

    let mut notices = orchestrator.subscribe();
    tokio::spawn(async move {
        while let Some(notice) = recv_skipping_lag(&mut notices).await {
            let tag = match notice.level {
                NoticeLevel::Info => "info",
                NoticeLevel::Success => "ok",
                NoticeLevel::Warning => "warn",
                NoticeLevel::Error => "error",
            };
            match notice.detail {
                Some(detail) => eprintln!("[{}] {} ({})", tag, notice.message, detail),
                None => eprintln!("[{}] {}", tag, notice.message),
            }
        }
    });
}
