use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use minirag::backend::{BackendClient, HttpBackend, HttpBackendBuilder};
use minirag::dispatch::execute;
use minirag::presentation::{AnswerView, UploadSummary};
use minirag::session::Session;
use minirag::{Config, ErrorKind};
use tracing_subscriber::EnvFilter;

/// minirag - ask questions about your documents and see where the answers come from
#[derive(Parser)]
#[command(name = "minirag")]
#[command(about = "Terminal client for a retrieval-augmented question-answering service")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides MINIRAG_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Open the interactive terminal UI (default)
    Tui,
    /// Ask one question and print the cited answer
    Ask(AskCommand),
    /// Upload a document from text or a file
    Ingest(IngestCommand),
    /// Check that the backend is reachable
    Health,
}

/// Ask a question
#[derive(Parser)]
struct AskCommand {
    /// The question to ask
    #[arg(value_name = "QUESTION")]
    question: String,

    /// Print the excerpt of this citation number in full
    #[arg(short, long, value_name = "N")]
    expand: Option<usize>,
}

/// Upload a document
#[derive(Parser)]
#[command(group(ArgGroup::new("input").required(true).args(["text", "file"])))]
struct IngestCommand {
    /// Document title (defaults to "Untitled Document")
    #[arg(short, long, value_name = "TITLE")]
    title: Option<String>,

    /// Text content to upload
    #[arg(long, value_name = "TEXT")]
    text: Option<String>,

    /// A .txt, .md or .pdf file to upload
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
}

/// A failed command, classified for the exit code.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct Failure {
    kind: ErrorKind,
    message: String,
}

impl Failure {
    fn from_session(session: &Session) -> Self {
        match session.notice() {
            Some(notice) => Self {
                kind: notice.kind(),
                message: notice.message().to_string(),
            },
            None => Self {
                kind: ErrorKind::Transport,
                message: "request did not complete".to_string(),
            },
        }
    }
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let interactive = matches!(cli.command, None | Some(Commands::Tui));

    if let Err(e) = init_tracing(interactive) {
        eprintln!("Warning: logging disabled: {e:#}");
    }

    let mut config = Config::from_env();
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url);
    }

    let result = match &cli.command {
        None | Some(Commands::Tui) => minirag::tui::run(config),
        Some(Commands::Ask(cmd)) => handle_ask(cmd, config),
        Some(Commands::Ingest(cmd)) => handle_ingest(cmd, config),
        Some(Commands::Health) => handle_health(config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code(&e));
    }
}

/// Validation failures exit with 1, everything else with 2.
fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<Failure>() {
        Some(failure) if failure.kind == ErrorKind::Validation => 1,
        _ => 2,
    }
}

/// Initializes `tracing` with an `EnvFilter` (default `info`).
///
/// One-shot commands log to stderr. The TUI owns the terminal, so it logs only when
/// `RUST_LOG` is set, to `<cache_dir>/minirag/minirag.log`.
fn init_tracing(interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if !interactive {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
        return Ok(());
    }

    if std::env::var_os("RUST_LOG").is_none() {
        return Ok(());
    }

    let path = log_file_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}

/// Returns `{cache_dir}/minirag/minirag.log`.
fn log_file_path() -> Result<PathBuf> {
    let cache_dir =
        dirs::cache_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine cache directory"))?;

    Ok(cache_dir.join("minirag").join("minirag.log"))
}

fn build_backend(config: Config) -> Result<HttpBackend> {
    HttpBackendBuilder::new()
        .config(config)
        .build()
        .context("Failed to create backend client")
}

/// Handles the ask command.
fn handle_ask(cmd: &AskCommand, config: Config) -> Result<()> {
    let mut session = Session::new(config.top_k());
    *session.question_mut() = cmd.question.clone();

    let Some(request) = session.submit_query() else {
        return Err(Failure::from_session(&session).into());
    };
    let backend = build_backend(config)?;
    session.apply(execute(&backend, request));

    if let Some(number) = cmd.expand
        && !session.select_citation(number)
    {
        eprintln!("Note: no source [{number}] in this answer");
    }

    let Some(view) = AnswerView::from_session(&session) else {
        return Err(Failure::from_session(&session).into());
    };
    print!("{}", format_answer(&view));

    Ok(())
}

/// Formats an answer view for the terminal.
fn format_answer(view: &AnswerView<'_>) -> String {
    use minirag::presentation::AnswerPiece;

    let mut out = String::new();
    for piece in &view.pieces {
        match piece {
            AnswerPiece::Text(text) => out.push_str(text),
            AnswerPiece::Badge { number, .. } => out.push_str(&format!("[{number}]")),
        }
    }
    out.push_str("\n\n");
    out.push_str(&view.metrics.to_string());
    out.push('\n');

    if view.shows_sources() {
        out.push_str("\nSources:\n");
        for card in &view.sources {
            out.push_str(&format!(
                "  [{}] {} ({}) {}\n",
                card.number, card.title, card.origin, card.relevance
            ));
            if let Some(section) = card.section {
                out.push_str(&format!("      {section}\n"));
            }
            if let Some(text) = card.text {
                for line in text.lines() {
                    out.push_str(&format!("      {line}\n"));
                }
            }
        }
    }

    out
}

/// Handles the ingest command.
fn handle_ingest(cmd: &IngestCommand, config: Config) -> Result<()> {
    let mut session = Session::new(config.top_k());

    let request = if let Some(path) = &cmd.file {
        session.form_mut().file_path = path.display().to_string();
        session.submit_file()
    } else {
        let form = session.form_mut();
        form.text = cmd.text.clone().unwrap_or_default();
        form.title = cmd.title.clone().unwrap_or_default();
        session.submit_text()
    };
    let Some(request) = request else {
        return Err(Failure::from_session(&session).into());
    };

    let backend = build_backend(config)?;
    session.apply(execute(&backend, request));

    let Some(result) = session.upload_result() else {
        return Err(Failure::from_session(&session).into());
    };
    println!("{}", UploadSummary::from_result(result));

    Ok(())
}

/// Handles the health command.
fn handle_health(config: Config) -> Result<()> {
    let backend = build_backend(config)?;
    println!("Checking {} ...", backend.base_url());

    let status = backend.health().map_err(|e| Failure {
        kind: e.kind(),
        message: format!("Backend unreachable: {e}"),
    })?;
    println!("Backend status: {status}");

    Ok(())
}
