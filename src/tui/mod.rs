//! Terminal User Interface for minirag.
//!
//! Two tabs (Upload and Ask) drawn with ratatui on a crossterm terminal. Requests run on
//! worker threads; their completions are applied between frames.

use std::io;
use std::panic;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self as crossterm_event, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, info};

use crate::backend::HttpBackendBuilder;
use crate::config::Config;
use crate::dispatch::{Completion, Dispatcher};
use crate::session::Session;

mod app;
pub mod event;
mod ui;

pub use app::{App, Focus, Tab};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Initializes the terminal for TUI rendering.
///
/// # Errors
///
/// Returns an error if terminal initialization fails.
fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
///
/// Must run before exiting, including on error paths.
///
/// # Errors
///
/// Returns an error if terminal restoration fails.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Terminal restoration for the panic hook, where no Terminal is reachable.
fn restore_terminal_panic() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Installs a panic hook that restores the terminal, then defers to the original hook.
fn init_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal_panic();
        original_hook(panic_info);
    }));
}

/// Applies every completion that has arrived since the last frame.
///
/// Returns the number applied.
fn drain_completions(app: &mut App, completions: &Receiver<Completion>) -> usize {
    let mut applied = 0;
    loop {
        match completions.try_recv() {
            Ok(completion) => {
                app.apply(completion);
                applied += 1;
            }
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => {
                debug!("completion channel closed");
                break;
            }
        }
    }
    applied
}

/// Hands queued requests to the dispatcher.
fn dispatch_requests(app: &mut App, dispatcher: &Dispatcher) {
    for request in app.take_requests() {
        dispatcher.dispatch(request);
    }
}

/// Runs the main event loop for the TUI.
///
/// # Errors
///
/// Returns an error if event polling, rendering, or terminal operations fail.
/// Terminal state is always restored, even on error.
pub fn run_event_loop(
    app: &mut App,
    dispatcher: &Dispatcher,
    completions: &Receiver<Completion>,
) -> Result<()> {
    let mut terminal = init_terminal()?;

    let result = run_event_loop_internal(app, dispatcher, completions, &mut terminal);

    if let Err(e) = restore_terminal(&mut terminal) {
        eprintln!("Error restoring terminal: {e}");
    }

    result
}

fn run_event_loop_internal(
    app: &mut App,
    dispatcher: &Dispatcher,
    completions: &Receiver<Completion>,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    loop {
        drain_completions(app, completions);

        terminal.draw(|frame| {
            ui::draw(frame, app);
        })?;

        if crossterm_event::poll(POLL_INTERVAL)?
            && let Event::Key(key) = crossterm_event::read()?
            && key.kind == KeyEventKind::Press
        {
            let should_quit = event::handle_key_event(app, key);
            if should_quit {
                break;
            }
        }

        dispatch_requests(app, dispatcher);
        app.tick();
    }

    Ok(())
}

/// Entry point for the TUI application.
///
/// Builds the HTTP backend from `config`, fires the startup health probe and runs the
/// event loop until the user quits.
///
/// # Errors
///
/// Returns an error if:
/// - The configured backend URL is invalid
/// - The HTTP client cannot be built
/// - Terminal initialization or the event loop fails
pub fn run(config: Config) -> Result<()> {
    init_panic_hook();

    let session = Session::new(config.top_k());
    let backend = HttpBackendBuilder::new()
        .config(config)
        .build()
        .context("Failed to create backend client")?;
    info!(api_url = backend.base_url(), "starting terminal UI");

    let (dispatcher, completions) = Dispatcher::new(Arc::new(backend));
    dispatcher.probe_health();

    let mut app = App::new(session);
    run_event_loop(&mut app, &dispatcher, &completions).context("TUI event loop failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendClient, BackendError, DocumentRequest, FileUpload, QueryRequest};
    use crate::models::{QueryResult, SourceExcerptBuilder, UploadResult};
    use std::time::Instant;

    struct SkyBackend;

    impl BackendClient for SkyBackend {
        fn health(&self) -> Result<String, BackendError> {
            Ok("healthy".to_string())
        }

        fn ingest_text(&self, _request: &DocumentRequest) -> Result<UploadResult, BackendError> {
            Ok(UploadResult::new(1, 5))
        }

        fn ingest_file(&self, _upload: &FileUpload) -> Result<UploadResult, BackendError> {
            Err(BackendError::Http { status: 504 })
        }

        fn query(&self, _request: &QueryRequest) -> Result<QueryResult, BackendError> {
            let excerpt = SourceExcerptBuilder::new()
                .title("Notes")
                .text("The sky is blue.")
                .relevance_score(0.92)
                .build();
            Ok(QueryResult::new("It is blue [1].", vec![excerpt], 5.0, 42, 0.0))
        }
    }

    /// Runs the loop body without a terminal until `done` holds or time runs out.
    fn pump(
        app: &mut App,
        dispatcher: &Dispatcher,
        completions: &Receiver<Completion>,
        done: impl Fn(&App) -> bool,
    ) {
        dispatch_requests(app, dispatcher);
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(app) && Instant::now() < deadline {
            drain_completions(app, completions);
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn query_round_trip_through_worker_thread() {
        let (dispatcher, completions) = Dispatcher::new(Arc::new(SkyBackend));
        let mut app = App::default();
        app.switch_tab();
        app.push_char('?');
        app.submit_query();

        pump(&mut app, &dispatcher, &completions, |app| {
            !app.session().is_querying()
        });

        assert_eq!(app.session().sources().len(), 1);
        app.toggle_number(1);
        assert_eq!(
            app.session().expanded_source().unwrap().1.text(),
            "The sky is blue."
        );
    }

    #[test]
    fn upload_and_query_run_concurrently() {
        let (dispatcher, completions) = Dispatcher::new(Arc::new(SkyBackend));
        let mut app = App::default();
        app.next_focus();
        app.push_char('x');
        app.submit_text();
        app.switch_tab();
        app.push_char('?');
        app.submit_query();

        pump(&mut app, &dispatcher, &completions, |app| {
            !app.session().is_querying() && !app.session().is_ingesting()
        });

        assert!(app.session().upload_result().is_some());
        assert!(app.session().query_result().is_some());
    }

    #[test]
    fn drain_on_empty_channel_applies_nothing() {
        let (_dispatcher, completions) = Dispatcher::new(Arc::new(SkyBackend));
        let mut app = App::default();
        assert_eq!(drain_completions(&mut app, &completions), 0);
    }
}
