use runboard::app::{self, AppConfig, AppState, Command, InputMode};
use runboard::cli::Cli;
use runboard::debounce::Debouncer;
use runboard::events::{AppEvent, EventHandler};
use runboard::fetcher;
use runboard::grid::GridController;
use runboard::input::{self, InputContext};
use runboard::loading::LoadingCounter;
use runboard::source::{HttpRunSource, RunSource};
use runboard::tui;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, SetTitle};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

fn setup_verbose_logging() -> Result<()> {
    let state_dir = state_dir_or_fallback();
    std::fs::create_dir_all(&state_dir)
        .map_err(|e| eyre!("Failed to create log directory {state_dir:?}: {e}"))?;
    let log_path = state_dir.join("debug.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| eyre!("Failed to open log file {log_path:?}: {e}"))?;
    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .init();
    tracing::info!(
        "runboard v{} starting with verbose logging",
        env!("CARGO_PKG_VERSION")
    );
    Ok(())
}

fn state_dir_or_fallback() -> std::path::PathBuf {
    if let Some(state) = std::env::var_os("XDG_STATE_HOME") {
        std::path::PathBuf::from(state).join("runboard")
    } else if let Some(home) = std::env::var_os("HOME") {
        std::path::PathBuf::from(home)
            .join(".local")
            .join("state")
            .join("runboard")
    } else {
        std::path::PathBuf::from("/tmp/runboard")
    }
}

/// Handles to everything a [`Command`] may need.
struct Dispatcher<'a> {
    source: &'a Arc<dyn RunSource>,
    loading: &'a LoadingCounter,
    tx: &'a mpsc::UnboundedSender<AppEvent>,
    debouncer: &'a Debouncer<String>,
}

impl Dispatcher<'_> {
    fn run(&self, command: Command) {
        match command {
            Command::Fetch(ticket) => {
                fetcher::spawn_fetch(self.source.clone(), ticket, self.loading, self.tx.clone());
            }
            Command::Search(term) => self.debouncer.push(term),
            Command::Plot(request) => {
                fetcher::spawn_plot(self.source.clone(), request, self.loading, self.tx.clone());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    if args.verbose {
        setup_verbose_logging()?;
    }

    let source: Arc<dyn RunSource> = Arc::new(
        HttpRunSource::new(args.url.clone(), args.plot_url.clone(), args.timeout)
            .map_err(|e| eyre!("Failed to set up HTTP client: {e}"))?,
    );
    let loading = LoadingCounter::new();
    let config = AppConfig {
        endpoint: args.url.to_string(),
        plot_enabled: args.plot_url.is_some(),
        version_string: format!("runboard v{}", env!("CARGO_PKG_VERSION")),
    };
    let mut state = AppState::new(
        config,
        GridController::new(args.grid_config()),
        loading.clone(),
    );

    // Restore the terminal before the default hook prints a panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Failed to disable raw mode during panic: {e}");
        }
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, SetTitle("")) {
            eprintln!("Failed to leave alternate screen during panic: {e}");
        }
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, SetTitle(format!("runboard {}", args.url)))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let events = EventHandler::new(Duration::from_millis(100));
    let tx = events.sender();

    let search_tx = tx.clone();
    let debouncer = Debouncer::spawn(
        Duration::from_millis(app::SEARCH_DEBOUNCE_MS),
        move |term: String| {
            if search_tx.send(AppEvent::SearchSettled(term)).is_err() {
                tracing::warn!("event channel closed; dropping search");
            }
        },
    );

    let dispatcher = Dispatcher {
        source: &source,
        loading: &loading,
        tx: &tx,
        debouncer: &debouncer,
    };
    dispatcher.run(Command::Fetch(state.grid.refresh()));

    let result = run_app(&mut terminal, &mut state, events, &dispatcher).await;

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, SetTitle(""))?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    mut events: EventHandler,
    dispatcher: &Dispatcher<'_>,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        state.columns = tui::grid::columns_for(terminal.size()?.width);
        terminal.draw(|f| tui::render::render(f, state))?;

        state.prune_notifications();
        state.prune_error();

        let Some(event) = events.next().await else {
            tracing::warn!("event channel closed; exiting");
            return Ok(());
        };

        let command = match event {
            AppEvent::Key(key) => {
                let ctx = InputContext {
                    has_error: state.error.is_some(),
                    is_loading: state.is_loading(),
                    has_overlay: state.has_overlay(),
                    searching: state.input_mode == InputMode::Search,
                };
                state.handle_action(input::map_key(key, &ctx))
            }
            AppEvent::Tick => {
                if last_tick.elapsed() >= Duration::from_millis(100) {
                    state.advance_spinner();
                    last_tick = Instant::now();
                }
                None
            }
            AppEvent::PageLoaded { generation, result } => {
                state.on_page_loaded(generation, result);
                state.take_follow_up()
            }
            AppEvent::SearchSettled(term) => state.on_search_settled(&term),
            AppEvent::PlotLoaded(result) => {
                state.on_plot_loaded(result);
                None
            }
            AppEvent::Error(e) => {
                state.set_error(e);
                None
            }
        };

        if let Some(command) = command {
            dispatcher.run(command);
        }
        state.absorb_grid_events();

        if state.should_quit {
            return Ok(());
        }
    }
}
