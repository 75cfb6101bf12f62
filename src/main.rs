use std::io;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};

use shellbeats::config::{Args, Settings};
use shellbeats::controller::AppController;
use shellbeats::library::LibraryStore;
use shellbeats::logging;
use shellbeats::model::AppModel;
use shellbeats::player::{MpvClient, PlayerBackend, PlayerConnection};
use shellbeats::search::YtDlpSearch;
use shellbeats::view::AppView;

const INPUT_POLL: Duration = Duration::from_millis(100);

fn main() -> ExitCode {
    let settings = Settings::resolve(Args::parse());

    // The only fatal startup error
    if let Err(e) = settings.ensure_dirs() {
        eprintln!(
            "Failed to initialize config directory {}: {}",
            settings.config_dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    if let Err(e) = logging::init_logging(&settings.log_dir()) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!(config_dir = %settings.config_dir.display(), "=== shellbeats starting ===");

    match run(&settings) {
        Ok(()) => {
            tracing::info!("shellbeats shutting down");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = ?e, "Application error");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings) -> Result<()> {
    let library = LibraryStore::open(settings.index_path(), settings.playlists_dir());
    let player = MpvClient::new(PlayerConnection::new(&settings.socket), settings.player.clone());
    let search = YtDlpSearch::new(settings.search_tool.clone());

    let mut controller = AppController::new(
        AppModel::new(library),
        player,
        Box::new(search),
        settings.max_results,
    );

    let missing = settings.missing_tools();
    if !missing.is_empty() {
        tracing::warn!(?missing, "External tools not found");
        controller
            .model_mut()
            .set_status(format!("Not found on PATH: {} (see h for requirements)", missing.join(", ")));
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut controller);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    controller.shutdown();
    res
}

fn run_app<P: PlayerBackend>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &mut AppController<P>,
) -> Result<()> {
    loop {
        controller.poll_player();

        let size = terminal.size()?;
        controller.set_viewport_height(AppView::list_height(Rect::new(0, 0, size.width, size.height)));

        terminal.draw(|f| AppView::render(f, controller.model()))?;

        // Searches block, so they run after the "Searching" status is on screen
        if controller.model().pending_search.is_some() {
            controller.run_pending_search();
            continue;
        }

        if event::poll(INPUT_POLL)?
            && let Event::Key(key) = event::read()?
        {
            controller.handle_key_event(key);
        }

        if controller.should_quit() {
            break;
        }
    }

    Ok(())
}
