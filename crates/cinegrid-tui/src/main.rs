use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use ratatui::Terminal;
use ratatui::crossterm::event;
use ratatui::crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::CrosstermBackend;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cinegrid_core::config_file;
use cinegrid_core::{Config, LayoutPreference, ScreenDeps, SortMode};

mod action;
mod app;
mod input;
mod model;
mod persistence;
mod theme;
mod view;

use app::App;

/// cinegrid TUI - browse TMDB movies, read details and keep favorites
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// TMDB API key (overrides config and TMDB_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Path to the movie database
    #[arg(long)]
    db: Option<PathBuf>,

    /// Layout: auto (default), single or dual
    #[arg(long)]
    layout: Option<LayoutPreference>,

    /// Sort mode to start in: popularity, rating or favorites
    #[arg(long)]
    sort: Option<SortMode>,

    /// Color theme: dark (default) or light
    #[arg(long)]
    theme: Option<String>,

    /// Ignore the listing saved by the previous session
    #[arg(long)]
    fresh: bool,
}

fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let (file_layer, guard) = match persistence::log_dir() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "cinegrid-tui.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(file_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cinegrid=info")))
        .init();
    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let _log_guard = init_logging();

    // Resolve config: CLI flags > env vars > config file > defaults
    let file = config_file::load_config();
    let mut config = Config::from_file(&file);
    if let Ok(key) = std::env::var("TMDB_API_KEY")
        && !key.trim().is_empty()
    {
        config.tmdb_api_key = Some(key);
    }
    if let Some(key) = args.api_key {
        config.tmdb_api_key = Some(key);
    }
    if let Some(db) = args.db {
        config.db_path = Some(db);
    }
    if let Some(layout) = args.layout {
        config.layout = layout;
    }
    if let Some(sort) = args.sort {
        config.default_sort = sort;
    }
    if let Some(theme) = args.theme {
        config.theme = theme;
    }
    tracing::info!(?config, "starting cinegrid-tui");

    let store = cinegrid_core::open_store(config.resolved_db_path().as_deref())?;
    let catalog = cinegrid_core::build_catalog(&config);

    let listing_path = persistence::listing_path();
    let snapshot = match (&listing_path, args.fresh || args.sort.is_some()) {
        (Some(path), false) => persistence::load_listing(path),
        _ => None,
    };

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    // Install panic hook that restores terminal before printing panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    // Drain any stray input events (e.g. Enter keypress from launching the command)
    while event::poll(Duration::from_millis(50)).unwrap_or(false) {
        let _ = event::read();
    }

    let (event_tx, mut event_rx) = cinegrid_core::event::channel();
    let deps = ScreenDeps {
        catalog,
        store,
        events: event_tx,
        image_base: config.image_base_url.clone(),
    };
    let size = terminal.size()?;
    let mut app = App::new(
        deps,
        config.layout,
        config.default_sort,
        (size.width, size.height),
        snapshot,
        theme::Theme::by_name(&config.theme),
    );

    // Also handle Ctrl+C at the OS level for clean shutdown
    let cancel = CancellationToken::new();
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_for_signal.cancel();
        }
    });

    let tick_rate = Duration::from_millis(100);

    loop {
        terminal.draw(|f| app.view(f))?;

        tokio::select! {
            maybe_event = event_rx.recv() => {
                if let Some(core_event) = maybe_event {
                    app.handle_core_event(core_event);
                    while let Ok(evt) = event_rx.try_recv() {
                        app.handle_core_event(evt);
                    }
                }
            }
            _ = cancel.cancelled() => {
                app.should_quit = true;
            }
            _ = async {
                if event::poll(tick_rate).unwrap_or(false)
                    && let Ok(evt) = event::read()
                {
                    app.update(input::map_event(&evt));
                }
            } => {}
        }

        app.update(action::Action::Tick);

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;

    if let (Some(path), Some(snapshot)) = (listing_path, app.stash())
        && let Err(e) = persistence::save_listing(&path, &snapshot)
    {
        tracing::warn!(path = %path.display(), error = %e, "failed to save listing");
    }
    tracing::info!("cinegrid-tui exiting");

    Ok(())
}
