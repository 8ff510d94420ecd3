use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use cinegrid_core::config_file;
use cinegrid_core::detail::DetailSlot;
use cinegrid_core::event::{self, EventReceiver};
use cinegrid_core::images::NoImages;
use cinegrid_core::{
    CatalogBackend, Config, CoreEvent, DetailLoader, DetailUpdate, FavoritesStore,
    ListingController, ListingUpdate, MovieId, MovieStore, Notice, SortMode,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod output;

use output::ColorMode;

/// cinegrid - browse TMDB movie listings and manage local favorites
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// TMDB API key (overrides config and TMDB_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Path to the movie database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List movies in a sort mode
    List {
        /// popularity, rating or favorites
        #[arg(short, long)]
        sort: Option<SortMode>,

        /// Number of remote pages to fetch
        #[arg(short, long, default_value_t = 1)]
        pages: u32,
    },

    /// Show one movie's detail, trailers and reviews
    Detail {
        id: MovieId,

        /// Render the locally stored record without a network call
        #[arg(long)]
        offline: bool,
    },

    /// List favorites (same as `list --sort favorites`)
    Favorites,

    /// Flip a movie's favorite flag
    Toggle { id: MovieId },

    /// Remove cached movies that are not favorites
    Prune,

    /// Write the resolved configuration to the platform config file
    SaveConfig,
}

/// Upper bound for any single background operation.
const OPERATION_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    // Resolve configuration: CLI flags > env vars > config file > defaults
    let file = config_file::load_config();
    let mut config = Config::from_file(&file);
    if let Ok(key) = std::env::var("TMDB_API_KEY")
        && !key.trim().is_empty()
    {
        config.tmdb_api_key = Some(key);
    }
    if let Some(key) = cli.api_key.clone() {
        config.tmdb_api_key = Some(key);
    }
    if let Some(db) = cli.db.clone() {
        config.db_path = Some(db);
    }
    tracing::debug!(?config, "resolved configuration");

    let color = ColorMode(!cli.no_color && !cli.json);
    let mut out = std::io::stdout();

    match cli.command {
        Command::List { sort, pages } => {
            let session = Session::open(config, color, cli.json)?;
            let mode = sort.unwrap_or(session.config.default_sort);
            session.list(&mut out, mode, pages).await
        }
        Command::Favorites => {
            let session = Session::open(config, color, cli.json)?;
            session.list(&mut out, SortMode::Favorites, 1).await
        }
        Command::Detail { id, offline } => {
            let session = Session::open(config, color, cli.json)?;
            session.detail(&mut out, id, offline).await
        }
        Command::Toggle { id } => Session::open(config, color, cli.json)?.toggle(&mut out, id),
        Command::Prune => Session::open(config, color, cli.json)?.prune(&mut out),
        Command::SaveConfig => save_config(&mut out, &config),
    }
}

fn save_config(out: &mut dyn Write, config: &Config) -> anyhow::Result<()> {
    let mut file = config_file::load_config();
    let api = file.api.get_or_insert_with(Default::default);
    api.tmdb_api_key = config.tmdb_api_key.clone();
    if let Some(db) = &config.db_path {
        file.storage
            .get_or_insert_with(Default::default)
            .db_path = Some(db.display().to_string());
    }
    let path = config_file::save_config(&file).map_err(anyhow::Error::msg)?;
    writeln!(out, "Saved configuration to {}", path.display())?;
    Ok(())
}

/// Shared handles for one CLI invocation.
struct Session {
    catalog: Arc<dyn CatalogBackend>,
    store: Arc<MovieStore>,
    config: Config,
    color: ColorMode,
    json: bool,
}

fn notice_error(notice: Notice) -> anyhow::Error {
    anyhow::anyhow!(notice.detail.clone()).context(notice.to_string())
}

async fn next_event(rx: &mut EventReceiver) -> anyhow::Result<CoreEvent> {
    match tokio::time::timeout(OPERATION_TIMEOUT, rx.recv()).await {
        Ok(Some(event)) => Ok(event),
        Ok(None) => anyhow::bail!("background task ended without a result"),
        Err(_) => anyhow::bail!("timed out after {}s", OPERATION_TIMEOUT.as_secs()),
    }
}

impl Session {
    fn open(config: Config, color: ColorMode, json: bool) -> anyhow::Result<Self> {
        let path = config.resolved_db_path();
        let store = cinegrid_core::open_store(path.as_deref())?;
        let catalog = cinegrid_core::build_catalog(&config);
        Ok(Self {
            catalog,
            store,
            config,
            color,
            json,
        })
    }

    async fn list(&self, out: &mut dyn Write, mode: SortMode, pages: u32) -> anyhow::Result<()> {
        let (tx, mut rx) = event::channel();
        let lifetime = CancellationToken::new();
        let mut listing = ListingController::new(
            Arc::clone(&self.catalog),
            self.store.clone(),
            tx,
            &lifetime,
            mode,
        );

        listing.load();
        for page in 1..=pages.max(1) {
            if page > 1 && !listing.load_more() {
                break;
            }
            let CoreEvent::Listing(outcome) = next_event(&mut rx).await? else {
                continue;
            };
            if let ListingUpdate::Failed(notice) = listing.apply(outcome) {
                return Err(notice_error(notice));
            }
        }
        lifetime.cancel();

        let movies = listing
            .collection()
            .map(|c| c.items().to_vec())
            .unwrap_or_default();
        if self.json {
            serde_json::to_writer_pretty(&mut *out, &movies)?;
            writeln!(out)?;
        } else {
            output::print_listing(out, mode, &movies, self.color)?;
        }
        Ok(())
    }

    async fn detail(&self, out: &mut dyn Write, id: MovieId, offline: bool) -> anyhow::Result<()> {
        let (tx, mut rx) = event::channel();
        let lifetime = CancellationToken::new();
        let mut loader = DetailLoader::new(
            DetailSlot::Screen,
            Arc::clone(&self.catalog),
            self.store.clone(),
            tx,
            &lifetime,
            self.config.image_base_url.clone(),
        );

        if offline {
            let Some(record) = self.store.get(id)? else {
                anyhow::bail!("movie {id} is not in the local store");
            };
            let favorite = self.store.is_favorite(id)?;
            loader.show_record(record, favorite, &mut NoImages);
        } else {
            loader.load_detail(id);
            let CoreEvent::Detail(outcome) = next_event(&mut rx).await? else {
                anyhow::bail!("unexpected listing event");
            };
            if let DetailUpdate::Failed(notice) = loader.apply(outcome, &mut NoImages) {
                return Err(notice_error(notice));
            }
        }
        lifetime.cancel();

        let Some(view) = loader.view() else {
            anyhow::bail!("no detail to show for movie {id}");
        };
        if self.json {
            serde_json::to_writer_pretty(&mut *out, &view.record)?;
            writeln!(out)?;
        } else {
            output::print_detail(out, view, self.color)?;
        }
        Ok(())
    }

    fn toggle(&self, out: &mut dyn Write, id: MovieId) -> anyhow::Result<()> {
        let now = self.store.toggle_favorite(id)?;
        let title = self
            .store
            .get(id)?
            .map(|m| m.display_title().to_string())
            .unwrap_or_else(|| id.to_string());
        if self.json {
            writeln!(out, "{}", serde_json::json!({ "id": id, "is_favorite": now }))?;
        } else if now {
            writeln!(out, "Added \"{title}\" to favorites")?;
        } else {
            writeln!(out, "Removed \"{title}\" from favorites")?;
        }
        Ok(())
    }

    fn prune(&self, out: &mut dyn Write) -> anyhow::Result<()> {
        let removed = self.store.clear_non_favorites()?;
        let kept = self.store.favorite_count()?;
        writeln!(out, "Removed {removed} cached movies, kept {kept} favorites")?;
        Ok(())
    }
}
