use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

pub mod catalog;
pub mod config_file;
pub mod coordinator;
pub mod detail;
pub mod event;
pub mod images;
pub mod listing;
pub mod model;
pub mod notice;
pub mod screen;
pub mod source;
pub mod store;

// Re-export for convenience
pub use catalog::tmdb::TmdbClient;
pub use catalog::{CatalogBackend, CatalogError, CatalogPage};
pub use coordinator::{DetailTarget, Layout, LayoutPreference, MasterDetail, Route, SelectionEvent};
pub use detail::{DetailLoader, DetailSlot, DetailUpdate, DetailView, rating_line, vote_phrase};
pub use event::{CoreEvent, EventReceiver, EventSender};
pub use images::{ImageSink, ImageSize, ImageSlot};
pub use listing::{ListingController, ListingSnapshot, ListingUpdate};
pub use model::{CatalogOrder, MovieId, MovieRecord, SortMode};
pub use notice::{Notice, Operation};
pub use screen::{Screen, ScreenDeps, ScreenEffect};
pub use source::{MovieSource, SourceOrigin};
pub use store::{FavoritesStore, MovieStore, StoreError};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Resolved runtime configuration.
#[derive(Clone)]
pub struct Config {
    pub tmdb_api_key: Option<String>,
    pub base_url: String,
    pub image_base_url: String,
    pub timeout_secs: u64,
    /// Minimum vote count applied to rating-ordered listings.
    pub rating_min_votes: Option<u32>,
    /// SQLite database path. `None` uses the platform data directory.
    pub db_path: Option<PathBuf>,
    pub layout: LayoutPreference,
    pub default_sort: SortMode,
    pub theme: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("tmdb_api_key", &self.tmdb_api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("image_base_url", &self.image_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("rating_min_votes", &self.rating_min_votes)
            .field("db_path", &self.db_path)
            .field("layout", &self.layout)
            .field("default_sort", &self.default_sort)
            .field("theme", &self.theme)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            base_url: catalog::tmdb::DEFAULT_BASE_URL.to_string(),
            image_base_url: images::DEFAULT_IMAGE_BASE.to_string(),
            timeout_secs: 10,
            rating_min_votes: Some(200),
            db_path: None,
            layout: LayoutPreference::Auto,
            default_sort: SortMode::Popularity,
            theme: "dark".to_string(),
        }
    }
}

impl Config {
    /// Apply file values over the defaults. Unrecognized layout or sort
    /// names are logged and left at their defaults.
    pub fn from_file(file: &config_file::ConfigFile) -> Self {
        let mut config = Self::default();
        if let Some(api) = &file.api {
            if let Some(key) = &api.tmdb_api_key
                && !key.trim().is_empty()
            {
                config.tmdb_api_key = Some(key.clone());
            }
            if let Some(url) = &api.base_url {
                config.base_url = url.clone();
            }
            if let Some(url) = &api.image_base_url {
                config.image_base_url = url.clone();
            }
        }
        if let Some(secs) = file.network.as_ref().and_then(|n| n.timeout_secs) {
            config.timeout_secs = secs.max(1);
        }
        if let Some(votes) = file.catalog.as_ref().and_then(|c| c.rating_min_votes) {
            config.rating_min_votes = (votes > 0).then_some(votes);
        }
        if let Some(path) = file.storage.as_ref().and_then(|s| s.db_path.as_ref()) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(display) = &file.display {
            if let Some(theme) = &display.theme {
                config.theme = theme.clone();
            }
            if let Some(layout) = &display.layout {
                match layout.parse() {
                    Ok(l) => config.layout = l,
                    Err(e) => tracing::warn!(error = %e, "ignoring display.layout"),
                }
            }
            if let Some(sort) = &display.default_sort {
                match sort.parse() {
                    Ok(s) => config.default_sort = s,
                    Err(e) => tracing::warn!(error = %e, "ignoring display.default_sort"),
                }
            }
        }
        config
    }

    /// Default database location: `<data_dir>/cinegrid/movies.db`.
    pub fn default_db_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("cinegrid").join("movies.db"))
    }

    pub fn resolved_db_path(&self) -> Option<PathBuf> {
        self.db_path.clone().or_else(Self::default_db_path)
    }
}

/// Build the TMDB client from configuration. A missing key is reported by
/// each request, so favorites still work offline.
pub fn build_catalog(config: &Config) -> Arc<dyn CatalogBackend> {
    if config.tmdb_api_key.is_none() {
        tracing::warn!("no TMDB API key configured; remote listings will fail");
    }
    let client = TmdbClient::new(config.tmdb_api_key.clone().unwrap_or_default())
        .with_base_url(&config.base_url)
        .with_timeout(Duration::from_secs(config.timeout_secs))
        .with_rating_min_votes(config.rating_min_votes);
    Arc::new(client)
}

/// Open the movie store at `path`.
///
/// Falls back to an in-memory store (with a warning) when the file can't
/// be opened, so the app still runs without persistence. Returns an error
/// only if even the in-memory store fails.
pub fn open_store(path: Option<&Path>) -> Result<Arc<MovieStore>, CoreError> {
    if let Some(path) = path {
        match MovieStore::open(path) {
            Ok(store) => return Ok(Arc::new(store)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to open movie store, falling back to in-memory");
            }
        }
    }
    Ok(Arc::new(MovieStore::open_in_memory()?))
}

#[cfg(test)]
mod open_store_tests {
    use super::*;
    use crate::config_file::{ConfigFile, DisplayConfig, NetworkConfig, StorageConfig};

    #[test]
    fn none_path_returns_in_memory() {
        let store = open_store(None).unwrap();
        assert!(store.path().is_none());
    }

    #[test]
    fn creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("movies.db");
        let store = open_store(Some(&path)).unwrap();
        assert_eq!(store.path(), Some(path.as_path()));
        assert!(path.parent().unwrap().exists());
    }

    #[test]
    fn unopenable_path_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let store = open_store(Some(&blocker.join("movies.db"))).unwrap();
        assert!(store.path().is_none());
    }

    #[test]
    fn config_from_file_applies_values() {
        let file = ConfigFile {
            network: Some(NetworkConfig {
                timeout_secs: Some(0),
            }),
            storage: Some(StorageConfig {
                db_path: Some("/tmp/x.db".into()),
            }),
            display: Some(DisplayConfig {
                layout: Some("single".into()),
                default_sort: Some("bogus".into()),
                theme: None,
            }),
            ..Default::default()
        };
        let config = Config::from_file(&file);
        assert_eq!(config.timeout_secs, 1);
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(config.layout, LayoutPreference::Single);
        assert_eq!(config.default_sort, SortMode::Popularity);
        assert_eq!(config.theme, "dark");
    }

    #[test]
    fn debug_masks_api_key() {
        let config = Config {
            tmdb_api_key: Some("secret-key".into()),
            ..Default::default()
        };
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("secret-key"));
        assert!(dbg.contains("***"));
    }
}
