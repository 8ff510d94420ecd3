//! The listing controller: owns the grid's collection for the active sort
//! mode and keeps it consistent with that mode.
//!
//! Loads run as tokio tasks under a child of the screen's cancellation
//! token and report back through the [`CoreEvent`] channel. Each request
//! carries a generation number; [`ListingController::apply`] drops any
//! outcome that no longer matches the current generation and sort mode, so
//! a slow page started before a mode switch can never overwrite the new
//! collection.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::catalog::{CatalogBackend, CatalogPage};
use crate::coordinator::SelectionEvent;
use crate::event::{CoreEvent, EventSender};
use crate::model::{CatalogOrder, MovieId, MovieRecord, SortMode};
use crate::notice::{Notice, Operation};
use crate::source::{FavoritesQuery, MovieSource, RemoteList};
use crate::store::FavoritesStore;

/// Whether a load replaces the collection or extends it with a later page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Replace,
    Append,
}

#[derive(Debug)]
pub enum LoadedData {
    Remote(CatalogOrder, CatalogPage),
    Favorites(Vec<MovieRecord>),
}

/// A finished load, waiting to be applied on the UI loop.
#[derive(Debug)]
pub struct ListingOutcome {
    pub generation: u64,
    pub sort_mode: SortMode,
    pub kind: LoadKind,
    pub result: Result<LoadedData, Notice>,
}

/// Effect of applying an outcome (or restoring a snapshot).
#[derive(Debug, Clone, PartialEq)]
pub enum ListingUpdate {
    /// The collection was replaced or extended. `reselect` is the
    /// programmatic re-selection of the last-viewed row, if any.
    Ready {
        count: usize,
        reselect: Option<SelectionEvent>,
    },
    /// Nothing changed; show the notice.
    Failed(Notice),
    /// The outcome belonged to a superseded request and was dropped.
    Stale,
}

/// Serializable state carried across a screen re-creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSnapshot {
    pub sort_mode: SortMode,
    pub page: u32,
    pub total_pages: u32,
    pub last_index: usize,
    pub movies: Vec<MovieRecord>,
}

impl ListingSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug)]
enum Collection {
    Remote(RemoteList),
    Favorites(FavoritesQuery),
}

impl Collection {
    fn source(&self) -> &dyn MovieSource {
        match self {
            Collection::Remote(list) => list,
            Collection::Favorites(query) => query,
        }
    }
}

pub struct ListingController {
    catalog: Arc<dyn CatalogBackend>,
    store: Arc<dyn FavoritesStore>,
    events: EventSender,
    lifetime: CancellationToken,
    sort_mode: SortMode,
    collection: Option<Collection>,
    last_index: usize,
    generation: u64,
    in_flight: Option<(LoadKind, CancellationToken)>,
}

impl std::fmt::Debug for ListingController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingController")
            .field("catalog", &self.catalog.name())
            .field("sort_mode", &self.sort_mode)
            .field("count", &self.count())
            .field("last_index", &self.last_index)
            .field("generation", &self.generation)
            .field("loading", &self.is_loading())
            .finish()
    }
}

impl ListingController {
    /// A controller with no collection yet. `lifetime` is the owning
    /// screen's token; cancelling it abandons every in-flight load.
    pub fn new(
        catalog: Arc<dyn CatalogBackend>,
        store: Arc<dyn FavoritesStore>,
        events: EventSender,
        lifetime: &CancellationToken,
        sort_mode: SortMode,
    ) -> Self {
        Self {
            catalog,
            store,
            events,
            lifetime: lifetime.clone(),
            sort_mode,
            collection: None,
            last_index: 0,
            generation: 0,
            in_flight: None,
        }
    }

    /// Build a controller for a re-created screen. With a snapshot the
    /// stashed collection is restored without any query and the returned
    /// update carries the programmatic re-selection; without one a fresh
    /// load under `fallback_mode` is started and `None` is returned.
    pub fn resume(
        catalog: Arc<dyn CatalogBackend>,
        store: Arc<dyn FavoritesStore>,
        events: EventSender,
        lifetime: &CancellationToken,
        snapshot: Option<ListingSnapshot>,
        fallback_mode: SortMode,
    ) -> (Self, Option<ListingUpdate>) {
        match snapshot {
            Some(snapshot) => {
                let mut controller =
                    Self::new(catalog, store, events, lifetime, snapshot.sort_mode);
                let update = controller.restore(snapshot);
                (controller, Some(update))
            }
            None => {
                let mut controller = Self::new(catalog, store, events, lifetime, fallback_mode);
                controller.load();
                (controller, None)
            }
        }
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn collection(&self) -> Option<&dyn MovieSource> {
        self.collection.as_ref().map(Collection::source)
    }

    pub fn count(&self) -> usize {
        self.collection().map_or(0, |c| c.count())
    }

    pub fn item_at(&self, index: usize) -> Option<&MovieRecord> {
        self.collection().and_then(|c| c.item_at(index))
    }

    pub fn record(&self, id: MovieId) -> Option<&MovieRecord> {
        let source = self.collection()?;
        source.position_of(id).and_then(|i| source.item_at(i))
    }

    pub fn last_index(&self) -> usize {
        self.last_index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// More remote pages are available.
    pub fn has_more(&self) -> bool {
        matches!(&self.collection, Some(Collection::Remote(list)) if list.has_more())
    }

    /// `true` when the active rows came from the local store.
    pub fn is_local(&self) -> bool {
        matches!(self.collection, Some(Collection::Favorites(_)))
    }

    /// Switch the backing source. Drops the current collection, resets the
    /// last-viewed index and supersedes any in-flight load. Call
    /// [`load`](Self::load) afterwards to populate.
    pub fn set_sort_mode(&mut self, mode: SortMode) {
        tracing::debug!(from = ?self.sort_mode, to = ?mode, "sort mode changed");
        self.cancel_in_flight();
        self.generation = next_generation();
        self.sort_mode = mode;
        self.collection = None;
        self.last_index = 0;
    }

    /// Fetch the first page (remote modes) or run the favorites query.
    pub fn load(&mut self) {
        self.spawn_load(LoadKind::Replace, 1);
    }

    /// Fetch the next remote page and append it. Returns `false` when there
    /// is nothing to do: favorites mode, a load already running, no
    /// collection yet, or no further pages.
    pub fn load_more(&mut self) -> bool {
        if self.is_loading() {
            return false;
        }
        let next = match &self.collection {
            Some(Collection::Remote(list)) if list.has_more() => list.page() + 1,
            _ => return false,
        };
        self.spawn_load(LoadKind::Append, next);
        true
    }

    /// Re-run the favorites query if favorites are on screen, e.g. after a
    /// toggle. Returns whether a reload was started.
    pub fn refresh_favorites(&mut self) -> bool {
        if self.sort_mode.is_remote() {
            return false;
        }
        self.load();
        true
    }

    fn cancel_in_flight(&mut self) {
        if let Some((_, token)) = self.in_flight.take() {
            token.cancel();
        }
    }

    fn spawn_load(&mut self, kind: LoadKind, page: u32) {
        self.cancel_in_flight();
        self.generation = next_generation();
        let token = self.lifetime.child_token();
        self.in_flight = Some((kind, token.clone()));

        let generation = self.generation;
        let sort_mode = self.sort_mode;
        let events = self.events.clone();
        let catalog = Arc::clone(&self.catalog);
        let store = Arc::clone(&self.store);

        tracing::debug!(?sort_mode, ?kind, page, generation, "listing load started");

        tokio::spawn(async move {
            let work = fetch(catalog, store, sort_mode, page);
            let result = tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(generation, "listing load abandoned");
                    return;
                }
                result = work => result,
            };
            if token.is_cancelled() {
                return;
            }
            let _ = events.send(CoreEvent::Listing(ListingOutcome {
                generation,
                sort_mode,
                kind,
                result,
            }));
        });
    }

    /// Apply a finished load. Stale outcomes and failures leave the
    /// collection untouched.
    pub fn apply(&mut self, outcome: ListingOutcome) -> ListingUpdate {
        if outcome.generation != self.generation || outcome.sort_mode != self.sort_mode {
            tracing::debug!(
                outcome_generation = outcome.generation,
                current_generation = self.generation,
                "dropping stale listing outcome"
            );
            return ListingUpdate::Stale;
        }
        self.in_flight = None;

        let data = match outcome.result {
            Ok(data) => data,
            Err(notice) => {
                tracing::warn!(
                    sort_mode = ?self.sort_mode,
                    error = %notice.detail,
                    "{}", notice
                );
                return ListingUpdate::Failed(notice);
            }
        };

        match (outcome.kind, data) {
            (LoadKind::Append, LoadedData::Remote(order, page)) => {
                if let Some(Collection::Remote(list)) = &mut self.collection
                    && list.order() == order
                {
                    let added = list.append_page(page.page, page.total_pages, page.results);
                    tracing::debug!(page = page.page, added, "appended catalog page");
                }
                ListingUpdate::Ready {
                    count: self.count(),
                    reselect: None,
                }
            }
            (_, LoadedData::Remote(order, page)) => {
                let list = RemoteList::new(order, page.results, page.page, page.total_pages);
                self.replace(Collection::Remote(list))
            }
            (_, LoadedData::Favorites(movies)) => {
                self.replace(Collection::Favorites(FavoritesQuery::new(movies)))
            }
        }
    }

    fn replace(&mut self, collection: Collection) -> ListingUpdate {
        self.collection = Some(collection);
        let count = self.count();
        // A shorter collection keeps the user on its last row.
        self.last_index = self.last_index.min(count.saturating_sub(1));
        tracing::info!(sort_mode = ?self.sort_mode, count, "collection ready");
        ListingUpdate::Ready {
            count,
            reselect: self.reselection(),
        }
    }

    fn reselection(&self) -> Option<SelectionEvent> {
        self.item_at(self.last_index).map(|m| SelectionEvent {
            movie_id: m.id,
            user_initiated: false,
        })
    }

    /// Resolve the row at `index` into a selection. Out of range → `None`.
    pub fn select(&mut self, index: usize, user_initiated: bool) -> Option<SelectionEvent> {
        let movie_id = self.item_at(index)?.id;
        self.last_index = index;
        Some(SelectionEvent {
            movie_id,
            user_initiated,
        })
    }

    /// Capture the state a re-created screen needs. `None` until a
    /// collection has been loaded.
    pub fn stash(&self) -> Option<ListingSnapshot> {
        let collection = self.collection.as_ref()?;
        let (page, total_pages) = match collection {
            Collection::Remote(list) => (list.page(), list.total_pages()),
            Collection::Favorites(_) => (1, 1),
        };
        Some(ListingSnapshot {
            sort_mode: self.sort_mode,
            page,
            total_pages,
            last_index: self.last_index,
            movies: collection.source().items().to_vec(),
        })
    }

    /// Replace all state with a stashed snapshot. No query is issued.
    pub fn restore(&mut self, snapshot: ListingSnapshot) -> ListingUpdate {
        self.cancel_in_flight();
        self.generation = next_generation();
        self.sort_mode = snapshot.sort_mode;
        self.last_index = snapshot.last_index;
        let collection = match snapshot.sort_mode.catalog_order() {
            Some(order) => Collection::Remote(RemoteList::new(
                order,
                snapshot.movies,
                snapshot.page.max(1),
                snapshot.total_pages,
            )),
            None => Collection::Favorites(FavoritesQuery::new(snapshot.movies)),
        };
        tracing::debug!(sort_mode = ?self.sort_mode, "listing restored from snapshot");
        self.replace(collection)
    }
}

/// Generations are unique across every controller in the process, so an
/// outcome queued by a destroyed screen never matches its replacement.
fn next_generation() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// Background half of a load: query the active source and, for remote
/// pages, write the rows through to the local store.
async fn fetch(
    catalog: Arc<dyn CatalogBackend>,
    store: Arc<dyn FavoritesStore>,
    sort_mode: SortMode,
    page: u32,
) -> Result<LoadedData, Notice> {
    match sort_mode.catalog_order() {
        Some(order) => {
            let listing = catalog
                .list_movies(order, page)
                .await
                .map_err(|e| Notice::new(Operation::DownloadMovies, e))?;
            let rows = listing.results.clone();
            let persisted = tokio::task::spawn_blocking(move || store.upsert_many(&rows)).await;
            match persisted {
                Ok(Ok(n)) => tracing::debug!(rows = n, "cached catalog page"),
                Ok(Err(e)) => tracing::warn!(error = %e, "failed to cache catalog page"),
                Err(e) => tracing::warn!(error = %e, "cache task panicked"),
            }
            Ok(LoadedData::Remote(order, listing))
        }
        None => {
            let rows = tokio::task::spawn_blocking(move || store.query_all_sorted_by_title())
                .await
                .map_err(|e| Notice::new(Operation::LoadFavorites, e))?
                .map_err(|e| Notice::new(Operation::LoadFavorites, e))?;
            Ok(LoadedData::Favorites(rows))
        }
    }
}
