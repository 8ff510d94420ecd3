//! Fetches one movie and renders it into a [`DetailView`].
//!
//! A loader backs either the dual-pane detail area or a standalone detail
//! screen. Requests are numbered; re-selecting quickly in the pane cancels
//! the previous fetch and any outcome that still arrives for it is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

use crate::catalog::CatalogBackend;
use crate::event::{CoreEvent, EventSender};
use crate::images::{ImageSink, ImageSize, ImageSlot, image_url};
use crate::model::{MovieId, MovieRecord};
use crate::notice::{Notice, Operation};
use crate::store::{FavoritesStore, StoreError};

/// Which detail surface a loader feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailSlot {
    Pane,
    Screen,
}

#[derive(Debug)]
pub enum DetailPayload {
    /// Fetched record and its favorite flag.
    Record(Result<(MovieRecord, bool), Notice>),
    /// New favorite state after a toggle.
    Favorite(Result<bool, Notice>),
}

#[derive(Debug)]
pub struct DetailOutcome {
    pub slot: DetailSlot,
    pub request: u64,
    pub movie_id: MovieId,
    pub payload: DetailPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailUpdate {
    Shown(MovieId),
    FavoriteChanged { movie_id: MovieId, is_favorite: bool },
    Failed(Notice),
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailerLine {
    pub name: String,
    pub site: &'static str,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewLine {
    pub author: String,
    pub content: String,
    pub url: Option<String>,
}

/// Display-ready fields for one movie.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub record: MovieRecord,
    pub title: String,
    pub original_title: String,
    pub year: Option<String>,
    pub runtime: Option<String>,
    pub rating: String,
    pub overview: String,
    pub trailers: Vec<TrailerLine>,
    pub reviews: Vec<ReviewLine>,
    /// Link for the share action: the first YouTube trailer.
    pub share_url: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub is_favorite: bool,
}

impl DetailView {
    pub fn render(record: MovieRecord, is_favorite: bool, image_base: &str) -> Self {
        let trailers = record
            .trailers
            .as_ref()
            .map(|t| {
                let youtube = t.youtube.iter().map(|tr| TrailerLine {
                    name: tr.name.clone(),
                    site: "YouTube",
                    url: (!tr.source.is_empty()).then(|| tr.youtube_url()),
                });
                let quicktime = t.quicktime.iter().map(|tr| TrailerLine {
                    name: tr.name.clone(),
                    site: "QuickTime",
                    url: None,
                });
                youtube.chain(quicktime).collect()
            })
            .unwrap_or_default();
        let reviews = record
            .reviews
            .as_ref()
            .map(|r| {
                r.results
                    .iter()
                    .map(|rv| ReviewLine {
                        author: rv.author.clone(),
                        content: rv.content.clone(),
                        url: rv.url.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let share_url = record
            .trailers
            .as_ref()
            .and_then(|t| t.first_shareable())
            .map(|t| t.youtube_url());

        Self {
            title: record.display_title().to_string(),
            original_title: record.original_title.clone(),
            year: record.release_year().map(|y| y.to_string()),
            runtime: record.runtime.map(runtime_text),
            rating: rating_line(record.vote_average, record.vote_count),
            overview: record.overview.clone(),
            trailers,
            reviews,
            share_url,
            poster_url: record
                .poster_path
                .as_deref()
                .map(|p| image_url(image_base, ImageSize::POSTER, p)),
            backdrop_url: record
                .backdrop_path
                .as_deref()
                .map(|p| image_url(image_base, ImageSize::BACKDROP, p)),
            is_favorite,
            record,
        }
    }

    pub fn trailer_count(&self) -> usize {
        self.trailers.len()
    }

    pub fn review_count(&self) -> usize {
        self.reviews.len()
    }
}

/// Request ids are unique across loaders, so an outcome queued for a
/// destroyed screen never matches the loader that replaced it.
fn next_request_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// "(1 vote)" for exactly one, "(N votes)" otherwise, zero included.
pub fn vote_phrase(count: u32) -> String {
    if count == 1 {
        "(1 vote)".to_string()
    } else {
        format!("({count} votes)")
    }
}

/// The average is printed unrounded ("7.25/10"); whole numbers keep one
/// decimal ("8.0/10").
pub fn rating_line(average: f64, count: u32) -> String {
    let average = if average.fract() == 0.0 {
        format!("{average:.1}")
    } else {
        average.to_string()
    };
    format!("{average}/10 {}", vote_phrase(count))
}

pub fn runtime_text(minutes: u32) -> String {
    format!("{minutes} min")
}

pub struct DetailLoader {
    slot: DetailSlot,
    catalog: Arc<dyn CatalogBackend>,
    store: Arc<dyn FavoritesStore>,
    events: EventSender,
    lifetime: CancellationToken,
    image_base: String,
    request: u64,
    in_flight: Option<CancellationToken>,
    pending: Option<MovieId>,
    view: Option<DetailView>,
}

impl std::fmt::Debug for DetailLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailLoader")
            .field("slot", &self.slot)
            .field("request", &self.request)
            .field("pending", &self.pending)
            .field("showing", &self.view.as_ref().map(|v| v.record.id))
            .finish()
    }
}

impl DetailLoader {
    pub fn new(
        slot: DetailSlot,
        catalog: Arc<dyn CatalogBackend>,
        store: Arc<dyn FavoritesStore>,
        events: EventSender,
        lifetime: &CancellationToken,
        image_base: impl Into<String>,
    ) -> Self {
        Self {
            slot,
            catalog,
            store,
            events,
            lifetime: lifetime.clone(),
            image_base: image_base.into(),
            request: 0,
            in_flight: None,
            pending: None,
            view: None,
        }
    }

    pub fn slot(&self) -> DetailSlot {
        self.slot
    }

    pub fn view(&self) -> Option<&DetailView> {
        self.view.as_ref()
    }

    /// Movie currently being fetched, if any.
    pub fn pending(&self) -> Option<MovieId> {
        self.pending
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    fn next_request(&mut self) -> (u64, CancellationToken) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
        self.request = next_request_id();
        let token = self.lifetime.child_token();
        self.in_flight = Some(token.clone());
        (self.request, token)
    }

    /// Fetch the full record with trailers and reviews. Supersedes any
    /// earlier request. The current view stays until the outcome arrives.
    pub fn load_detail(&mut self, movie_id: MovieId) {
        let (request, token) = self.next_request();
        self.pending = Some(movie_id);
        let slot = self.slot;
        let catalog = Arc::clone(&self.catalog);
        let store = Arc::clone(&self.store);
        let events = self.events.clone();

        tracing::debug!(%movie_id, request, ?slot, "detail load started");

        tokio::spawn(async move {
            let result = tokio::select! {
                _ = token.cancelled() => return,
                r = fetch_detail(catalog, store, movie_id) => r,
            };
            if token.is_cancelled() {
                return;
            }
            let _ = events.send(CoreEvent::Detail(DetailOutcome {
                slot,
                request,
                movie_id,
                payload: DetailPayload::Record(result),
            }));
        });
    }

    /// Render an already materialized record. No network call; any pending
    /// fetch is superseded.
    pub fn show_record(
        &mut self,
        record: MovieRecord,
        is_favorite: bool,
        images: &mut dyn ImageSink,
    ) -> MovieId {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
        self.request = next_request_id();
        self.pending = None;
        let id = record.id;
        self.display(DetailView::render(record, is_favorite, &self.image_base), images);
        id
    }

    fn display(&mut self, view: DetailView, images: &mut dyn ImageSink) {
        images.show(ImageSlot::Poster, view.poster_url.as_deref());
        images.show(ImageSlot::Backdrop, view.backdrop_url.as_deref());
        self.view = Some(view);
    }

    /// Flip the favorite flag of the displayed movie. The record is written
    /// to the store first so a movie never seen in a listing can still be
    /// favorited. Returns `false` when nothing is displayed.
    pub fn toggle_favorite(&mut self) -> bool {
        let Some(view) = &self.view else {
            return false;
        };
        let record = view.record.clone();
        let movie_id = record.id;
        let slot = self.slot;
        let request = self.request;
        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        let token = self.lifetime.child_token();

        tokio::spawn(async move {
            let joined = tokio::task::spawn_blocking(move || -> Result<bool, StoreError> {
                store.upsert_many(std::slice::from_ref(&record))?;
                store.toggle_favorite(record.id)
            })
            .await;
            let result = match joined {
                Ok(r) => r.map_err(|e| Notice::new(Operation::UpdateFavorite(movie_id), e)),
                Err(e) => Err(Notice::new(Operation::UpdateFavorite(movie_id), e)),
            };
            if token.is_cancelled() {
                return;
            }
            let _ = events.send(CoreEvent::Detail(DetailOutcome {
                slot,
                request,
                movie_id,
                payload: DetailPayload::Favorite(result),
            }));
        });
        true
    }

    pub fn apply(&mut self, outcome: DetailOutcome, images: &mut dyn ImageSink) -> DetailUpdate {
        match outcome.payload {
            DetailPayload::Record(result) => {
                if outcome.request != self.request {
                    tracing::debug!(
                        movie_id = %outcome.movie_id,
                        request = outcome.request,
                        current = self.request,
                        "dropping stale detail outcome"
                    );
                    return DetailUpdate::Stale;
                }
                self.in_flight = None;
                self.pending = None;
                match result {
                    Ok((record, is_favorite)) => {
                        let id = record.id;
                        self.display(DetailView::render(record, is_favorite, &self.image_base), images);
                        DetailUpdate::Shown(id)
                    }
                    Err(notice) => {
                        tracing::warn!(movie_id = %outcome.movie_id, error = %notice.detail, "{}", notice);
                        DetailUpdate::Failed(notice)
                    }
                }
            }
            DetailPayload::Favorite(result) => match result {
                Ok(is_favorite) => {
                    if let Some(view) = &mut self.view
                        && view.record.id == outcome.movie_id
                    {
                        view.is_favorite = is_favorite;
                    }
                    tracing::info!(movie_id = %outcome.movie_id, is_favorite, "favorite toggled");
                    DetailUpdate::FavoriteChanged {
                        movie_id: outcome.movie_id,
                        is_favorite,
                    }
                }
                Err(notice) => {
                    tracing::warn!(movie_id = %outcome.movie_id, error = %notice.detail, "{}", notice);
                    DetailUpdate::Failed(notice)
                }
            },
        }
    }

    /// Abandon whatever is in flight.
    pub fn cancel(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
        self.pending = None;
    }
}

async fn fetch_detail(
    catalog: Arc<dyn CatalogBackend>,
    store: Arc<dyn FavoritesStore>,
    movie_id: MovieId,
) -> Result<(MovieRecord, bool), Notice> {
    let record = catalog
        .movie_detail(movie_id, true)
        .await
        .map_err(|e| Notice::new(Operation::DownloadMovie(movie_id), e))?;

    // Cache the full record (runtime is only known from detail) and read
    // back the favorite flag. Store trouble only costs the star.
    let cached = record.clone();
    let is_favorite = tokio::task::spawn_blocking(move || {
        if let Err(e) = store.upsert_many(std::slice::from_ref(&cached)) {
            tracing::warn!(movie_id = %cached.id, error = %e, "failed to cache movie detail");
        }
        store.is_favorite(cached.id)
    })
    .await;
    let is_favorite = match is_favorite {
        Ok(Ok(flag)) => flag,
        Ok(Err(e)) => {
            tracing::warn!(%movie_id, error = %e, "failed to read favorite flag");
            false
        }
        Err(e) => {
            tracing::warn!(%movie_id, error = %e, "favorite lookup panicked");
            false
        }
    };
    Ok((record, is_favorite))
}
