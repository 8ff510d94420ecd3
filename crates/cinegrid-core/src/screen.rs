//! One instance of the master grid.
//!
//! A [`Screen`] wires a [`ListingController`] to a [`MasterDetail`]
//! coordinator and, in dual-pane layout, a pane [`DetailLoader`]. A
//! standalone detail screen opened in single-pane layout also lives here so
//! that its tasks die with the screen. Every task spawned on behalf of the
//! screen runs under `lifetime`; [`Screen::destroy`] cancels it and hands
//! back the stashed listing for the replacement screen.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::catalog::CatalogBackend;
use crate::coordinator::{DetailTarget, Layout, MasterDetail, Route, SelectionEvent};
use crate::detail::{DetailLoader, DetailSlot, DetailUpdate};
use crate::event::{CoreEvent, EventSender};
use crate::images::ImageSink;
use crate::listing::{ListingController, ListingSnapshot, ListingUpdate};
use crate::model::{MovieId, SortMode};
use crate::notice::Notice;
use crate::source::SourceOrigin;
use crate::store::FavoritesStore;

/// Long-lived collaborators shared by every screen instance.
#[derive(Clone)]
pub struct ScreenDeps {
    pub catalog: Arc<dyn CatalogBackend>,
    pub store: Arc<dyn FavoritesStore>,
    pub events: EventSender,
    pub image_base: String,
}

/// What changed, for the presentation layer to redraw.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenEffect {
    ListingReady { count: usize },
    DetailShown { slot: DetailSlot, movie_id: MovieId },
    /// A standalone detail screen was pushed.
    DetailOpened(MovieId),
    FavoriteChanged { movie_id: MovieId, is_favorite: bool },
    Notice(Notice),
}

pub struct Screen {
    lifetime: CancellationToken,
    listing: ListingController,
    coordinator: MasterDetail,
    pane: Option<DetailLoader>,
    opened: Option<DetailLoader>,
    deps: ScreenDeps,
}

impl std::fmt::Debug for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("layout", &self.coordinator.layout())
            .field("listing", &self.listing)
            .field("pane", &self.pane)
            .field("opened", &self.opened)
            .finish()
    }
}

impl Screen {
    /// Build a screen for `layout`. A snapshot restores the previous
    /// screen's listing without a query (and re-selects its last row);
    /// otherwise a fresh load under `default_mode` starts.
    pub fn create(
        deps: ScreenDeps,
        layout: Layout,
        snapshot: Option<ListingSnapshot>,
        default_mode: SortMode,
        images: &mut dyn ImageSink,
    ) -> (Self, Vec<ScreenEffect>) {
        let lifetime = CancellationToken::new();
        let (listing, restored) = ListingController::resume(
            Arc::clone(&deps.catalog),
            Arc::clone(&deps.store),
            deps.events.clone(),
            &lifetime,
            snapshot,
            default_mode,
        );
        let coordinator = MasterDetail::new(layout);
        let pane = coordinator
            .has_pane()
            .then(|| Self::loader(&deps, &lifetime, DetailSlot::Pane));
        tracing::info!(?layout, sort_mode = ?listing.sort_mode(), "screen created");

        let mut screen = Self {
            lifetime,
            listing,
            coordinator,
            pane,
            opened: None,
            deps,
        };
        let effects = match restored {
            Some(update) => screen.on_listing(update, images),
            None => Vec::new(),
        };
        (screen, effects)
    }

    fn loader(deps: &ScreenDeps, lifetime: &CancellationToken, slot: DetailSlot) -> DetailLoader {
        DetailLoader::new(
            slot,
            Arc::clone(&deps.catalog),
            Arc::clone(&deps.store),
            deps.events.clone(),
            lifetime,
            deps.image_base.clone(),
        )
    }

    /// Tear the screen down. In-flight work is cancelled and never reports
    /// back; the returned snapshot seeds the next screen.
    pub fn destroy(self) -> Option<ListingSnapshot> {
        self.lifetime.cancel();
        tracing::info!(layout = ?self.coordinator.layout(), "screen destroyed");
        self.listing.stash()
    }

    /// Snapshot the listing without tearing the screen down.
    pub fn stash(&self) -> Option<ListingSnapshot> {
        self.listing.stash()
    }

    pub fn layout(&self) -> Layout {
        self.coordinator.layout()
    }

    pub fn listing(&self) -> &ListingController {
        &self.listing
    }

    pub fn pane(&self) -> Option<&DetailLoader> {
        self.pane.as_ref()
    }

    /// The standalone detail screen, when one is open.
    pub fn opened(&self) -> Option<&DetailLoader> {
        self.opened.as_ref()
    }

    pub fn close_detail(&mut self) -> bool {
        match self.opened.take() {
            Some(mut loader) => {
                loader.cancel();
                true
            }
            None => false,
        }
    }

    /// Switch sort mode and reload. Choosing the active mode does nothing.
    pub fn choose_sort_mode(&mut self, mode: SortMode) -> bool {
        if mode == self.listing.sort_mode() {
            return false;
        }
        self.listing.set_sort_mode(mode);
        self.listing.load();
        true
    }

    pub fn cycle_sort_mode(&mut self) -> SortMode {
        let next = self.listing.sort_mode().next();
        self.choose_sort_mode(next);
        next
    }

    pub fn reload(&mut self) {
        self.listing.load();
    }

    /// Re-run the favorites query when favorites are listed. Returns whether
    /// a reload was started.
    pub fn refresh_favorites(&mut self) -> bool {
        self.listing.refresh_favorites()
    }

    pub fn load_more(&mut self) -> bool {
        self.listing.load_more()
    }

    /// User picked the row at `index`.
    pub fn select(&mut self, index: usize, images: &mut dyn ImageSink) -> Vec<ScreenEffect> {
        match self.listing.select(index, true) {
            Some(event) => self.route(event, images),
            None => Vec::new(),
        }
    }

    /// The cursor moved onto `index` without the user opening it. A dual
    /// pane follows; a single-pane screen only remembers the position.
    pub fn highlight(&mut self, index: usize, images: &mut dyn ImageSink) -> Vec<ScreenEffect> {
        match self.listing.select(index, false) {
            Some(event) => self.route(event, images),
            None => Vec::new(),
        }
    }

    fn route(&mut self, event: SelectionEvent, images: &mut dyn ImageSink) -> Vec<ScreenEffect> {
        let materialized = match self.listing.collection().map(|c| c.origin()) {
            Some(SourceOrigin::Favorites) => self.listing.record(event.movie_id),
            _ => None,
        };
        match self.coordinator.route(event, materialized) {
            Route::ShowInPane(id) => {
                if let Some(pane) = &mut self.pane {
                    pane.load_detail(id);
                }
                Vec::new()
            }
            Route::OpenScreen(target) => {
                let id = target.movie_id();
                let mut loader = Self::loader(&self.deps, &self.lifetime, DetailSlot::Screen);
                let mut effects = vec![ScreenEffect::DetailOpened(id)];
                match target {
                    DetailTarget::Record(record) => {
                        // A restored favorites listing can be older than the store.
                        let is_favorite = self.deps.store.is_favorite(id).unwrap_or_else(|e| {
                            tracing::warn!(movie_id = %id, error = %e, "favorite lookup failed");
                            true
                        });
                        loader.show_record(*record, is_favorite, images);
                        effects.push(ScreenEffect::DetailShown {
                            slot: DetailSlot::Screen,
                            movie_id: id,
                        });
                    }
                    DetailTarget::Id(id) => loader.load_detail(id),
                }
                if let Some(mut previous) = self.opened.replace(loader) {
                    previous.cancel();
                }
                effects
            }
            Route::Ignore => Vec::new(),
        }
    }

    /// Toggle the favorite flag of whichever detail is in front: the open
    /// detail screen, else the pane.
    pub fn toggle_favorite(&mut self) -> bool {
        if let Some(opened) = &mut self.opened {
            return opened.toggle_favorite();
        }
        self.pane.as_mut().is_some_and(DetailLoader::toggle_favorite)
    }

    /// Apply a background outcome. Outcomes for a detail surface that no
    /// longer exists are dropped.
    pub fn handle(&mut self, event: CoreEvent, images: &mut dyn ImageSink) -> Vec<ScreenEffect> {
        match event {
            CoreEvent::Listing(outcome) => {
                let update = self.listing.apply(outcome);
                self.on_listing(update, images)
            }
            CoreEvent::Detail(outcome) => {
                let slot = outcome.slot;
                let loader = match slot {
                    DetailSlot::Pane => self.pane.as_mut(),
                    DetailSlot::Screen => self.opened.as_mut(),
                };
                let Some(loader) = loader else {
                    return Vec::new();
                };
                match loader.apply(outcome, images) {
                    DetailUpdate::Shown(movie_id) => {
                        vec![ScreenEffect::DetailShown { slot, movie_id }]
                    }
                    DetailUpdate::FavoriteChanged {
                        movie_id,
                        is_favorite,
                    } => {
                        self.listing.refresh_favorites();
                        vec![ScreenEffect::FavoriteChanged {
                            movie_id,
                            is_favorite,
                        }]
                    }
                    DetailUpdate::Failed(notice) => vec![ScreenEffect::Notice(notice)],
                    DetailUpdate::Stale => Vec::new(),
                }
            }
        }
    }

    fn on_listing(&mut self, update: ListingUpdate, images: &mut dyn ImageSink) -> Vec<ScreenEffect> {
        match update {
            ListingUpdate::Ready { count, reselect } => {
                let mut effects = vec![ScreenEffect::ListingReady { count }];
                if let Some(event) = reselect {
                    effects.extend(self.route(event, images));
                }
                effects
            }
            ListingUpdate::Failed(notice) => vec![ScreenEffect::Notice(notice)],
            ListingUpdate::Stale => Vec::new(),
        }
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}
