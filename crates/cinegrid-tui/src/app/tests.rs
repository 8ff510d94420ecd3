use std::sync::Arc;
use std::time::Duration;

use cinegrid_core::catalog::mock::{MockCatalog, MockFailure};
use cinegrid_core::event::{self, EventReceiver};
use cinegrid_core::images::DEFAULT_IMAGE_BASE;
use cinegrid_core::{CatalogOrder, FavoritesStore, MovieId, MovieRecord, MovieStore};

use super::*;
use crate::action::Action;
use crate::model::message::MessageKind;

const NARROW: (u16, u16) = (80, 24);
const WIDE: (u16, u16) = (160, 40);

fn movie(id: u32, title: &str) -> MovieRecord {
    MovieRecord::new(MovieId(id), title)
}

fn catalog() -> MockCatalog {
    MockCatalog::new()
        .with_list(
            CatalogOrder::PopularityDesc,
            vec![
                movie(1, "Alien"),
                movie(2, "Heat"),
                movie(3, "Ran"),
                movie(4, "Solaris"),
            ],
        )
        .with_list(
            CatalogOrder::RatingDesc,
            vec![movie(10, "Ikiru"), movie(11, "Stalker")],
        )
}

struct Harness {
    app: App,
    rx: EventReceiver,
    catalog: Arc<MockCatalog>,
    store: Arc<MovieStore>,
}

/// Create an App over a mock catalog and an in-memory store.
fn harness(catalog: MockCatalog, size: (u16, u16)) -> Harness {
    let catalog = Arc::new(catalog);
    let store = Arc::new(MovieStore::open_in_memory().unwrap());
    let (tx, rx) = event::channel();
    let deps = ScreenDeps {
        catalog: catalog.clone(),
        store: store.clone(),
        events: tx,
        image_base: DEFAULT_IMAGE_BASE.to_string(),
    };
    let app = App::new(
        deps,
        LayoutPreference::Auto,
        SortMode::Popularity,
        size,
        None,
        Theme::dark(),
    );
    Harness {
        app,
        rx,
        catalog,
        store,
    }
}

impl Harness {
    /// Feed core events to the app until `done` holds.
    async fn settle(&mut self, done: impl Fn(&App) -> bool) {
        while !done(&self.app) {
            let event = tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
                .await
                .expect("timed out waiting for core event")
                .expect("channel closed");
            self.app.handle_core_event(event);
        }
    }
}

fn showing(app: &App) -> Option<MovieId> {
    app.detail().and_then(|d| d.view()).map(|v| v.record.id)
}

// ── Single-pane navigation ──────────────────────────────────────

#[tokio::test]
async fn enter_opens_detail_screen_and_esc_closes_it() {
    let mut h = harness(catalog(), NARROW);
    assert_eq!(h.app.layout(), Layout::SinglePane);
    h.settle(|app| app.count() == 4).await;

    h.app.update(Action::MoveDown);
    assert_eq!(h.app.cursor, 1);
    assert!(!h.app.detail_screen_open());
    assert_eq!(h.catalog.detail_calls(), 0);

    h.app.update(Action::Select);
    assert!(h.app.detail_screen_open());
    h.settle(|app| showing(app).is_some()).await;
    assert_eq!(showing(&h.app), Some(MovieId(2)));

    // Movement scrolls the detail instead of the grid.
    h.app.update(Action::MoveDown);
    assert_eq!(h.app.cursor, 1);
    assert_eq!(h.app.detail_scroll, 1);

    h.app.update(Action::NavigateBack);
    assert!(!h.app.detail_screen_open());
    assert_eq!(h.app.detail_scroll, 0);
}

#[tokio::test]
async fn moving_past_last_row_loads_next_page() {
    let mut h = harness(catalog().with_page_size(2), NARROW);
    h.settle(|app| app.count() == 2).await;

    h.app.update(Action::GoBottom);
    assert_eq!(h.app.cursor, 1);
    h.app.update(Action::MoveDown);
    h.settle(|app| app.count() == 4).await;
    assert_eq!(h.app.cursor, 1);
    assert_eq!(h.catalog.list_calls(), 2);

    h.app.update(Action::MoveDown);
    assert_eq!(h.app.cursor, 2);
}

// ── Sort modes ──────────────────────────────────────────────────

#[tokio::test]
async fn choosing_sort_mode_resets_cursor() {
    let mut h = harness(catalog(), NARROW);
    h.settle(|app| app.count() == 4).await;
    h.app.update(Action::GoBottom);
    assert_eq!(h.app.cursor, 3);

    h.app.update(Action::ChooseSort(SortMode::Rating));
    assert_eq!(h.app.cursor, 0);
    h.settle(|app| app.count() == 2).await;
    assert_eq!(h.app.screen.listing().sort_mode(), SortMode::Rating);

    let calls = h.catalog.list_calls();
    h.app.update(Action::ChooseSort(SortMode::Rating));
    assert_eq!(h.catalog.list_calls(), calls);
}

#[tokio::test]
async fn failed_load_shows_error_message() {
    let catalog = catalog();
    catalog.fail_next_list(MockFailure::Timeout);
    let mut h = harness(catalog, NARROW);
    h.settle(|app| app.messages.current().is_some()).await;

    let msg = h.app.messages.current().unwrap();
    assert_eq!(msg.kind, MessageKind::Error);
    assert_eq!(msg.text, "Failed to download movies");
    assert_eq!(h.app.count(), 0);

    h.app.update(Action::Reload);
    assert!(h.app.messages.current().is_none());
    h.settle(|app| app.count() == 4).await;
}

// ── Layout changes ──────────────────────────────────────────────

#[tokio::test]
async fn widening_recreates_screen_with_pane() {
    let mut h = harness(catalog(), NARROW);
    h.settle(|app| app.count() == 4).await;
    h.app.update(Action::MoveDown);
    h.app.update(Action::MoveDown);
    let calls = h.catalog.list_calls();

    h.app.update(Action::Resize(WIDE.0, WIDE.1));
    assert_eq!(h.app.layout(), Layout::DualPane);
    assert_eq!(h.app.cursor, 2);
    assert_eq!(h.app.count(), 4);
    assert_eq!(h.catalog.list_calls(), calls);

    h.settle(|app| showing(app).is_some()).await;
    assert_eq!(showing(&h.app), Some(MovieId(3)));
    assert_eq!(h.app.size, WIDE);
}

#[tokio::test]
async fn resize_within_layout_keeps_screen() {
    let mut h = harness(catalog(), WIDE);
    h.settle(|app| showing(app) == Some(MovieId(1))).await;

    h.app.update(Action::Resize(140, 30));
    assert_eq!(h.app.layout(), Layout::DualPane);
    assert_eq!(showing(&h.app), Some(MovieId(1)));
}

#[tokio::test]
async fn dual_pane_cursor_follows_into_pane() {
    let mut h = harness(catalog(), WIDE);
    h.settle(|app| showing(app) == Some(MovieId(1))).await;

    h.app.update(Action::MoveDown);
    h.settle(|app| showing(app) == Some(MovieId(2))).await;
    assert!(!h.app.detail_screen_open());
}

// ── Favorites ───────────────────────────────────────────────────

#[tokio::test]
async fn toggling_favorite_reports_and_persists() {
    let mut h = harness(catalog(), NARROW);
    h.settle(|app| app.count() == 4).await;

    h.app.update(Action::ToggleFavorite);
    assert_eq!(h.app.messages.current().unwrap().kind, MessageKind::Info);

    h.app.update(Action::Select);
    h.settle(|app| showing(app).is_some()).await;
    h.app.update(Action::ToggleFavorite);
    h.settle(|app| {
        app.messages
            .current()
            .is_some_and(|m| m.text == "Added to favorites")
    })
    .await;
    assert!(h.store.is_favorite(MovieId(1)).unwrap());
    assert!(h.app.detail().unwrap().view().unwrap().is_favorite);
}

#[tokio::test]
async fn unfavoriting_last_row_keeps_cursor_on_pane_movie() {
    let catalog = catalog()
        .with_detail(movie(20, "Brazil"))
        .with_detail(movie(21, "Vertigo"))
        .with_detail(movie(22, "Zelig"));
    let mut h = harness(catalog, WIDE);
    h.settle(|app| app.count() == 4).await;
    h.store
        .upsert_many(&[movie(20, "Brazil"), movie(21, "Vertigo"), movie(22, "Zelig")])
        .unwrap();
    for id in [20, 21, 22] {
        h.store.toggle_favorite(MovieId(id)).unwrap();
    }

    h.app.update(Action::ChooseSort(SortMode::Favorites));
    h.settle(|app| app.count() == 3).await;
    h.app.update(Action::GoBottom);
    h.settle(|app| showing(app) == Some(MovieId(22))).await;

    h.app.update(Action::ToggleFavorite);
    h.settle(|app| app.count() == 2 && showing(app) == Some(MovieId(21)))
        .await;
    assert_eq!(h.app.cursor, 1);
    let under_cursor = h.app.screen.listing().item_at(h.app.cursor).map(|m| m.id);
    assert_eq!(under_cursor, showing(&h.app));
}

// ── Help overlay ────────────────────────────────────────────────

#[tokio::test]
async fn help_overlay_swallows_navigation() {
    let mut h = harness(catalog(), NARROW);
    h.settle(|app| app.count() == 4).await;

    h.app.update(Action::ToggleHelp);
    assert!(h.app.show_help);
    h.app.update(Action::MoveDown);
    assert_eq!(h.app.cursor, 0);
    h.app.update(Action::NavigateBack);
    assert!(!h.app.show_help);
    assert!(h.app.update(Action::Quit));
}
