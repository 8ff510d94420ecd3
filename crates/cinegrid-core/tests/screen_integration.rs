//! End-to-end tests for [`Screen`]: listing, routing and detail loading
//! driven through the event channel against a scripted catalog.

use std::sync::Arc;
use std::time::Duration;

use cinegrid_core::catalog::mock::MockCatalog;
use cinegrid_core::event::{self, EventReceiver};
use cinegrid_core::images::{DEFAULT_IMAGE_BASE, LatestImages};
use cinegrid_core::{
    CatalogOrder, DetailSlot, FavoritesStore, Layout, ListingSnapshot, MovieId, MovieRecord,
    MovieStore, Screen, ScreenDeps, ScreenEffect, SortMode,
};

fn movie(id: u32, title: &str) -> MovieRecord {
    let mut m = MovieRecord::new(MovieId(id), title);
    m.poster_path = Some(format!("/poster{id}.jpg"));
    m
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

struct Fixture {
    deps: ScreenDeps,
    rx: EventReceiver,
    catalog: Arc<MockCatalog>,
    store: Arc<MovieStore>,
    images: LatestImages,
}

fn fixture(catalog: MockCatalog) -> Fixture {
    let catalog = Arc::new(catalog);
    let store = Arc::new(MovieStore::open_in_memory().unwrap());
    let (tx, rx) = event::channel();
    Fixture {
        deps: ScreenDeps {
            catalog: catalog.clone(),
            store: store.clone(),
            events: tx,
            image_base: DEFAULT_IMAGE_BASE.to_string(),
        },
        rx,
        catalog,
        store,
        images: LatestImages::default(),
    }
}

/// Apply events until one yields an effect matching `done`.
async fn pump_until(
    screen: &mut Screen,
    fx: &mut Fixture,
    done: impl Fn(&ScreenEffect) -> bool,
) -> Vec<ScreenEffect> {
    let mut seen = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), fx.rx.recv())
            .await
            .expect("timed out waiting for core event")
            .expect("channel closed");
        let effects = screen.handle(event, &mut fx.images);
        let finished = effects.iter().any(&done);
        seen.extend(effects);
        if finished {
            return seen;
        }
    }
}

fn is_ready(e: &ScreenEffect) -> bool {
    matches!(e, ScreenEffect::ListingReady { .. })
}

fn ids(screen: &Screen) -> Vec<u32> {
    screen
        .listing()
        .collection()
        .map(|c| c.items().iter().map(|m| m.id.0).collect())
        .unwrap_or_default()
}

fn snapshot(mode: SortMode, movies: Vec<MovieRecord>, last_index: usize) -> ListingSnapshot {
    ListingSnapshot {
        sort_mode: mode,
        page: 1,
        total_pages: 1,
        last_index,
        movies,
    }
}

#[tokio::test]
async fn dual_pane_restore_reselects_into_pane() {
    let mut fx = fixture(catalog());
    let snap = snapshot(
        SortMode::Popularity,
        vec![movie(1, "Alien"), movie(2, "Heat"), movie(3, "Ran")],
        2,
    );
    let (mut screen, effects) = Screen::create(
        fx.deps.clone(),
        Layout::DualPane,
        Some(snap),
        SortMode::Popularity,
        &mut fx.images,
    );
    assert_eq!(effects, vec![ScreenEffect::ListingReady { count: 3 }]);
    assert_eq!(screen.pane().and_then(|p| p.pending()), Some(MovieId(3)));

    let effects = pump_until(&mut screen, &mut fx, |e| {
        matches!(e, ScreenEffect::DetailShown { .. })
    })
    .await;
    assert!(effects.contains(&ScreenEffect::DetailShown {
        slot: DetailSlot::Pane,
        movie_id: MovieId(3),
    }));
    assert!(screen.opened().is_none());
    assert_eq!(fx.catalog.list_calls(), 0);
    assert_eq!(
        fx.images.poster.as_deref(),
        Some("https://image.tmdb.org/t/p/w185/poster3.jpg")
    );
}

#[tokio::test]
async fn single_pane_programmatic_selection_is_ignored() {
    let mut fx = fixture(catalog());
    let (mut screen, _) = Screen::create(
        fx.deps.clone(),
        Layout::SinglePane,
        None,
        SortMode::Popularity,
        &mut fx.images,
    );
    let effects = pump_until(&mut screen, &mut fx, is_ready).await;
    assert_eq!(effects, vec![ScreenEffect::ListingReady { count: 4 }]);
    assert!(screen.pane().is_none());
    assert!(screen.opened().is_none());
    assert_eq!(fx.catalog.detail_calls(), 0);
}

#[tokio::test]
async fn single_pane_user_selection_opens_detail() {
    let mut fx = fixture(catalog());
    let (mut screen, _) = Screen::create(
        fx.deps.clone(),
        Layout::SinglePane,
        None,
        SortMode::Popularity,
        &mut fx.images,
    );
    pump_until(&mut screen, &mut fx, is_ready).await;

    assert_eq!(
        screen.select(1, &mut fx.images),
        vec![ScreenEffect::DetailOpened(MovieId(2))]
    );
    let effects = pump_until(&mut screen, &mut fx, |e| {
        matches!(e, ScreenEffect::DetailShown { .. })
    })
    .await;
    assert!(effects.contains(&ScreenEffect::DetailShown {
        slot: DetailSlot::Screen,
        movie_id: MovieId(2),
    }));
    assert_eq!(screen.opened().and_then(|d| d.view()).map(|v| v.title.as_str()), Some("Heat"));
    assert!(screen.close_detail());
    assert!(!screen.close_detail());
}

#[tokio::test]
async fn single_pane_favorite_opens_without_network() {
    let mut fx = fixture(catalog());
    fx.store.upsert_many(&[movie(20, "Vertigo")]).unwrap();
    fx.store.toggle_favorite(MovieId(20)).unwrap();

    let (mut screen, _) = Screen::create(
        fx.deps.clone(),
        Layout::SinglePane,
        None,
        SortMode::Favorites,
        &mut fx.images,
    );
    pump_until(&mut screen, &mut fx, is_ready).await;

    let effects = screen.select(0, &mut fx.images);
    assert_eq!(
        effects,
        vec![
            ScreenEffect::DetailOpened(MovieId(20)),
            ScreenEffect::DetailShown {
                slot: DetailSlot::Screen,
                movie_id: MovieId(20)
            },
        ]
    );
    assert_eq!(fx.catalog.detail_calls(), 0);
    assert_eq!(fx.catalog.list_calls(), 0);
}

#[tokio::test]
async fn mode_round_trip_matches_fresh_load() {
    let mut fx = fixture(catalog());
    let (mut screen, _) = Screen::create(
        fx.deps.clone(),
        Layout::SinglePane,
        None,
        SortMode::Popularity,
        &mut fx.images,
    );
    pump_until(&mut screen, &mut fx, is_ready).await;
    let fresh = ids(&screen);

    assert!(screen.choose_sort_mode(SortMode::Rating));
    pump_until(&mut screen, &mut fx, is_ready).await;
    assert_eq!(ids(&screen), vec![10, 11]);

    assert!(screen.choose_sort_mode(SortMode::Popularity));
    pump_until(&mut screen, &mut fx, is_ready).await;
    assert_eq!(ids(&screen), fresh);
    assert_eq!(screen.listing().last_index(), 0);

    // Re-choosing the active mode does not reload.
    let calls = fx.catalog.list_calls();
    assert!(!screen.choose_sort_mode(SortMode::Popularity));
    assert_eq!(fx.catalog.list_calls(), calls);
}

#[tokio::test]
async fn layout_change_recreates_screen_from_stash() {
    let mut fx = fixture(catalog());
    let (mut screen, _) = Screen::create(
        fx.deps.clone(),
        Layout::SinglePane,
        None,
        SortMode::Rating,
        &mut fx.images,
    );
    pump_until(&mut screen, &mut fx, is_ready).await;
    screen.select(1, &mut fx.images);
    let calls = fx.catalog.list_calls();

    let stash = screen.destroy();
    assert!(stash.is_some());
    let (mut screen, effects) = Screen::create(
        fx.deps.clone(),
        Layout::DualPane,
        stash,
        SortMode::Popularity,
        &mut fx.images,
    );
    assert_eq!(effects, vec![ScreenEffect::ListingReady { count: 2 }]);
    assert_eq!(screen.listing().sort_mode(), SortMode::Rating);
    assert_eq!(screen.listing().last_index(), 1);
    assert_eq!(fx.catalog.list_calls(), calls);

    // The old screen's detail fetch was cancelled; only the pane reports.
    let effects = pump_until(&mut screen, &mut fx, |e| {
        matches!(e, ScreenEffect::DetailShown { .. })
    })
    .await;
    assert!(effects.contains(&ScreenEffect::DetailShown {
        slot: DetailSlot::Pane,
        movie_id: MovieId(11),
    }));
}

#[tokio::test]
async fn toggling_in_pane_refreshes_favorites() {
    let mut fx = fixture(
        catalog()
            .with_detail(movie(30, "Brazil"))
            .with_detail(movie(31, "Zelig")),
    );
    fx.store
        .upsert_many(&[movie(30, "Brazil"), movie(31, "Zelig")])
        .unwrap();
    fx.store.toggle_favorite(MovieId(30)).unwrap();
    fx.store.toggle_favorite(MovieId(31)).unwrap();

    let (mut screen, _) = Screen::create(
        fx.deps.clone(),
        Layout::DualPane,
        None,
        SortMode::Favorites,
        &mut fx.images,
    );
    pump_until(&mut screen, &mut fx, |e| {
        matches!(e, ScreenEffect::DetailShown { .. })
    })
    .await;
    assert_eq!(ids(&screen), vec![30, 31]);

    assert!(screen.toggle_favorite());
    let effects = pump_until(&mut screen, &mut fx, |e| {
        matches!(e, ScreenEffect::FavoriteChanged { .. })
    })
    .await;
    assert!(effects.contains(&ScreenEffect::FavoriteChanged {
        movie_id: MovieId(30),
        is_favorite: false,
    }));
    pump_until(&mut screen, &mut fx, is_ready).await;
    assert_eq!(ids(&screen), vec![31]);
}

#[tokio::test]
async fn restored_favorites_reflect_current_store() {
    let mut fx = fixture(catalog());
    fx.store
        .upsert_many(&[movie(20, "Vertigo"), movie(21, "Zelig")])
        .unwrap();
    fx.store.toggle_favorite(MovieId(20)).unwrap();

    // Saved while both were favorites; 21 has since been removed.
    let snap = snapshot(
        SortMode::Favorites,
        vec![movie(20, "Vertigo"), movie(21, "Zelig")],
        0,
    );
    let (mut screen, _) = Screen::create(
        fx.deps.clone(),
        Layout::SinglePane,
        Some(snap),
        SortMode::Popularity,
        &mut fx.images,
    );
    screen.select(1, &mut fx.images);
    let view = screen.opened().and_then(|d| d.view()).unwrap();
    assert_eq!(view.record.id, MovieId(21));
    assert!(!view.is_favorite);

    assert!(screen.refresh_favorites());
    pump_until(&mut screen, &mut fx, is_ready).await;
    assert_eq!(ids(&screen), vec![20]);
    assert_eq!(fx.catalog.list_calls(), 0);
}
