//! Scripted catalog backend used by tests across the workspace.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{CatalogBackend, CatalogError, CatalogFuture, CatalogPage};
use crate::model::{CatalogOrder, MovieId, MovieRecord};

/// A canned failure the mock hands out instead of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Timeout,
    Network,
    Malformed,
}

impl MockFailure {
    fn into_error(self) -> CatalogError {
        match self {
            MockFailure::Timeout => CatalogError::Timeout,
            MockFailure::Network => CatalogError::Network("connection refused".into()),
            MockFailure::Malformed => CatalogError::Malformed("expected value at line 1".into()),
        }
    }
}

/// In-memory [`CatalogBackend`].
///
/// Listings are served from a fixed per-order vector, paginated by
/// `page_size`. Failures queued with [`fail_next_list`](MockCatalog::fail_next_list)
/// are consumed one call at a time before normal responses resume.
pub struct MockCatalog {
    lists: HashMap<CatalogOrder, Vec<MovieRecord>>,
    details: HashMap<MovieId, MovieRecord>,
    page_size: usize,
    delays: Mutex<HashMap<CatalogOrder, Duration>>,
    list_failures: Mutex<VecDeque<MockFailure>>,
    detail_failures: Mutex<VecDeque<MockFailure>>,
    list_calls: AtomicUsize,
    detail_calls: AtomicUsize,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    pub fn new() -> Self {
        Self {
            lists: HashMap::new(),
            details: HashMap::new(),
            page_size: 20,
            delays: Mutex::new(HashMap::new()),
            list_failures: Mutex::new(VecDeque::new()),
            detail_failures: Mutex::new(VecDeque::new()),
            list_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
        }
    }

    /// Serve `movies` for `order`. Every movie also becomes available as a
    /// detail record unless one was registered with [`with_detail`](Self::with_detail).
    pub fn with_list(mut self, order: CatalogOrder, movies: Vec<MovieRecord>) -> Self {
        for m in &movies {
            self.details.entry(m.id).or_insert_with(|| m.clone());
        }
        self.lists.insert(order, movies);
        self
    }

    pub fn with_detail(mut self, movie: MovieRecord) -> Self {
        self.details.insert(movie.id, movie);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Delay every listing for `order` by `delay`.
    pub fn set_delay(&self, order: CatalogOrder, delay: Duration) {
        lock(&self.delays).insert(order, delay);
    }

    pub fn fail_next_list(&self, failure: MockFailure) {
        lock(&self.list_failures).push_back(failure);
    }

    pub fn fail_next_detail(&self, failure: MockFailure) {
        lock(&self.detail_failures).push_back(failure);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    fn page_of(&self, order: CatalogOrder, page: u32) -> CatalogPage {
        let all = self.lists.get(&order).map(Vec::as_slice).unwrap_or(&[]);
        let total_pages = all.len().div_ceil(self.page_size) as u32;
        let start = (page.saturating_sub(1) as usize).saturating_mul(self.page_size);
        let results = all
            .iter()
            .skip(start)
            .take(self.page_size)
            .cloned()
            .collect();
        CatalogPage {
            page,
            total_pages,
            total_results: all.len() as u32,
            results,
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl CatalogBackend for MockCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    fn list_movies(&self, order: CatalogOrder, page: u32) -> CatalogFuture<'_, CatalogPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let failure = lock(&self.list_failures).pop_front();
        let delay = lock(&self.delays).get(&order).copied();

        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            match failure {
                Some(f) => Err(f.into_error()),
                None => Ok(self.page_of(order, page)),
            }
        })
    }

    fn movie_detail(&self, id: MovieId, _include_extras: bool) -> CatalogFuture<'_, MovieRecord> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let failure = lock(&self.detail_failures).pop_front();

        Box::pin(async move {
            if let Some(f) = failure {
                return Err(f.into_error());
            }
            self.details.get(&id).cloned().ok_or(CatalogError::NotFound)
        })
    }
}
