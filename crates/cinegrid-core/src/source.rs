//! The grid's backing collection, independent of where the rows came from.

use crate::model::{CatalogOrder, MovieId, MovieRecord};

/// Where a collection was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    Remote(CatalogOrder),
    Favorites,
}

/// Read-only view over the active collection.
pub trait MovieSource: Send + std::fmt::Debug {
    fn origin(&self) -> SourceOrigin;

    fn count(&self) -> usize;

    fn item_at(&self, index: usize) -> Option<&MovieRecord>;

    /// All rows in display order.
    fn items(&self) -> &[MovieRecord];

    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    fn position_of(&self, id: MovieId) -> Option<usize> {
        self.items().iter().position(|m| m.id == id)
    }
}

/// Pages fetched from the remote catalog, in catalog order.
#[derive(Debug, Clone)]
pub struct RemoteList {
    order: CatalogOrder,
    movies: Vec<MovieRecord>,
    page: u32,
    total_pages: u32,
}

impl RemoteList {
    pub fn new(order: CatalogOrder, movies: Vec<MovieRecord>, page: u32, total_pages: u32) -> Self {
        Self {
            order,
            movies,
            page,
            total_pages,
        }
    }

    pub fn order(&self) -> CatalogOrder {
        self.order
    }

    /// Last page loaded (1-based).
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }

    /// Append a later page, skipping ids already present. Returns how many
    /// rows were added.
    pub fn append_page(&mut self, page: u32, total_pages: u32, movies: Vec<MovieRecord>) -> usize {
        let before = self.movies.len();
        for m in movies {
            if !self.movies.iter().any(|existing| existing.id == m.id) {
                self.movies.push(m);
            }
        }
        self.page = page;
        self.total_pages = total_pages;
        self.movies.len() - before
    }
}

impl MovieSource for RemoteList {
    fn origin(&self) -> SourceOrigin {
        SourceOrigin::Remote(self.order)
    }

    fn count(&self) -> usize {
        self.movies.len()
    }

    fn item_at(&self, index: usize) -> Option<&MovieRecord> {
        self.movies.get(index)
    }

    fn items(&self) -> &[MovieRecord] {
        &self.movies
    }
}

/// Result of the favorites query, already title-sorted by the store.
#[derive(Debug, Clone, Default)]
pub struct FavoritesQuery {
    movies: Vec<MovieRecord>,
}

impl FavoritesQuery {
    pub fn new(movies: Vec<MovieRecord>) -> Self {
        Self { movies }
    }
}

impl MovieSource for FavoritesQuery {
    fn origin(&self) -> SourceOrigin {
        SourceOrigin::Favorites
    }

    fn count(&self) -> usize {
        self.movies.len()
    }

    fn item_at(&self, index: usize) -> Option<&MovieRecord> {
        self.movies.get(index)
    }

    fn items(&self) -> &[MovieRecord] {
        &self.movies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movies(ids: &[u32]) -> Vec<MovieRecord> {
        ids.iter()
            .map(|&id| MovieRecord::new(MovieId(id), format!("Movie {id}")))
            .collect()
    }

    #[test]
    fn append_skips_duplicates() {
        let mut list = RemoteList::new(CatalogOrder::PopularityDesc, movies(&[1, 2, 3]), 1, 3);
        let added = list.append_page(2, 3, movies(&[3, 4, 5]));
        assert_eq!(added, 2);
        assert_eq!(list.count(), 5);
        assert_eq!(list.page(), 2);
        assert!(list.has_more());
        assert_eq!(list.position_of(MovieId(5)), Some(4));
    }

    #[test]
    fn sources_are_interchangeable() {
        let sources: Vec<Box<dyn MovieSource>> = vec![
            Box::new(RemoteList::new(CatalogOrder::RatingDesc, movies(&[7]), 1, 1)),
            Box::new(FavoritesQuery::new(movies(&[8, 9]))),
        ];
        assert_eq!(sources[0].count(), 1);
        assert_eq!(sources[1].item_at(1).map(|m| m.id), Some(MovieId(9)));
        assert!(sources[1].item_at(2).is_none());
        assert_eq!(sources[1].origin(), SourceOrigin::Favorites);
    }
}
