//! Remote movie catalog backends.

pub mod tmdb;

pub mod mock;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::model::{CatalogOrder, MovieId, MovieRecord};

/// One page of a catalog listing.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct CatalogPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
    #[serde(default)]
    pub results: Vec<MovieRecord>,
}

impl CatalogPage {
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("API key rejected (401)")]
    Unauthorized,
    #[error("not found (404)")]
    NotFound,
    #[error("rate limited (429)")]
    RateLimited,
    #[error("HTTP {0}")]
    Http(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("no TMDB API key configured")]
    MissingApiKey,
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CatalogError::Timeout
        } else if e.is_decode() {
            CatalogError::Malformed(e.to_string())
        } else {
            CatalogError::Network(e.to_string())
        }
    }
}

pub type CatalogFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CatalogError>> + Send + 'a>>;

/// A remote source of movie listings and detail records.
pub trait CatalogBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// One page (1-based) of movies in the given order.
    fn list_movies(&self, order: CatalogOrder, page: u32) -> CatalogFuture<'_, CatalogPage>;

    /// Full record for one movie. With `include_extras` the record carries
    /// trailers and reviews.
    fn movie_detail(&self, id: MovieId, include_extras: bool) -> CatalogFuture<'_, MovieRecord>;
}
