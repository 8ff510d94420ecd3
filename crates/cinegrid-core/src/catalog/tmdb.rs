use std::time::Duration;

use super::{CatalogBackend, CatalogError, CatalogFuture, CatalogPage};
use crate::model::{CatalogOrder, MovieId, MovieRecord};

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// TMDB v3 REST client.
pub struct TmdbClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
    /// Applied to rating-ordered listings so that titles with a handful of
    /// votes don't dominate the top of the list.
    rating_min_votes: Option<u32>,
}

impl std::fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbClient")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("rating_min_votes", &self.rating_min_votes)
            .finish()
    }
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            rating_min_votes: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_rating_min_votes(mut self, min_votes: Option<u32>) -> Self {
        self.rating_min_votes = min_votes;
        self
    }

    fn check_key(&self) -> Result<(), CatalogError> {
        if self.api_key.trim().is_empty() {
            return Err(CatalogError::MissingApiKey);
        }
        Ok(())
    }

    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, CatalogError> {
        let resp = self
            .client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(status_error(status.as_u16()));
        }
        Ok(resp.text().await?)
    }
}

fn status_error(status: u16) -> CatalogError {
    match status {
        401 => CatalogError::Unauthorized,
        404 => CatalogError::NotFound,
        429 => CatalogError::RateLimited,
        other => CatalogError::Http(other),
    }
}

/// Decode a `/discover/movie` response body.
pub fn parse_page(body: &str) -> Result<CatalogPage, CatalogError> {
    serde_json::from_str(body).map_err(|e| CatalogError::Malformed(e.to_string()))
}

/// Decode a `/movie/{id}` response body.
pub fn parse_detail(body: &str) -> Result<MovieRecord, CatalogError> {
    serde_json::from_str(body).map_err(|e| CatalogError::Malformed(e.to_string()))
}

impl CatalogBackend for TmdbClient {
    fn name(&self) -> &str {
        "TMDB"
    }

    fn list_movies(&self, order: CatalogOrder, page: u32) -> CatalogFuture<'_, CatalogPage> {
        Box::pin(async move {
            self.check_key()?;
            let url = format!("{}/discover/movie", self.base_url);
            let mut query = vec![
                ("sort_by", order.sort_by().to_string()),
                ("page", page.max(1).to_string()),
            ];
            if order == CatalogOrder::RatingDesc
                && let Some(min) = self.rating_min_votes
            {
                query.push(("vote_count.gte", min.to_string()));
            }
            let body = self.get_text(&url, &query).await?;
            let parsed = parse_page(&body)?;
            tracing::debug!(
                sort_by = order.sort_by(),
                page,
                results = parsed.results.len(),
                "catalog page fetched"
            );
            Ok(parsed)
        })
    }

    fn movie_detail(&self, id: MovieId, include_extras: bool) -> CatalogFuture<'_, MovieRecord> {
        Box::pin(async move {
            self.check_key()?;
            let url = format!("{}/movie/{}", self.base_url, id);
            let mut query = Vec::new();
            if include_extras {
                query.push(("append_to_response", "trailers,reviews".to_string()));
            }
            let body = self.get_text(&url, &query).await?;
            parse_detail(&body)
        })
    }
}
