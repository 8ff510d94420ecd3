//! Movie records and the small value types that travel with them.
//!
//! [`MovieRecord`] deserializes straight from TMDB JSON and is also the
//! shape the store hydrates rows into. TMDB is loose about missing values
//! (`null`, `""`, absent keys all occur), so every optional field goes
//! through a tolerant deserializer.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Stable movie identifier, shared by the remote catalog and the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub u32);

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MovieId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(MovieId)
    }
}

/// One movie's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: MovieId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(
        default,
        deserialize_with = "lenient_date",
        serialize_with = "date_as_string"
    )]
    pub release_date: Option<NaiveDate>,
    /// Minutes. Only present on detail responses.
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_count: u32,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub poster_path: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub backdrop_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub popularity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailers: Option<Trailers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Reviews>,
}

impl MovieRecord {
    /// A record with only an id and a title; everything else empty.
    pub fn new(id: MovieId, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id,
            original_title: title.clone(),
            title,
            overview: String::new(),
            release_date: None,
            runtime: None,
            vote_average: 0.0,
            vote_count: 0,
            poster_path: None,
            backdrop_path: None,
            popularity: 0.0,
            trailers: None,
            reviews: None,
        }
    }

    pub fn release_year(&self) -> Option<i32> {
        use chrono::Datelike;
        self.release_date.map(|d| d.year())
    }

    pub fn trailer_count(&self) -> usize {
        self.trailers.as_ref().map_or(0, Trailers::count)
    }

    pub fn review_count(&self) -> usize {
        self.reviews.as_ref().map_or(0, |r| r.results.len())
    }

    /// Display title: the localized title, falling back to the original.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.original_title
        } else {
            &self.title
        }
    }
}

/// Trailer links as TMDB groups them by hosting site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trailers {
    #[serde(default, deserialize_with = "null_as_default")]
    pub quicktime: Vec<Trailer>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub youtube: Vec<Trailer>,
}

impl Trailers {
    pub fn count(&self) -> usize {
        self.quicktime.len() + self.youtube.len()
    }

    /// First trailer with a shareable watch URL.
    pub fn first_shareable(&self) -> Option<&Trailer> {
        self.youtube.iter().find(|t| !t.source.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trailer {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: String,
    /// Site-specific key; for YouTube this is the video id.
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
}

impl Trailer {
    pub fn youtube_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.source)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reviews {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<Review>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub url: Option<String>,
}

/// User-selected ordering/filter; decides which source backs the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Popularity,
    Rating,
    Favorites,
}

impl SortMode {
    pub const ALL: [SortMode; 3] = [SortMode::Popularity, SortMode::Rating, SortMode::Favorites];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Popularity => "Most Popular",
            Self::Rating => "Highest Rated",
            Self::Favorites => "Favorites",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Self::Popularity => Self::Rating,
            Self::Rating => Self::Favorites,
            Self::Favorites => Self::Popularity,
        }
    }

    /// Remote ordering for this mode, `None` for the favorites store.
    pub fn catalog_order(&self) -> Option<CatalogOrder> {
        match self {
            Self::Popularity => Some(CatalogOrder::PopularityDesc),
            Self::Rating => Some(CatalogOrder::RatingDesc),
            Self::Favorites => None,
        }
    }

    pub fn is_remote(&self) -> bool {
        self.catalog_order().is_some()
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "popularity" | "popular" => Ok(Self::Popularity),
            "rating" | "rated" | "top" => Ok(Self::Rating),
            "favorites" | "favourites" | "fav" => Ok(Self::Favorites),
            other => Err(format!("unknown sort mode: {other}")),
        }
    }
}

/// Ordering understood by the remote catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogOrder {
    PopularityDesc,
    RatingDesc,
}

impl CatalogOrder {
    /// TMDB `sort_by` query value.
    pub fn sort_by(&self) -> &'static str {
        match self {
            Self::PopularityDesc => "popularity.desc",
            Self::RatingDesc => "vote_average.desc",
        }
    }
}

// ── serde helpers ───────────────────────────────────────────────────────

fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

fn blank_as_none<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(de)?.filter(|s| !s.trim().is_empty()))
}

fn lenient_date<'de, D>(de: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.as_deref().and_then(parse_date))
}

fn date_as_string<S>(date: &Option<NaiveDate>, ser: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(d) => ser.serialize_some(&d.format("%Y-%m-%d").to_string()),
        None => ser.serialize_none(),
    }
}

/// Parse a TMDB `YYYY-MM-DD` date; blank or malformed → `None`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerates_nulls_and_blanks() {
        let json = r#"{
            "id": 7,
            "title": "Seven",
            "original_title": null,
            "overview": null,
            "release_date": "",
            "vote_average": 8.1,
            "vote_count": 12,
            "poster_path": "",
            "backdrop_path": null
        }"#;
        let movie: MovieRecord = serde_json::from_str(json).unwrap();
        assert_eq!(movie.id, MovieId(7));
        assert_eq!(movie.original_title, "");
        assert_eq!(movie.release_date, None);
        assert_eq!(movie.poster_path, None);
        assert_eq!(movie.backdrop_path, None);
        assert_eq!(movie.runtime, None);
        assert_eq!(movie.trailer_count(), 0);
    }

    #[test]
    fn parses_detail_extras() {
        let json = r#"{
            "id": 135397,
            "title": "Jurassic World",
            "release_date": "2015-06-09",
            "runtime": 124,
            "trailers": {
                "quicktime": [],
                "youtube": [
                    {"name": "Trailer", "size": "HD", "source": "RFinNxS5KN4", "type": "Trailer"},
                    {"name": "Teaser", "size": "HD", "source": "bvu-zlR5A8Q", "type": "Teaser"}
                ]
            },
            "reviews": {"page": 1, "results": [
                {"id": "55910381c3a36807f900065d", "author": "jonlikesmoviesthatdontsuck",
                 "content": "Overall action packed movie...", "url": "https://www.themoviedb.org/review/55910381c3a36807f900065d"}
            ]}
        }"#;
        let movie: MovieRecord = serde_json::from_str(json).unwrap();
        assert_eq!(movie.release_year(), Some(2015));
        assert_eq!(movie.runtime, Some(124));
        assert_eq!(movie.trailer_count(), 2);
        assert_eq!(movie.review_count(), 1);
        let first = movie.trailers.as_ref().unwrap().first_shareable().unwrap();
        assert_eq!(first.kind, "Trailer");
        assert_eq!(
            first.youtube_url(),
            "https://www.youtube.com/watch?v=RFinNxS5KN4"
        );
    }

    #[test]
    fn snapshot_serialization_keeps_date() {
        let mut movie = MovieRecord::new(MovieId(1), "A");
        movie.release_date = parse_date("1999-03-31");
        let json = serde_json::to_string(&movie).unwrap();
        assert!(json.contains("\"1999-03-31\""));
        let back: MovieRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, movie);
    }

    #[test]
    fn sort_mode_cycle_and_parse() {
        assert_eq!(SortMode::Popularity.next(), SortMode::Rating);
        assert_eq!(SortMode::Rating.next(), SortMode::Favorites);
        assert_eq!(SortMode::Favorites.next(), SortMode::Popularity);
        assert_eq!("Rating".parse::<SortMode>().unwrap(), SortMode::Rating);
        assert!("newest".parse::<SortMode>().is_err());
        assert_eq!(SortMode::Favorites.catalog_order(), None);
        assert_eq!(
            SortMode::Rating.catalog_order().map(|o| o.sort_by()),
            Some("vote_average.desc")
        );
    }
}
