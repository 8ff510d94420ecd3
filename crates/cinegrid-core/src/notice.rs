use std::fmt;

use crate::model::MovieId;

/// The user-triggered operation a notice reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    DownloadMovies,
    DownloadMovie(MovieId),
    LoadFavorites,
    UpdateFavorite(MovieId),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::DownloadMovies => f.write_str("Failed to download movies"),
            Operation::DownloadMovie(id) => write!(f, "Failed to download movie {id}"),
            Operation::LoadFavorites => f.write_str("Failed to load favorites"),
            Operation::UpdateFavorite(id) => write!(f, "Failed to update favorite {id}"),
        }
    }
}

/// A transient, non-blocking message shown to the user after a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub operation: Operation,
    /// Underlying error, for logs and an optional second line.
    pub detail: String,
}

impl Notice {
    pub fn new(operation: Operation, err: impl fmt::Display) -> Self {
        Self {
            operation,
            detail: err.to_string(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.operation.fmt(f)
    }
}
