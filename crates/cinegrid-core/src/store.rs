//! Local movie table: offline cache of every record seen plus the user's
//! favorites flag.
//!
//! One row per movie id. Writes go through a single connection behind a
//! [`Mutex`]; reads on an on-disk store use a pool of read-only connections
//! so a favorites query can run while a fresh remote page is being upserted
//! (SQLite WAL mode). Last writer wins.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};
use thiserror::Error;

use crate::model::{MovieId, MovieRecord, parse_date};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("movie {0} is not in the local store")]
    UnknownMovie(MovieId),
}

/// Durable keyed table of movies and favorites.
pub trait FavoritesStore: Send + Sync {
    /// Every favorited movie, ordered by title (case-insensitive), ties by id.
    fn query_all_sorted_by_title(&self) -> Result<Vec<MovieRecord>, StoreError>;

    /// Insert or refresh scalar fields for each record. Never clears an
    /// existing favorite flag and never replaces a known runtime with NULL.
    /// Returns the number of rows written.
    fn upsert_many(&self, movies: &[MovieRecord]) -> Result<usize, StoreError>;

    fn is_favorite(&self, id: MovieId) -> Result<bool, StoreError>;

    /// Flip the favorite flag; returns the new state.
    fn toggle_favorite(&self, id: MovieId) -> Result<bool, StoreError>;

    fn get(&self, id: MovieId) -> Result<Option<MovieRecord>, StoreError>;
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS movies (
     id             INTEGER PRIMARY KEY,
     title          TEXT NOT NULL,
     original_title TEXT NOT NULL,
     overview       TEXT NOT NULL,
     release_date   TEXT,
     runtime        INTEGER,
     vote_average   REAL NOT NULL,
     vote_count     INTEGER NOT NULL,
     poster_path    TEXT,
     backdrop_path  TEXT,
     popularity     REAL NOT NULL DEFAULT 0,
     is_favorite    INTEGER NOT NULL DEFAULT 0,
     updated_at     INTEGER NOT NULL
 );
 CREATE INDEX IF NOT EXISTS idx_movies_favorite ON movies (is_favorite);";

const COLUMNS: &str = "id, title, original_title, overview, release_date, runtime, \
     vote_average, vote_count, poster_path, backdrop_path, popularity";

/// Open a SQLite connection with WAL mode and standard pragmas.
fn open_sqlite(path: &Path, read_only: bool) -> Result<Connection, rusqlite::Error> {
    let flags = if read_only {
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX
    } else {
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
    };
    let conn = Connection::open_with_flags(path, flags)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(conn)
}

/// Pool of read-only connections for concurrent lookups.
struct ReadPool {
    pool: Mutex<Vec<Connection>>,
    path: PathBuf,
}

impl ReadPool {
    fn new(path: &Path) -> Self {
        Self {
            pool: Mutex::new(Vec::new()),
            path: path.to_path_buf(),
        }
    }

    fn acquire(&self) -> Result<Connection, StoreError> {
        if let Ok(mut pool) = self.pool.lock()
            && let Some(conn) = pool.pop()
        {
            return Ok(conn);
        }
        Ok(open_sqlite(&self.path, true)?)
    }

    fn release(&self, conn: Connection) {
        if let Ok(mut pool) = self.pool.lock() {
            pool.push(conn);
        }
    }
}

fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

fn row_to_movie(row: &Row<'_>) -> rusqlite::Result<MovieRecord> {
    let release_date: Option<String> = row.get(4)?;
    Ok(MovieRecord {
        id: MovieId(row.get(0)?),
        title: row.get(1)?,
        original_title: row.get(2)?,
        overview: row.get(3)?,
        release_date: release_date.as_deref().and_then(parse_date),
        runtime: row.get(5)?,
        vote_average: row.get(6)?,
        vote_count: row.get(7)?,
        poster_path: row.get(8)?,
        backdrop_path: row.get(9)?,
        popularity: row.get(10)?,
        trailers: None,
        reviews: None,
    })
}

/// SQLite-backed [`FavoritesStore`].
pub struct MovieStore {
    writer: Mutex<Connection>,
    /// `None` for in-memory stores, whose reads share the writer.
    read_pool: Option<ReadPool>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for MovieStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovieStore")
            .field("path", &self.path)
            .finish()
    }
}

impl MovieStore {
    /// Open (creating if needed) a store at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }
        let conn = open_sqlite(path, false)?;
        conn.execute_batch(SCHEMA)?;
        tracing::info!(path = %path.display(), "opened movie store");
        Ok(Self {
            writer: Mutex::new(conn),
            read_pool: Some(ReadPool::new(path)),
            path: Some(path.to_path_buf()),
        })
    }

    /// A private, non-persistent store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            writer: Mutex::new(conn),
            read_pool: None,
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn writer(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.writer
            .lock()
            .map_err(|_| StoreError::Unavailable("writer connection poisoned".into()))
    }

    /// Run a read on a pooled connection, or on the writer for in-memory stores.
    fn read<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StoreError> {
        match &self.read_pool {
            Some(pool) => {
                let conn = pool.acquire()?;
                let result = f(&conn);
                pool.release(conn);
                Ok(result?)
            }
            None => {
                let conn = self.writer()?;
                Ok(f(&conn)?)
            }
        }
    }

    /// Number of rows (favorites and plain cache entries).
    pub fn len(&self) -> Result<usize, StoreError> {
        self.read(|conn| conn.query_row("SELECT COUNT(*) FROM movies", [], |row| row.get(0)))
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    pub fn favorite_count(&self) -> Result<usize, StoreError> {
        self.read(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM movies WHERE is_favorite = 1",
                [],
                |row| row.get(0),
            )
        })
    }

    /// Drop cached rows that are not favorites. Returns rows deleted.
    pub fn clear_non_favorites(&self) -> Result<usize, StoreError> {
        let conn = self.writer()?;
        let deleted = conn.execute("DELETE FROM movies WHERE is_favorite = 0", [])?;
        if deleted > 0 {
            let _ = conn.execute_batch("VACUUM");
        }
        Ok(deleted)
    }
}

impl FavoritesStore for MovieStore {
    fn query_all_sorted_by_title(&self) -> Result<Vec<MovieRecord>, StoreError> {
        self.read(|conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {COLUMNS} FROM movies WHERE is_favorite = 1
                 ORDER BY title COLLATE NOCASE ASC, id ASC"
            ))?;
            let rows = stmt.query_map([], row_to_movie)?;
            rows.collect()
        })
    }

    fn upsert_many(&self, movies: &[MovieRecord]) -> Result<usize, StoreError> {
        if movies.is_empty() {
            return Ok(0);
        }
        let now = now_epoch();
        let mut conn = self.writer()?;
        let tx = conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO movies
                     (id, title, original_title, overview, release_date, runtime,
                      vote_average, vote_count, poster_path, backdrop_path, popularity,
                      is_favorite, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0, ?12)
                 ON CONFLICT(id) DO UPDATE SET
                     title          = excluded.title,
                     original_title = excluded.original_title,
                     overview       = excluded.overview,
                     release_date   = excluded.release_date,
                     runtime        = COALESCE(excluded.runtime, movies.runtime),
                     vote_average   = excluded.vote_average,
                     vote_count     = excluded.vote_count,
                     poster_path    = excluded.poster_path,
                     backdrop_path  = excluded.backdrop_path,
                     popularity     = excluded.popularity,
                     updated_at     = excluded.updated_at",
            )?;
            for m in movies {
                written += stmt.execute(params![
                    m.id.0,
                    m.title,
                    m.original_title,
                    m.overview,
                    m.release_date.map(|d| d.format("%Y-%m-%d").to_string()),
                    m.runtime,
                    m.vote_average,
                    m.vote_count,
                    m.poster_path,
                    m.backdrop_path,
                    m.popularity,
                    now,
                ])?;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    fn is_favorite(&self, id: MovieId) -> Result<bool, StoreError> {
        let flag: Option<i64> = self.read(|conn| {
            conn.query_row(
                "SELECT is_favorite FROM movies WHERE id = ?1",
                params![id.0],
                |row| row.get(0),
            )
            .optional()
        })?;
        Ok(flag.is_some_and(|f| f != 0))
    }

    fn toggle_favorite(&self, id: MovieId) -> Result<bool, StoreError> {
        let conn = self.writer()?;
        let updated = conn.execute(
            "UPDATE movies SET is_favorite = 1 - is_favorite, updated_at = ?2 WHERE id = ?1",
            params![id.0, now_epoch()],
        )?;
        if updated == 0 {
            return Err(StoreError::UnknownMovie(id));
        }
        let flag: i64 = conn.query_row(
            "SELECT is_favorite FROM movies WHERE id = ?1",
            params![id.0],
            |row| row.get(0),
        )?;
        tracing::debug!(movie_id = %id, favorite = flag != 0, "favorite toggled");
        Ok(flag != 0)
    }

    fn get(&self, id: MovieId) -> Result<Option<MovieRecord>, StoreError> {
        self.read(|conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM movies WHERE id = ?1"),
                params![id.0],
                row_to_movie,
            )
            .optional()
        })
    }
}
