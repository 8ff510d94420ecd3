use std::path::{Path, PathBuf};

use cinegrid_core::ListingSnapshot;

/// Where the last session's listing is kept:
/// `~/.cache/cinegrid/listing.json`.
pub fn listing_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("cinegrid").join("listing.json"))
}

/// Log directory: `~/.cache/cinegrid/logs/`.
pub fn log_dir() -> Option<PathBuf> {
    let dir = dirs::cache_dir()?.join("cinegrid").join("logs");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// Persist the listing so the next launch opens where this one left off.
pub fn save_listing(path: &Path, snapshot: &ListingSnapshot) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, snapshot.to_json()?)?;
    Ok(())
}

/// Read a saved listing. A missing or corrupt file yields `None`.
pub fn load_listing(path: &Path) -> Option<ListingSnapshot> {
    let json = std::fs::read_to_string(path).ok()?;
    match ListingSnapshot::from_json(&json) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "discarding unreadable listing snapshot");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinegrid_core::{MovieId, MovieRecord, SortMode};

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("listing.json");
        let snapshot = ListingSnapshot {
            sort_mode: SortMode::Rating,
            page: 2,
            total_pages: 9,
            last_index: 3,
            movies: vec![MovieRecord::new(MovieId(1), "Ikiru")],
        };
        save_listing(&path, &snapshot).unwrap();
        assert_eq!(load_listing(&path), Some(snapshot));
    }

    #[test]
    fn corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listing.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(load_listing(&path), None);
        assert_eq!(load_listing(&dir.path().join("missing.json")), None);
    }
}
