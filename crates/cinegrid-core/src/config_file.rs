use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub api: Option<ApiConfig>,
    pub network: Option<NetworkConfig>,
    pub catalog: Option<CatalogConfig>,
    pub storage: Option<StorageConfig>,
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub tmdb_api_key: Option<String>,
    pub base_url: Option<String>,
    pub image_base_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Minimum vote count for the "highest rated" ordering.
    pub rating_min_votes: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub theme: Option<String>,
    /// `auto`, `single` or `dual`.
    pub layout: Option<String>,
    pub default_sort: Option<String>,
}

/// Platform config directory path: `<config_dir>/cinegrid/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cinegrid").join("config.toml"))
}

/// Load config by cascading CWD `.cinegrid.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".cinegrid.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

fn pick<S, T>(
    overlay: &Option<S>,
    base: &Option<S>,
    field: impl Fn(&S) -> Option<T>,
) -> Option<T> {
    overlay
        .as_ref()
        .and_then(&field)
        .or_else(|| base.as_ref().and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        api: Some(ApiConfig {
            tmdb_api_key: pick(&overlay.api, &base.api, |a| a.tmdb_api_key.clone()),
            base_url: pick(&overlay.api, &base.api, |a| a.base_url.clone()),
            image_base_url: pick(&overlay.api, &base.api, |a| a.image_base_url.clone()),
        }),
        network: Some(NetworkConfig {
            timeout_secs: pick(&overlay.network, &base.network, |n| n.timeout_secs),
        }),
        catalog: Some(CatalogConfig {
            rating_min_votes: pick(&overlay.catalog, &base.catalog, |c| c.rating_min_votes),
        }),
        storage: Some(StorageConfig {
            db_path: pick(&overlay.storage, &base.storage, |s| s.db_path.clone()),
        }),
        display: Some(DisplayConfig {
            theme: pick(&overlay.display, &base.display, |d| d.theme.clone()),
            layout: pick(&overlay.display, &base.display, |d| d.layout.clone()),
            default_sort: pick(&overlay.display, &base.display, |d| d.default_sort.clone()),
        }),
    }
}

/// Save the current config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, String> {
    let path = config_path().ok_or_else(|| "Could not determine config directory".to_string())?;
    save_to_path(config, &path)?;
    Ok(path)
}

pub fn save_to_path(config: &ConfigFile, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let content =
        toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(path, content).map_err(|e| format!("Failed to write config: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_path_round_trip_toml() {
        let config = ConfigFile {
            storage: Some(StorageConfig {
                db_path: Some("/tmp/movies.db".to_string()),
            }),
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.storage.unwrap().db_path.unwrap(), "/tmp/movies.db");
    }

    #[test]
    fn partial_sections_parse() {
        let toml_str = "[api]\ntmdb_api_key = \"k\"\n\n[display]\nlayout = \"dual\"\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(parsed.api.unwrap().tmdb_api_key.as_deref(), Some("k"));
        let display = parsed.display.unwrap();
        assert_eq!(display.layout.as_deref(), Some("dual"));
        assert!(display.default_sort.is_none());
        assert!(parsed.network.is_none());
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            api: Some(ApiConfig {
                tmdb_api_key: Some("base".into()),
                base_url: Some("http://base".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            api: Some(ApiConfig {
                tmdb_api_key: Some("overlay".into()),
                ..Default::default()
            }),
            network: Some(NetworkConfig {
                timeout_secs: Some(3),
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay);
        let api = merged.api.unwrap();
        assert_eq!(api.tmdb_api_key.as_deref(), Some("overlay"));
        assert_eq!(api.base_url.as_deref(), Some("http://base"));
        assert_eq!(merged.network.unwrap().timeout_secs, Some(3));
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = ConfigFile {
            display: Some(DisplayConfig {
                theme: Some("light".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        save_to_path(&config, &path).unwrap();
        assert_eq!(load_from_path(&path), Some(config));
    }

    #[test]
    fn unparseable_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[api\nnope").unwrap();
        assert_eq!(load_from_path(&path), None);
    }
}
