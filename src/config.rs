// src/config.rs
//
// Catalogue configuration
//
// Resolution order (later wins):
// 1. Built-in defaults rooted at {DATA_DIR}/artgallery
// 2. settings.json inside the data directory
// 3. ARTGALLERY_* environment variables

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

pub const APP_DIR_NAME: &str = "artgallery";
pub const SETTINGS_FILE: &str = "settings.json";
pub const DEFAULT_PAGE_SIZE: usize = 20;

const ENV_DATA_DIR: &str = "ARTGALLERY_DATA_DIR";
const ENV_MEDIA_DIR: &str = "ARTGALLERY_MEDIA_DIR";
const ENV_PAGE_SIZE: &str = "ARTGALLERY_PAGE_SIZE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogConfig {
    /// Root for the database, preferences and (by default) media
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Media root; relative paths resolve against `data_dir`
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,

    #[serde(default = "default_database_file")]
    pub database_file: String,

    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,

    /// Records fetched per list page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Maximum silence between two chunks of a media download
    #[serde(default = "default_download_chunk_timeout_secs")]
    pub download_chunk_timeout_secs: u64,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("media")
}

fn default_database_file() -> String {
    "artgallery.db".to_string()
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_download_chunk_timeout_secs() -> u64 {
    30
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            media_dir: default_media_dir(),
            database_file: default_database_file(),
            pool_max_size: default_pool_max_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
            page_size: default_page_size(),
            download_chunk_timeout_secs: default_download_chunk_timeout_secs(),
        }
    }
}

impl CatalogConfig {
    /// Defaults rooted at an explicit directory (tests, portable installs)
    pub fn in_directory(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Load defaults, then settings.json, then environment overrides
    pub fn load() -> AppResult<Self> {
        let data_dir = std::env::var_os(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let mut config = Self::load_from_dir(&data_dir)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Read `settings.json` from a directory, falling back to defaults
    pub fn load_from_dir(data_dir: &Path) -> AppResult<Self> {
        let settings_path = data_dir.join(SETTINGS_FILE);

        let mut config = if settings_path.exists() {
            let raw = std::fs::read_to_string(&settings_path)?;
            let parsed: CatalogConfig = serde_json::from_str(&raw).map_err(|e| {
                AppError::Config(format!("Invalid {}: {}", settings_path.display(), e))
            })?;
            log::debug!("Loaded settings from {}", settings_path.display());
            parsed
        } else {
            Self::default()
        };

        // The directory the file was found in is authoritative
        config.data_dir = data_dir.to_path_buf();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> AppResult<()> {
        if let Some(media) = std::env::var_os(ENV_MEDIA_DIR) {
            self.media_dir = PathBuf::from(media);
        }
        if let Ok(raw) = std::env::var(ENV_PAGE_SIZE) {
            self.page_size = raw.trim().parse().map_err(|_| {
                AppError::Config(format!("{} must be a positive integer, got {:?}", ENV_PAGE_SIZE, raw))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.page_size == 0 {
            return Err(AppError::Config("page size must be at least 1".to_string()));
        }
        if self.pool_max_size == 0 {
            return Err(AppError::Config("pool size must be at least 1".to_string()));
        }
        if self.database_file.trim().is_empty() {
            return Err(AppError::Config("database file name is empty".to_string()));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn media_root(&self) -> PathBuf {
        if self.media_dir.is_absolute() {
            self.media_dir.clone()
        } else {
            self.data_dir.join(&self.media_dir)
        }
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join("preferences.json")
    }

    /// Persist the current settings next to the database
    pub fn save(&self) -> AppResult<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(self.data_dir.join(SETTINGS_FILE), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::in_directory("/tmp/gallery");
        assert_eq!(config.page_size, 20);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/gallery/artgallery.db"));
        assert_eq!(config.media_root(), PathBuf::from("/tmp/gallery/media"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_settings_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{ "pageSize": 5, "mediaDir": "/srv/media" }"#,
        )
        .unwrap();

        let config = CatalogConfig::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.page_size, 5);
        assert_eq!(config.media_root(), PathBuf::from("/srv/media"));
        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_invalid_settings_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "{ not json").unwrap();

        let result = CatalogConfig::load_from_dir(dir.path());
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_save_round_trips_through_load() {
        let dir = TempDir::new().unwrap();
        let mut config = CatalogConfig::in_directory(dir.path());
        config.page_size = 7;
        config.save().unwrap();

        let loaded = CatalogConfig::load_from_dir(dir.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut config = CatalogConfig::in_directory("/tmp/gallery");
        config.page_size = 0;
        assert!(config.validate().is_err());
    }
}
