//! Configuration management for clientflow.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "clientflow";

/// Default `SQLite` database file name.
const DATABASE_FILE_NAME: &str = "clientflow.db";

/// Default storage key holding the client collection.
pub const DEFAULT_STORAGE_KEY: &str = "clientflow_data";

/// Default number of rows per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Default avatar size limit (2 MiB).
pub const DEFAULT_AVATAR_MAX_BYTES: u64 = 2 * 1024 * 1024;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CLIENTFLOW_`, `__` between sections)
/// 2. TOML config file at `~/.config/clientflow/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Listing configuration.
    pub listing: ListingConfig,
    /// Reverse-geocoding configuration.
    pub geocoding: GeocodingConfig,
    /// Avatar configuration.
    pub avatar: AvatarConfig,
}

/// Which key-value backend holds the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per key in the data directory.
    #[default]
    Json,
    /// A `SQLite` database with one row per key.
    Sqlite,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend used for the collection.
    pub backend: StorageBackend,
    /// Directory holding the data files.
    /// Defaults to `~/.local/share/clientflow`
    pub data_dir: Option<PathBuf>,
    /// Key under which the collection is stored.
    pub key: String,
}

/// Listing-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Rows per page.
    pub page_size: usize,
}

/// Reverse-geocoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Base URL of the geocoding service.
    pub base_url: String,
    /// API key sent with each request.
    pub api_key: Option<String>,
    /// Language of the returned address.
    pub language: String,
    /// Timeout for position acquisition and for the lookup, in seconds.
    pub timeout_secs: u64,
}

/// Avatar-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Largest accepted source image, in bytes.
    pub max_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Json,
            data_dir: None, // Will be resolved to default at runtime
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.geoapify.com".to_string(),
            api_key: None,
            language: "en".to_string(),
            timeout_secs: 15,
        }
    }
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_AVATAR_MAX_BYTES,
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// Sources are merged in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (e.g. `CLIENTFLOW_LISTING__PAGE_SIZE=10`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("CLIENTFLOW_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "storage key must not be empty".to_string(),
            });
        }

        if self.storage.key.contains(|c: char| c == '/' || c == '\\') {
            return Err(Error::ConfigValidation {
                message: format!(
                    "storage key must not contain path separators: {}",
                    self.storage.key
                ),
            });
        }

        if self.listing.page_size == 0 {
            return Err(Error::ConfigValidation {
                message: "page_size must be greater than 0".to_string(),
            });
        }

        if self.geocoding.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.avatar.max_bytes == 0 {
            return Err(Error::ConfigValidation {
                message: "avatar max_bytes must be greater than 0".to_string(),
            });
        }

        match reqwest::Url::parse(&self.geocoding.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(Error::ConfigValidation {
                    message: format!("invalid geocoding base_url: {}", self.geocoding.base_url),
                });
            }
        }

        Ok(())
    }

    /// Get the data directory, resolving defaults if not set.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Get the file that holds the collection for the configured backend.
    #[must_use]
    pub fn storage_path(&self) -> PathBuf {
        match self.storage.backend {
            StorageBackend::Json => self.data_dir().join(format!("{}.json", self.storage.key)),
            StorageBackend::Sqlite => self.data_dir().join(DATABASE_FILE_NAME),
        }
    }

    /// Get the geocoding timeout as a Duration.
    #[must_use]
    pub fn geocoding_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoding.timeout_secs)
    }
}
