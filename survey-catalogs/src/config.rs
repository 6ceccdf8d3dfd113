//! Loader configuration.
//!
//! Catalog files live under a single data root, `~/.survey_catalogs/` by
//! default, overridable with the `CATALOG_DATA_DIR` environment variable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable naming the data root.
pub const DATA_DIR_ENV: &str = "CATALOG_DATA_DIR";

/// Environment variable overriding the HTTP timeout, in seconds.
pub const FETCH_TIMEOUT_ENV: &str = "CATALOG_FETCH_TIMEOUT_SECS";

const DEFAULT_DIR_NAME: &str = ".survey_catalogs";

/// HTTP settings for downloading missing catalog files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Whole-request timeout; catalog files run to hundreds of MB
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 3600,
            user_agent: format!("survey-catalogs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Where catalogs are stored and how missing ones are fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Root directory for all survey files
    pub data_dir: PathBuf,
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl LoaderConfig {
    /// Configuration from the environment.
    ///
    /// Uses `CATALOG_DATA_DIR` when set, else `$HOME/.survey_catalogs`, else a
    /// `.survey_catalogs` directory relative to the working directory.
    pub fn from_env() -> Self {
        let data_dir = std::env::var_os(DATA_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME")
                    .filter(|v| !v.is_empty())
                    .map(|home| PathBuf::from(home).join(DEFAULT_DIR_NAME))
            })
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DIR_NAME));

        let mut fetch = FetchConfig::default();
        if let Some(secs) = std::env::var(FETCH_TIMEOUT_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            fetch.timeout_secs = secs;
        }

        Self { data_dir, fetch }
    }

    /// Configuration rooted at an explicit directory.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            fetch: FetchConfig::default(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save configuration to a JSON file
    pub fn save_to_file(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
