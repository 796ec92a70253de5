use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use tracing::{debug, warn};

use crate::core::lyrics::DEFAULT_NONE_CHAR;
use crate::core::services::dumps::DEFAULT_DUMPS_DOWNLOAD_URL;
use crate::core::services::lrclib::{DEFAULT_API_URL, DEFAULT_DUMPS_URL};
use crate::core::services::lyrics_service::DEFAULT_DUMPS_CACHE_TTL_SECONDS;
use crate::error::{ConfigError, Result};

pub mod env;
pub mod validation;

pub use env::{EnvParser, EnvVars};
pub use validation::ConfigValidator;

const MIN_TIMEOUT_SECONDS: u64 = 1;
const MAX_TIMEOUT_SECONDS: u64 = 600;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("net", "lrclib", "lyriq")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// LRCLIB API base URL
    pub api_url: String,

    /// Database dump listing endpoint
    pub dumps_url: String,

    /// Base URL dump files are downloaded from
    pub dumps_download_url: String,

    /// Directory holding the JSON caches and downloaded dumps
    pub cache_dir: PathBuf,

    /// Placeholder for empty lyric lines
    pub none_char: String,

    /// HTTP request timeout (seconds)
    pub request_timeout_seconds: u64,

    /// How long a cached dump listing stays fresh (seconds)
    pub dumps_cache_ttl_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        let cache_dir = match project_dirs() {
            Some(project_dirs) => project_dirs.cache_dir().to_path_buf(),
            None => {
                warn!("ProjectDirs unavailable; falling back to ./cache for the cache directory");
                PathBuf::from("cache")
            }
        };

        Self {
            api_url: DEFAULT_API_URL.to_string(),
            dumps_url: DEFAULT_DUMPS_URL.to_string(),
            dumps_download_url: DEFAULT_DUMPS_DOWNLOAD_URL.to_string(),
            cache_dir,
            none_char: DEFAULT_NONE_CHAR.to_string(),
            request_timeout_seconds: 30,
            dumps_cache_ttl_seconds: DEFAULT_DUMPS_CACHE_TTL_SECONDS,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file, then `LYRIQ_*` environment variables.
    ///
    /// A missing file is fine and is not created.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Try to load .env file if it exists
        dotenvy::dotenv().ok();

        let config_file = match config_path {
            Some(path) => PathBuf::from(path),
            None => Self::default_config_path()?,
        };

        let mut config = Self::from_file(&config_file)?;
        config.load_from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path`, or return defaults when it does not exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load configuration from environment variables
    fn load_from_env(&mut self) -> Result<()> {
        if let Some(url) = EnvParser::parse_string(EnvVars::API_URL, None)? {
            self.api_url = url;
        }

        if let Some(url) = EnvParser::parse_string(EnvVars::DUMPS_URL, None)? {
            self.dumps_url = url;
        }

        if let Some(url) = EnvParser::parse_string(EnvVars::DUMPS_DOWNLOAD_URL, None)? {
            self.dumps_download_url = url;
        }

        if let Some(dir) = EnvParser::parse_path(EnvVars::CACHE_DIR)? {
            self.cache_dir = dir;
        }

        if let Some(none_char) = EnvParser::parse_raw(EnvVars::NONE_CHAR)? {
            self.none_char = none_char;
        }

        if let Some(timeout) = EnvParser::parse_u64(
            EnvVars::REQUEST_TIMEOUT_SECONDS,
            MIN_TIMEOUT_SECONDS,
            MAX_TIMEOUT_SECONDS,
        )? {
            self.request_timeout_seconds = timeout;
        }

        if let Some(ttl) = EnvParser::parse_u64(EnvVars::DUMPS_CACHE_TTL_SECONDS, 0, u64::MAX)? {
            self.dumps_cache_ttl_seconds = ttl;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        ConfigValidator::validate_url(&self.api_url, "API")?;
        ConfigValidator::validate_url(&self.dumps_url, "dumps listing")?;
        ConfigValidator::validate_url(&self.dumps_download_url, "dumps download")?;
        ConfigValidator::validate_none_char(&self.none_char)?;
        ConfigValidator::validate_range(
            self.request_timeout_seconds,
            MIN_TIMEOUT_SECONDS,
            MAX_TIMEOUT_SECONDS,
            "request_timeout_seconds",
        )?;
        Ok(())
    }

    fn default_config_path() -> Result<PathBuf> {
        let project_dirs = project_dirs().ok_or(ConfigError::NoProjectDirs)?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }
}
