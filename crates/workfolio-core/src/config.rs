use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use workfolio_api::RetryConfig;

use crate::aggregate::ArchivedPolicy;

/// Main configuration structure
///
/// Loaded from `config.toml` in the platform config directory, then
/// overridden by environment variables. Missing sections fall back to
/// their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub work: WorkConfig,
}

impl Config {
    /// Load config from the default location, defaults if there is none
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> crate::Result<Self> {
        toml::from_str(contents)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    pub fn to_toml_string(&self) -> crate::Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Override settings from the environment
    ///
    /// `lookup` is `std::env::var` in production and a map in tests.
    pub fn apply_env<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("GITHUB_TOKEN").filter(|t| !t.is_empty()) {
            self.github.token = Some(token);
        }
        if let Some(username) =
            lookup("WORKFOLIO_GITHUB_USER").filter(|u| !u.trim().is_empty())
        {
            self.github.username = username;
        }
        if let Some(dir) = lookup("WORKFOLIO_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            self.content.data_dir = PathBuf::from(dir);
        }
        if let Some(ttl) = lookup("WORKFOLIO_CACHE_TTL_MS") {
            self.cache.ttl_ms = ttl.trim().parse().map_err(|_| {
                crate::Error::ConfigError(format!(
                    "WORKFOLIO_CACHE_TTL_MS must be a number of milliseconds, got {:?}",
                    ttl
                ))
            })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("workfolio");

        Ok(config_dir.join("config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Account whose public repositories become projects
    #[serde(default = "default_github_user")]
    pub username: String,

    /// Personal access token, raises the rate limit
    #[serde(default)]
    pub token: Option<String>,

    /// API URL (for GitHub Enterprise)
    #[serde(default = "default_github_url")]
    pub api_url: String,

    /// Client-side timeout for every request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts for transient failures (5xx, 429, timeouts)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_github_user() -> String {
    "bagnascojhoel".to_string()
}

fn default_github_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    RetryConfig::default().max_retries
}

impl GitHubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            ..RetryConfig::default()
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            username: default_github_user(),
            token: None,
            api_url: default_github_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Directory holding `articles_{locale}.json` and `certifications_{locale}.json`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long an aggregated locale stays fresh, in milliseconds
    #[serde(default = "default_cache_ttl_ms")]
    pub ttl_ms: u64,
}

pub const DEFAULT_CACHE_TTL_MS: u64 = 3_600_000;

fn default_cache_ttl_ms() -> u64 {
    DEFAULT_CACHE_TTL_MS
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_cache_ttl_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkConfig {
    /// Whether archived repositories are listed
    #[serde(default)]
    pub archived: ArchivedPolicy,
}
