//! Configuration management for vidpulse
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::batch::MAX_BATCH_SIZE;
use crate::error::{Error, Result};
use crate::join::JoinMode;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Longest accepted search window, ten years
pub const MAX_LOOKBACK_HOURS: u32 = 24 * 365 * 10;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// YouTube Data API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Batched stats fetch configuration
    #[serde(default)]
    pub batch: BatchConfig,

    /// Ranking configuration
    #[serde(default)]
    pub rank: RankConfig,

    /// Join configuration
    #[serde(default)]
    pub join: JoinConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Autocomplete configuration
    #[serde(default)]
    pub suggest: SuggestConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Topic used when none is given on the command line
    #[serde(default = "default_search_topic")]
    pub topic: String,

    /// Only videos published within this many hours
    #[serde(default = "default_search_lookback_hours")]
    pub lookback_hours: u32,

    /// Maximum search results (1-50)
    #[serde(default = "default_search_max_results")]
    pub max_results: u32,

    /// Search ordering (date, viewCount, relevance, rating)
    #[serde(default = "default_search_order")]
    pub order: String,
}

/// Batched stats fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Ids per stats call (1-50)
    #[serde(default = "default_batch_chunk_size")]
    pub chunk_size: usize,

    /// Chunks fetched at once; 1 is sequential
    #[serde(default = "default_batch_concurrency")]
    pub concurrency: usize,
}

/// Ranking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankConfig {
    /// View count for the "fastest to threshold" view
    #[serde(default = "default_rank_views_threshold")]
    pub views_threshold: u64,

    /// Rows in each top-N view
    #[serde(default = "default_rank_top_n")]
    pub top_n: usize,
}

/// Join configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinConfig {
    /// outer keeps videos without stats, inner drops them
    #[serde(default = "default_join_mode")]
    pub mode: JoinMode,
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,

    /// User agent string
    #[serde(default = "default_http_user_agent")]
    pub user_agent: String,
}

/// Autocomplete configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestConfig {
    #[serde(default = "default_suggest_url")]
    pub url: String,

    #[serde(default = "default_suggest_client")]
    pub client: String,

    #[serde(default = "default_suggest_dataset")]
    pub dataset: String,

    #[serde(default = "default_suggest_timeout")]
    pub timeout_secs: u64,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for vidpulse data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key_env: default_api_key_env(),
            search: SearchConfig::default(),
            batch: BatchConfig::default(),
            rank: RankConfig::default(),
            join: JoinConfig::default(),
            http: HttpConfig::default(),
            suggest: SuggestConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            topic: default_search_topic(),
            lookback_hours: default_search_lookback_hours(),
            max_results: default_search_max_results(),
            order: default_search_order(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_batch_chunk_size(),
            concurrency: default_batch_concurrency(),
        }
    }
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            views_threshold: default_rank_views_threshold(),
            top_n: default_rank_top_n(),
        }
    }
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            mode: default_join_mode(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
            user_agent: default_http_user_agent(),
        }
    }
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            url: default_suggest_url(),
            client: default_suggest_client(),
            dataset: default_suggest_dataset(),
            timeout_secs: default_suggest_timeout(),
        }
    }
}

impl Config {
    /// Get the default base directory for vidpulse (~/.vidpulse)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".vidpulse")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    pub fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific base directory, falling back to defaults
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Get the API key from the environment
    pub fn api_key(&self) -> Result<SecretString> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(SecretString::from(key)),
            _ => Err(Error::Config(format!(
                "API key not set: export {} first",
                self.api_key_env
            ))),
        }
    }

    /// Check if vidpulse is initialized (config exists)
    pub fn is_initialized(&self) -> bool {
        self.paths.config_file.exists()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key_env.trim().is_empty() {
            return Err(Error::Config("api_key_env must not be empty".to_string()));
        }

        if self.search.max_results == 0 || self.search.max_results > 50 {
            return Err(Error::Config(
                "search.max_results must be between 1 and 50".to_string(),
            ));
        }

        if self.search.lookback_hours == 0 || self.search.lookback_hours > MAX_LOOKBACK_HOURS {
            return Err(Error::Config(format!(
                "search.lookback_hours must be between 1 and {}",
                MAX_LOOKBACK_HOURS
            )));
        }

        if self.batch.chunk_size == 0 || self.batch.chunk_size > MAX_BATCH_SIZE {
            return Err(Error::Config(format!(
                "batch.chunk_size must be between 1 and {}",
                MAX_BATCH_SIZE
            )));
        }

        if self.batch.concurrency == 0 {
            return Err(Error::Config(
                "batch.concurrency must be at least 1".to_string(),
            ));
        }

        if self.http.timeout_secs == 0 || self.suggest.timeout_secs == 0 {
            return Err(Error::Config("timeouts must be positive".to_string()));
        }

        url::Url::parse(&self.api_base_url)
            .map_err(|e| Error::Config(format!("Invalid api_base_url: {}", e)))?;
        url::Url::parse(&self.suggest.url)
            .map_err(|e| Error::Config(format!("Invalid suggest.url: {}", e)))?;

        Ok(())
    }
}
