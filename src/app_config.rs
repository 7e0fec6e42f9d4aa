use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration module
/// This module handles the client configuration including loading,
/// validating and saving configuration settings.
/// Represents the client configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the translation service
    #[serde(default = "default_translator_host")]
    pub translator_host: String,

    /// Optional API key sent with every request
    #[serde(default)]
    pub api_key: Option<String>,

    /// Interface language used until the user picks one
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Language shown when a translation cannot be produced
    #[serde(default = "default_language")]
    pub fallback_language: String,

    /// Context tag applied when a caller does not pass one
    #[serde(default = "default_context")]
    pub default_context: String,

    /// Original language of the texts; unset means the service auto-detects
    #[serde(default)]
    pub source_language: Option<String>,

    /// Batching tunables
    #[serde(default)]
    pub batching: BatchingConfig,

    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Durable cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Flush scheduling tunables
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchingConfig {
    // @field: Delay before the first batch, lets a render pass accumulate
    #[serde(default = "default_initial_batch_delay_ms")]
    pub initial_batch_delay_ms: u64,

    // @field: Debounce delay once activity is underway
    #[serde(default = "default_followup_batch_delay_ms")]
    pub followup_batch_delay_ms: u64,

    // @field: Max items per HTTP call
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    // @field: Upper bound before queued work is forced out
    #[serde(default = "default_max_wait_time_ms")]
    pub max_wait_time_ms: u64,

    // @field: Storm suppression window for repeated keys
    #[serde(default = "default_recently_queued_window_ms")]
    pub recently_queued_window_ms: u64,
}

impl BatchingConfig {
    pub fn initial_batch_delay(&self) -> Duration {
        Duration::from_millis(self.initial_batch_delay_ms)
    }

    pub fn followup_batch_delay(&self) -> Duration {
        Duration::from_millis(self.followup_batch_delay_ms)
    }

    pub fn max_wait_time(&self) -> Duration {
        Duration::from_millis(self.max_wait_time_ms)
    }

    pub fn recently_queued_window(&self) -> Duration {
        Duration::from_millis(self.recently_queued_window_ms)
    }
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            initial_batch_delay_ms: default_initial_batch_delay_ms(),
            followup_batch_delay_ms: default_followup_batch_delay_ms(),
            max_batch_size: default_max_batch_size(),
            max_wait_time_ms: default_max_wait_time_ms(),
            recently_queued_window_ms: default_recently_queued_window_ms(),
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Languages below this popularity are hidden
    #[serde(default = "default_min_popularity")]
    pub min_popularity: f64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            min_popularity: default_min_popularity(),
        }
    }
}

/// Durable cache configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// Persist translations across restarts
    #[serde(default)]
    pub persist: bool,

    /// Time to live of persisted translations
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,

    /// Time to live of the persisted language list
    #[serde(default = "default_languages_ttl_secs")]
    pub languages_ttl_secs: u64,

    /// Maximum number of persisted items
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Maximum total size of persisted items
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: usize,

    /// Database location, defaults to the user's data directory
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            persist: false,
            ttl_secs: default_cache_ttl_secs(),
            languages_ttl_secs: default_languages_ttl_secs(),
            max_items: default_max_items(),
            max_size_bytes: default_max_size_bytes(),
            database_path: None,
        }
    }
}

/// Log level configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

pub const DEFAULT_API_HOST: &str = "https://api.langie.uk/v1";

fn default_translator_host() -> String {
    DEFAULT_API_HOST.to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_context() -> String {
    "ui".to_string()
}

fn default_initial_batch_delay_ms() -> u64 {
    50
}

fn default_followup_batch_delay_ms() -> u64 {
    25
}

fn default_max_batch_size() -> usize {
    50
}

fn default_max_wait_time_ms() -> u64 {
    2000
}

fn default_recently_queued_window_ms() -> u64 {
    100
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_min_popularity() -> f64 {
    0.1
}

fn default_cache_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_languages_ttl_secs() -> u64 {
    30 * 24 * 60 * 60
}

fn default_max_items() -> usize {
    1000
}

fn default_max_size_bytes() -> usize {
    2 * 1024 * 1024
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load the configuration at `path`, writing a default one first if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply `TRANSLATOR_HOST`, `TRANSLATOR_API_KEY` and `MIN_LANGUAGE_POPULARITY`
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("TRANSLATOR_HOST").filter(|h| !h.trim().is_empty()) {
            self.translator_host = host;
        }

        if let Some(key) = lookup("TRANSLATOR_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }

        if let Some(raw) = lookup("MIN_LANGUAGE_POPULARITY") {
            match raw.trim().parse::<f64>() {
                Ok(value) => self.http.min_popularity = value,
                Err(_) => warn!("Ignoring invalid MIN_LANGUAGE_POPULARITY value '{}'", raw),
            }
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.translator_host.trim().is_empty() {
            return Err(anyhow!("translator_host must not be empty"));
        }
        url::Url::parse(&self.translator_host)
            .with_context(|| format!("translator_host is not a valid URL: {}", self.translator_host))?;

        crate::language_utils::validate_language_tag(&self.default_language)?;
        crate::language_utils::validate_language_tag(&self.fallback_language)?;
        if let Some(source) = &self.source_language {
            crate::language_utils::validate_language_tag(source)?;
        }

        if self.default_context.trim().is_empty() {
            return Err(anyhow!("default_context must not be empty"));
        }

        if self.batching.max_batch_size == 0 {
            return Err(anyhow!("batching.max_batch_size must be greater than zero"));
        }

        if self.batching.max_wait_time_ms < self.batching.initial_batch_delay_ms {
            return Err(anyhow!(
                "batching.max_wait_time_ms ({}) must not be smaller than batching.initial_batch_delay_ms ({})",
                self.batching.max_wait_time_ms,
                self.batching.initial_batch_delay_ms
            ));
        }

        if self.http.timeout_secs == 0 {
            return Err(anyhow!("http.timeout_secs must be greater than zero"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            translator_host: default_translator_host(),
            api_key: None,
            default_language: default_language(),
            fallback_language: default_language(),
            default_context: default_context(),
            source_language: None,
            batching: BatchingConfig::default(),
            http: HttpConfig::default(),
            cache: CacheConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
