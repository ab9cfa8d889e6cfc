//! Configuration types for emoji-dl
//!
//! Every section has serde defaults, so an empty JSON object `{}` is a valid
//! configuration that targets the public CDN and lookup pages.

use crate::codepoint::CodepointKey;
use crate::error::{Error, Result};
use crate::resolver::overrides::OverrideTable;
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Remote asset locations and URL templates
///
/// `cdn_base_template` is rendered with `{release}` to obtain the CDN base.
/// URL templates accept `{base}`, `{slug}`, `{key}` and `{key_vs}` (the key
/// with a trailing `-fe0f` unless it already ends with one).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceConfig {
    /// CDN base URL template (default: Apple set on em-content.zobj.net)
    #[serde(default = "default_cdn_base_template")]
    pub cdn_base_template: String,

    /// CDN release identifier substituted for `{release}` (default: "391")
    #[serde(default = "default_release")]
    pub release: String,

    /// Lookup page base used by the scrape fallback
    #[serde(default = "default_page_base")]
    pub page_base: String,

    /// Release tag path segment on the lookup site (default: "ios-17.4")
    #[serde(default = "default_release_tag")]
    pub release_tag: String,

    /// Direct asset URL templates, tried in order for each slug
    #[serde(default = "default_url_templates")]
    pub url_templates: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            cdn_base_template: default_cdn_base_template(),
            release: default_release(),
            page_base: default_page_base(),
            release_tag: default_release_tag(),
            url_templates: default_url_templates(),
        }
    }
}

impl SourceConfig {
    /// CDN base for the configured release, without a trailing slash
    pub fn cdn_base(&self) -> String {
        self.cdn_base_template
            .replace("{release}", &self.release)
            .trim_end_matches('/')
            .to_string()
    }
}

/// Where the emoji registry (`emoji-test.txt`) comes from and is kept
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Remote registry URL, fetched at most once
    #[serde(default = "default_registry_url")]
    pub url: String,

    /// Local copy of the registry, reused forever once present
    #[serde(default = "default_registry_cache_path")]
    pub cache_path: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            cache_path: default_registry_cache_path(),
        }
    }
}

/// On-disk locations for assets, the download cache and the failure record
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `<key>.png` files (default: "./emoji")
    #[serde(default = "default_asset_dir")]
    pub asset_dir: PathBuf,

    /// Download cache JSON file (default: "./download_cache.json")
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// Failure record, one key per line (default: "./failed.txt")
    #[serde(default = "default_failure_path")]
    pub failure_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            asset_dir: default_asset_dir(),
            cache_path: default_cache_path(),
            failure_path: default_failure_path(),
        }
    }
}

/// Per-request behavior of the fetch pipeline
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Connection timeout in seconds (default: 10)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// Whole-request timeout in seconds (default: 15)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Bodies of this many bytes or fewer are treated as placeholders (default: 500)
    #[serde(default = "default_min_asset_bytes")]
    pub min_asset_bytes: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whether to scrape the lookup page when all direct URLs fail (default: true)
    #[serde(default = "default_true")]
    pub scrape_fallback: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            min_asset_bytes: default_min_asset_bytes(),
            user_agent: default_user_agent(),
            scrape_fallback: true,
        }
    }
}

/// Worker pool and bookkeeping intervals for a batch run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of parallel workers (default: 8)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Pause between consecutive keys on one worker, in milliseconds (default: 100)
    #[serde(default = "default_request_delay", with = "duration_millis_serde")]
    pub request_delay: Duration,

    /// Flush the download cache after this many successes (default: 25)
    #[serde(default = "default_flush_every")]
    pub flush_every: usize,

    /// Log progress after this many completed keys (default: 50)
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,

    /// Number of failed keys listed in the end-of-run summary (default: 20)
    #[serde(default = "default_failure_preview")]
    pub failure_preview: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            request_delay: default_request_delay(),
            flush_every: default_flush_every(),
            progress_every: default_progress_every(),
            failure_preview: default_failure_preview(),
        }
    }
}

/// Retry configuration for transient failures of the registry download
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Main configuration for a batch run
///
/// Sections:
/// - [`source`](SourceConfig): CDN base, release, lookup pages, URL templates
/// - [`registry`](RegistryConfig): emoji registry location and local copy
/// - [`storage`](StorageConfig): asset directory, cache and failure files
/// - [`fetch`](FetchConfig): timeouts and acceptance threshold
/// - [`batch`](BatchConfig): worker count and bookkeeping intervals
/// - [`retry`](RetryConfig): backoff for the registry download
///
/// `overrides` is an ordered list of versioned slug tables; later tables win.
/// `extra_skip` adds keys to the built-in component skip set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Remote asset locations
    #[serde(default)]
    pub source: SourceConfig,

    /// Emoji registry source
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Local storage paths
    #[serde(default)]
    pub storage: StorageConfig,

    /// Request behavior
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Worker pool settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Registry download retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Versioned manual slug overrides, lowest precedence first
    #[serde(default = "default_overrides")]
    pub overrides: Vec<OverrideTable>,

    /// Additional keys that never have a standalone asset
    #[serde(default)]
    pub extra_skip: Vec<CodepointKey>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            registry: RegistryConfig::default(),
            storage: StorageConfig::default(),
            fetch: FetchConfig::default(),
            batch: BatchConfig::default(),
            retry: RetryConfig::default(),
            overrides: default_overrides(),
            extra_skip: Vec::new(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file and validate it
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Check values that would make a batch impossible to run
    pub fn validate(&self) -> Result<()> {
        if self.batch.workers == 0 {
            return Err(Error::config("batch.workers", "must be at least 1"));
        }
        if self.batch.flush_every == 0 {
            return Err(Error::config("batch.flush_every", "must be at least 1"));
        }
        if self.batch.progress_every == 0 {
            return Err(Error::config("batch.progress_every", "must be at least 1"));
        }
        let multiplier = self.retry.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(Error::config(
                "retry.backoff_multiplier",
                format!("{multiplier} is not a finite factor of at least 1.0"),
            ));
        }
        if self.source.url_templates.is_empty() {
            return Err(Error::config(
                "source.url_templates",
                "at least one URL template is required",
            ));
        }
        for template in &self.source.url_templates {
            if !template.contains("{slug}") {
                return Err(Error::config(
                    "source.url_templates",
                    format!("template {template:?} has no {{slug}} placeholder"),
                ));
            }
        }
        let base = self.source.cdn_base();
        if url::Url::parse(&base).is_err() {
            return Err(Error::config(
                "source.cdn_base_template",
                format!("{base:?} is not a valid URL"),
            ));
        }
        if url::Url::parse(&self.source.page_base).is_err() {
            return Err(Error::config(
                "source.page_base",
                format!("{:?} is not a valid URL", self.source.page_base),
            ));
        }
        Ok(())
    }
}

fn default_cdn_base_template() -> String {
    "https://em-content.zobj.net/source/apple/{release}".to_string()
}

fn default_release() -> String {
    "391".to_string()
}

fn default_page_base() -> String {
    "https://emojipedia.org/apple".to_string()
}

fn default_release_tag() -> String {
    "ios-17.4".to_string()
}

fn default_url_templates() -> Vec<String> {
    vec![
        "{base}/{slug}_{key}.png".to_string(),
        "{base}/{slug}_{key_vs}.png".to_string(),
    ]
}

fn default_registry_url() -> String {
    "https://unicode.org/Public/emoji/15.1/emoji-test.txt".to_string()
}

fn default_registry_cache_path() -> PathBuf {
    PathBuf::from("emoji-test.txt")
}

fn default_asset_dir() -> PathBuf {
    PathBuf::from("emoji")
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("download_cache.json")
}

fn default_failure_path() -> PathBuf {
    PathBuf::from("failed.txt")
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_min_asset_bytes() -> u64 {
    500
}

fn default_user_agent() -> String {
    concat!("emoji-dl/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_workers() -> usize {
    8
}

fn default_request_delay() -> Duration {
    Duration::from_millis(100)
}

fn default_flush_every() -> usize {
    25
}

fn default_progress_every() -> usize {
    50
}

fn default_failure_preview() -> usize {
    20
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_overrides() -> Vec<OverrideTable> {
    vec![OverrideTable::builtin()]
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
