use std::{path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::covers::{discovery, sources, RetryPolicy};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_STATIC_DIR: &str = "public";
const DEFAULT_LOG_LEVEL: &str = "info";
/// Upstream request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
/// Comic Vine has ~800k issues; a conservative bound keeps offsets inside the list
const DEFAULT_MAX_RANDOM_OFFSET: u64 = 100_000;

/// Per-client request quotas. A zero disables that quota.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Applies to the random cover routes only
    #[serde(default = "default_per_second")]
    pub per_second: u32,

    #[serde(default = "default_per_hour")]
    pub per_hour: u32,

    #[serde(default = "default_per_day")]
    pub per_day: u32,

    /// Key clients on the first `X-Forwarded-For` hop instead of the socket peer.
    /// Only safe behind a proxy that overwrites the header.
    #[serde(default)]
    pub trust_proxy: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_second: default_per_second(),
            per_hour: default_per_hour(),
            per_day: default_per_day(),
            trust_proxy: false,
        }
    }
}

impl RateLimitConfig {
    pub fn disabled() -> Self {
        Self {
            per_second: 0,
            per_hour: 0,
            per_day: 0,
            trust_proxy: false,
        }
    }
}

fn default_per_second() -> u32 {
    1
}

fn default_per_hour() -> u32 {
    50
}

fn default_per_day() -> u32 {
    200
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Redirect plain http requests to https (behind a TLS terminating proxy)
    #[serde(default)]
    pub force_https: bool,

    /// Without a key, comic mode is reported as unavailable
    #[serde(default, skip_serializing)]
    pub comic_vine_api_key: Option<String>,

    #[serde(default = "default_comicvine_base_url")]
    pub comicvine_base_url: String,
    #[serde(default = "default_jikan_base_url")]
    pub jikan_base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_max_random_offset")]
    pub max_random_offset: u64,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            log_level: default_log_level(),
            force_https: false,
            comic_vine_api_key: None,
            comicvine_base_url: default_comicvine_base_url(),
            jikan_base_url: default_jikan_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_random_offset: default_max_random_offset(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_static_dir() -> String {
    DEFAULT_STATIC_DIR.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_comicvine_base_url() -> String {
    sources::comicvine::DEFAULT_BASE_URL.to_string()
}

fn default_jikan_base_url() -> String {
    sources::jikan::DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_max_attempts() -> u32 {
    discovery::DEFAULT_MAX_ATTEMPTS
}

fn default_retry_backoff_ms() -> u64 {
    DEFAULT_RETRY_BACKOFF_MS
}

fn default_max_random_offset() -> u64 {
    DEFAULT_MAX_RANDOM_OFFSET
}

impl Config {
    /// Defaults, then the yaml file at `path` (if given), then `.env` and the environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_file(path)?,
            None => Self::default(),
        };

        dotenvy::dotenv().ok();
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config: Self = serde_yml::from_str(&config_str)
            .with_context(|| format!("config file {} is malformed", path.display()))?;

        config.comic_vine_api_key = non_blank(config.comic_vine_api_key.take());
        Ok(config)
    }

    /// Environment overrides. `lookup` is `std::env::var` outside of tests.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = non_blank(lookup("COMIC_VINE_API_KEY")) {
            self.comic_vine_api_key = Some(key);
        }
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("invalid PORT value {port:?}"))?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level.to_lowercase();
        }
        if lookup("APP_ENV").as_deref() == Some("production") {
            self.force_https = true;
        }
        if let Some(trust) = lookup("TRUST_PROXY") {
            self.rate_limit.trust_proxy = matches!(trust.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than 0");
        }
        if self.max_attempts == 0 {
            bail!("max_attempts must be greater than 0");
        }
        if self.max_random_offset == 0 {
            bail!("max_random_offset must be greater than 0");
        }

        for (name, value) in [
            ("comicvine_base_url", &self.comicvine_base_url),
            ("jikan_base_url", &self.jikan_base_url),
        ] {
            url::Url::parse(value).with_context(|| format!("{name} is not a valid url: {value:?}"))?;
        }

        Ok(())
    }

    pub fn has_comic_key(&self) -> bool {
        self.comic_vine_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
