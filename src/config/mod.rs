use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::operations::RequestQuota;

const DEFAULT_POSTNORD_API_URL: &str = "https://portal.postnord.com/api/sendoutarrival/closest";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` means the in-process store is used.
    pub redis_url: Option<String>,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: RequestQuota,
    pub cache_ttl_secs: u64,
    pub cache_jitter_secs: u64,
    pub postnord_api_url: String,
    pub upstream_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_quota = if cfg!(debug_assertions) {
            RequestQuota::Unbounded
        } else {
            RequestQuota::Limited(10)
        };

        Ok(Config {
            redis_url: lookup("REDIS_URL").filter(|url| !url.trim().is_empty()),
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "::".into()),
            server_port: parse_or(&lookup, "SERVER_PORT", 3000)?,
            api_base_uri: lookup("API_BASE_URI").unwrap_or_else(|| "/api".into()),
            rate_limit_window_secs: positive_or(&lookup, "RATE_LIMIT_WINDOW", 3600)?,
            rate_limit_requests: parse_or(&lookup, "RATE_LIMIT_REQUESTS", default_quota)?,
            cache_ttl_secs: positive_or(&lookup, "CACHE_TTL", 86400)?,
            cache_jitter_secs: parse_or(&lookup, "CACHE_JITTER", 600)?,
            postnord_api_url: lookup("POSTNORD_API_URL")
                .unwrap_or_else(|| DEFAULT_POSTNORD_API_URL.into()),
            upstream_timeout_secs: positive_or(&lookup, "UPSTREAM_TIMEOUT", 10)?,
        })
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn positive_or<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(lookup, key, default)? {
        0 => Err(ConfigError::Invalid {
            key,
            value: "0".into(),
        }),
        secs => Ok(secs),
    }
}
