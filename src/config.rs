//! Runtime configuration read from the environment (and `.env` if present).

use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_RATE_LIMIT_REFRESH_SECS: u64 = 60;
const DEFAULT_ACTIVITY_LIMIT: usize = 10;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone)]
pub struct Config {
    /// Seeds the session; can be replaced from the UI.
    pub github_token: Option<String>,
    pub api_url: String,
    /// `None` means `$HOME/.octodash`.
    pub data_dir: Option<PathBuf>,
    pub rate_limit_refresh: Duration,
    /// Events requested from the API and shown in the feed.
    pub activity_limit: usize,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_token: None,
            api_url: DEFAULT_API_URL.to_owned(),
            data_dir: None,
            rate_limit_refresh: Duration::from_secs(DEFAULT_RATE_LIMIT_REFRESH_SECS),
            activity_limit: DEFAULT_ACTIVITY_LIMIT,
            log_level: DEFAULT_LOG_LEVEL.to_owned(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let rate_limit_refresh = match non_empty("OCTODASH_RATE_LIMIT_REFRESH_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::Invalid("OCTODASH_RATE_LIMIT_REFRESH_SECS", raw)),
            },
            None => defaults.rate_limit_refresh,
        };

        let activity_limit = match non_empty("OCTODASH_ACTIVITY_LIMIT") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(limit) if (1..=100).contains(&limit) => limit,
                _ => return Err(ConfigError::Invalid("OCTODASH_ACTIVITY_LIMIT", raw)),
            },
            None => defaults.activity_limit,
        };

        Ok(Self {
            github_token: non_empty("GITHUB_TOKEN"),
            api_url: non_empty("OCTODASH_API_URL")
                .map(|url| url.trim_end_matches('/').to_owned())
                .unwrap_or(defaults.api_url),
            data_dir: non_empty("OCTODASH_DATA_DIR").map(PathBuf::from),
            rate_limit_refresh,
            activity_limit,
            log_level: non_empty("OCTODASH_LOG").unwrap_or(defaults.log_level),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
