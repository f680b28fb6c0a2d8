use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Where the remote quiz API lives and how long calls may take.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl ApiConfig {
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:3000/";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Parse `base_url`, making sure it ends with `/` so endpoint paths join
    /// underneath it instead of replacing its last segment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the URL cannot be parsed.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let raw = base_url.trim();
        let normalized = if raw.ends_with('/') {
            raw.to_owned()
        } else {
            format!("{raw}/")
        };
        let base_url = Url::parse(&normalized).map_err(|source| ConfigError::InvalidUrl {
            raw: raw.to_owned(),
            source,
        })?;
        Ok(Self {
            base_url,
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `QUIZ_API_URL` and `QUIZ_API_TIMEOUT_SECS`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url =
            env::var("QUIZ_API_URL").unwrap_or_else(|_| Self::DEFAULT_BASE_URL.into());
        let mut config = Self::new(&base_url)?;

        if let Ok(raw) = env::var("QUIZ_API_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout(raw))?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
