//! Session configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! The API base URL is the only required value. It has no default: a guessed
//! local address would hide a misconfigured deployment until the first login
//! attempt. Every timing knob has a default and falls back to it when the
//! variable is unparseable.

use std::time::Duration;

pub const BASE_URL_VAR: &str = "AUTH_API_BASE_URL";

pub const DEFAULT_RENEW_INTERVAL_SECS: u64 = 14 * 60;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 15 * 60;
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_HOME_ROUTE: &str = "/dashboard";
pub const DEFAULT_LANDING_ROUTE: &str = "/";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration: env var {var} not set")]
    MissingVar { var: &'static str },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("HTTP client build failed: {0}")]
    HttpClient(String),
}

/// Timeouts applied by the request client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request: Duration,
    pub connect: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// API origin without a trailing slash, e.g. `https://api.example.com`.
    pub base_url: String,
    /// Period of the background renewal task.
    pub renew_interval: Duration,
    /// Server-side session expiry window. Only used to validate `renew_interval`.
    pub session_ttl: Duration,
    /// Budget for a single refresh call before it is cancelled.
    pub refresh_timeout: Duration,
    pub timeouts: HttpTimeouts,
    /// Route shown after login/register.
    pub home_route: String,
    /// Route shown to anonymous users (logout, eviction).
    pub landing_route: String,
}

impl SessionConfig {
    /// Build a config with default timings for the given API origin.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the URL is empty or not http(s).
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(&base_url.into())?,
            renew_interval: Duration::from_secs(DEFAULT_RENEW_INTERVAL_SECS),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            refresh_timeout: Duration::from_secs(DEFAULT_REFRESH_TIMEOUT_SECS),
            timeouts: HttpTimeouts::default(),
            home_route: DEFAULT_HOME_ROUTE.to_owned(),
            landing_route: DEFAULT_LANDING_ROUTE.to_owned(),
        })
    }

    /// Build typed session config from environment variables.
    ///
    /// Required:
    /// - `AUTH_API_BASE_URL`
    ///
    /// Optional:
    /// - `AUTH_RENEW_INTERVAL_SECS`: default 840
    /// - `AUTH_SESSION_TTL_SECS`: default 900
    /// - `AUTH_REFRESH_TIMEOUT_SECS`: default 5
    /// - `AUTH_REQUEST_TIMEOUT_SECS`: default 30
    /// - `AUTH_CONNECT_TIMEOUT_SECS`: default 10
    /// - `AUTH_HOME_ROUTE`: default `/dashboard`
    /// - `AUTH_LANDING_ROUTE`: default `/`
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is missing or malformed, or if the
    /// renewal interval is not shorter than the session TTL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var(BASE_URL_VAR).map_err(|_| ConfigError::MissingVar { var: BASE_URL_VAR })?;
        Self::from_env_with_base_url(&base_url)
    }

    /// Like [`SessionConfig::from_env`], with the base URL supplied by the
    /// caller (e.g. a command-line flag) instead of `AUTH_API_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Same as [`SessionConfig::from_env`], minus the missing-variable case.
    pub fn from_env_with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        let config = Self {
            base_url: normalize_base_url(base_url)?,
            renew_interval: env_secs("AUTH_RENEW_INTERVAL_SECS", DEFAULT_RENEW_INTERVAL_SECS),
            session_ttl: env_secs("AUTH_SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS),
            refresh_timeout: env_secs("AUTH_REFRESH_TIMEOUT_SECS", DEFAULT_REFRESH_TIMEOUT_SECS),
            timeouts: HttpTimeouts {
                request: env_secs("AUTH_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
                connect: env_secs("AUTH_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            },
            home_route: std::env::var("AUTH_HOME_ROUTE").unwrap_or_else(|_| DEFAULT_HOME_ROUTE.to_owned()),
            landing_route: std::env::var("AUTH_LANDING_ROUTE").unwrap_or_else(|_| DEFAULT_LANDING_ROUTE.to_owned()),
        };
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_renew_interval(mut self, interval: Duration) -> Self {
        self.renew_interval = interval;
        self
    }

    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: HttpTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    #[must_use]
    pub fn with_routes(mut self, home: impl Into<String>, landing: impl Into<String>) -> Self {
        self.home_route = home.into();
        self.landing_route = landing.into();
        self
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the renewal interval is zero or
    /// not strictly shorter than the session TTL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.renew_interval.is_zero() {
            return Err(ConfigError::Invalid("renew interval must be non-zero".into()));
        }
        if self.renew_interval >= self.session_ttl {
            return Err(ConfigError::Invalid(format!(
                "renew interval ({}s) must be shorter than session ttl ({}s)",
                self.renew_interval.as_secs(),
                self.session_ttl.as_secs()
            )));
        }
        Ok(())
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{BASE_URL_VAR} is empty")));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::Invalid(format!("{BASE_URL_VAR} must be an http(s) URL, got '{trimmed}'")));
    }
    Ok(trimmed.to_owned())
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_secs(key: &str, default: u64) -> Duration {
    Duration::from_secs(env_parse(key, default))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
