//! Network adapter configuration.
//!
//! Defaults suit interactive use. Override via environment variables or
//! explicit construction for tests.

/// Settings for [`HttpFetcher`](crate::HttpFetcher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Scheme prefixed to references that carry none, e.g. `host/path`.
    pub default_scheme: String,
    /// Largest accepted response body.
    pub max_body_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: format!("dppkit/{}", env!("CARGO_PKG_VERSION")),
            default_scheme: "https".to_string(),
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

impl FetchConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `DPP_FETCH_TIMEOUT_SECS` (default: 15)
    /// - `DPP_USER_AGENT` (default: `dppkit/<version>`)
    /// - `DPP_DEFAULT_SCHEME` (default: `https`; must be `http` or `https`)
    /// - `DPP_MAX_BODY_BYTES` (default: 64 MiB)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let default_scheme = env_or("DPP_DEFAULT_SCHEME", defaults.default_scheme);
        if !matches!(default_scheme.as_str(), "http" | "https") {
            return Err(ConfigError::Invalid {
                var: "DPP_DEFAULT_SCHEME".into(),
                value: default_scheme,
            });
        }
        Ok(Self {
            timeout_secs: env_parse("DPP_FETCH_TIMEOUT_SECS", defaults.timeout_secs)?,
            user_agent: env_or("DPP_USER_AGENT", defaults.user_agent),
            default_scheme,
            max_body_bytes: env_parse("DPP_MAX_BODY_BYTES", defaults.max_body_bytes)?,
        })
    }
}

fn env_or(var: &str, default: String) -> String {
    std::env::var(var).unwrap_or(default)
}

/// Parse a numeric environment variable, falling back to `default` when absent.
pub fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: var.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}")]
    Invalid { var: String, value: String },
}
