use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Errors raised while assembling configuration at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid URL in {var}: {reason}")]
    InvalidUrl { var: &'static str, reason: String },

    #[error("Invalid value for {var}: {value}")]
    InvalidNumber { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub identity: IdentityConfig,
    pub upstream: UpstreamConfig,
    pub api: ApiConfig,
}

/// Identity provider (Supabase auth) settings
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub base_url: Url,
    pub anon_key: String,
    pub timeout: Duration,
}

/// PostgREST data backend settings
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub rest_url: Url,
    pub table: String,
    pub anon_key: String,
    pub service_key: Option<String>,
    pub timeout: Duration,
    pub list_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub default_limit: u32,
    pub max_limit: Option<u32>,
}

impl AppConfig {
    pub const DEFAULT_TABLE: &'static str = "news";
    pub const DEFAULT_LIMIT: u32 = 100;

    /// Build from the process environment. Call `dotenvy::dotenv()` first if a
    /// `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let supabase_url = get("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let anon_key = get("SUPABASE_ANON_KEY").ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?;

        let base_url = parse_url("SUPABASE_URL", &supabase_url)?;
        let rest_url = match get("POSTGREST_URL") {
            Some(raw) => parse_url("POSTGREST_URL", &raw)?,
            None => parse_url(
                "SUPABASE_URL",
                &format!("{}/rest/v1", supabase_url.trim_end_matches('/')),
            )?,
        };

        let identity = IdentityConfig {
            base_url,
            anon_key: anon_key.clone(),
            timeout: secs(&get, "AUTH_TIMEOUT_SECS", 10)?,
        };

        let upstream = UpstreamConfig {
            rest_url,
            table: get("TABLE_NEWS").unwrap_or_else(|| Self::DEFAULT_TABLE.to_string()),
            anon_key,
            service_key: get("SUPABASE_SERVICE_KEY"),
            timeout: secs(&get, "UPSTREAM_TIMEOUT_SECS", 10)?,
            list_timeout: secs(&get, "UPSTREAM_LIST_TIMEOUT_SECS", 20)?,
        };

        let max_limit = match get("NEWS_MAX_LIMIT") {
            Some(raw) => Some(raw.parse::<u32>().map_err(|_| ConfigError::InvalidNumber {
                var: "NEWS_MAX_LIMIT",
                value: raw.clone(),
            })?),
            None => None,
        };

        Ok(Self {
            identity,
            upstream,
            api: ApiConfig {
                default_limit: Self::DEFAULT_LIMIT,
                max_limit,
            },
        })
    }
}

impl ApiConfig {
    /// Apply the paging default and the optional clamp
    pub fn effective_limit(&self, requested: Option<u32>) -> u32 {
        let limit = requested.unwrap_or(self.default_limit);
        match self.max_limit {
            Some(max) => limit.min(max),
            None => limit,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            default_limit: AppConfig::DEFAULT_LIMIT,
            max_limit: None,
        }
    }
}

fn parse_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    // A trailing slash keeps Url::join from dropping the last path segment
    let normalized = format!("{}/", raw.trim_end_matches('/'));
    let url = Url::parse(&normalized).map_err(|e| ConfigError::InvalidUrl {
        var,
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            var,
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

fn secs<G>(get: &G, var: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidNumber { var, value: raw }),
        None => Ok(Duration::from_secs(default)),
    }
}
