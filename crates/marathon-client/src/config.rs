use std::time::Duration;

use crate::error::{NotifyError, NotifyResult};

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_STALE_SECS: u64 = 60;
const DEFAULT_PAGE_SIZE: u32 = 10;

/// Client settings, normally read from `MARATHON_*` environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Bearer token. `None` means the caller is browsing anonymously.
    pub token: Option<String>,
    /// How long a fetched page is served from the cache without a network call.
    pub stale_after: Duration,
    pub page_size: u32,
    /// Unset means requests may hang indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            token: None,
            stale_after: Duration::from_secs(DEFAULT_STALE_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> NotifyResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> NotifyResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("MARATHON_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(NotifyError::Config(format!(
                "MARATHON_API_BASE_URL must be an http(s) URL, got '{}'",
                base_url
            )));
        }

        let token = lookup("MARATHON_API_TOKEN")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let stale_secs: u64 = parse_var(&lookup, "MARATHON_CACHE_STALE_SECS")?.unwrap_or(DEFAULT_STALE_SECS);
        let page_size: u32 = parse_var(&lookup, "MARATHON_PAGE_SIZE")?.unwrap_or(DEFAULT_PAGE_SIZE);
        let timeout_secs: Option<u64> = parse_var(&lookup, "MARATHON_HTTP_TIMEOUT_SECS")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            stale_after: Duration::from_secs(stale_secs),
            page_size: page_size.max(1),
            request_timeout: timeout_secs.map(Duration::from_secs),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> NotifyResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| NotifyError::Config(format!("{} is not a valid number: '{}'", key, raw))),
        _ => Ok(None),
    }
}
