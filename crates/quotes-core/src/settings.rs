//! Configuration types consumed by the quote pipeline.
//!
//! Every struct deserializes with `#[serde(default)]`, so a partial source
//! only overrides the keys it names.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::retry::{RetryPolicy, saturating_millis};

/// Top-level settings for providers, retries, and the cache.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteSettings {
    /// Cache freshness.
    pub cache: CacheSettings,
    /// Backoff applied to rate-limited upstreams.
    pub retry: RetrySettings,
    /// HTML scraping provider.
    pub google: GoogleSettings,
    /// JSON quote API provider.
    pub yahoo: YahooSettings,
}

/// Cache freshness settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Maximum age, in seconds, of a cached quote before a refresh is attempted.
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

impl CacheSettings {
    /// Returns the TTL as a [`Duration`].
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Retry/backoff settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Growth factor applied per retry.
    pub multiplier: f64,
    /// Upper bound for a single delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self::from(RetryPolicy::default())
    }
}

impl From<RetryPolicy> for RetrySettings {
    fn from(policy: RetryPolicy) -> Self {
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: saturating_millis(policy.base_delay),
            multiplier: policy.multiplier,
            max_delay_ms: saturating_millis(policy.max_delay),
        }
    }
}

impl RetrySettings {
    /// Builds the [`RetryPolicy`] described by these settings.
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
            self.multiplier,
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

/// Settings for the HTML scraping provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// Base URL; pages are fetched from `{base_url}/{TICKER}:{MARKET}`.
    pub base_url: String,
    /// Comma or whitespace separated markets tried after any hinted ones.
    pub markets: String,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.google.com/finance/quote".to_string(),
            // NYSEARCA first so ETFs like SPY resolve on the first request.
            markets: "NYSEARCA,NASDAQ,NYSE,AMEX,NYSEAMERICAN,OTCMKTS".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 7,
        }
    }
}

/// Settings for the JSON quote API provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YahooSettings {
    /// Base URL; quotes are fetched from `{base_url}/v7/finance/quote`.
    pub base_url: String,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for YahooSettings {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }
}

/// User agent for HTTP requests.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
