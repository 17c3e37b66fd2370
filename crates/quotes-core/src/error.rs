//! Error types for quote operations.
//!
//! This module defines [`QuoteError`] which covers the failures a provider or
//! store can signal. Ordinary "no data" conditions are not errors: providers
//! return `Ok(None)` for those.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while resolving, parsing, or caching quotes.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// Rate limit exceeded by a provider. Retryable.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying, when the upstream sent one.
        retry_after: Option<Duration>,
    },

    /// Network-related errors (connection failures, timeouts, body reads).
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed or missing fields in an upstream response.
    ///
    /// Providers translate this into "no quote" before returning.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Every provider in a fallback chain returned nothing or failed.
    #[error("No provider returned a quote for {ticker}")]
    AllProvidersExhausted {
        /// The ticker that was requested.
        ticker: String,
    },

    /// Error interacting with the quote store.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl QuoteError {
    /// Builds [`QuoteError::RateLimited`] from a raw `Retry-After` header value.
    ///
    /// Only the delay-seconds form is understood; an HTTP date or garbage
    /// leaves `retry_after` unset.
    #[must_use]
    pub fn rate_limited(provider: impl Into<String>, retry_after_header: Option<&str>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            retry_after: retry_after_header
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        }
    }

    /// Returns true for [`QuoteError::RateLimited`].
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns true for transport-level failures.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Result type alias using [`QuoteError`].
pub type Result<T> = std::result::Result<T, QuoteError>;
