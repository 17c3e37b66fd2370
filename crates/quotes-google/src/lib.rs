#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Google Finance quote provider.
//!
//! This crate provides [`GoogleFinanceProvider`], which implements the
//! [`QuoteProvider`] trait from `quotes-core` by scraping quote pages.
//!
//! # Features
//!
//! - Tries hinted markets first, then the configured market list
//! - Derives the day's change from the previous close when shown
//! - Retries rate-limit responses and transport failures with backoff
//!
//! # Example
//!
//! ```no_run
//! use quotes_google::GoogleFinanceProvider;
//! use quotes_core::QuoteProvider;
//!
//! # async fn example() -> quotes_core::Result<()> {
//! let provider = GoogleFinanceProvider::new();
//! if let Some(quote) = provider.resolve("spy", Some("NYSEARCA")).await? {
//!     println!("{} {} on {:?}", quote.ticker, quote.last_price, quote.market_identifier);
//! }
//! # Ok(())
//! # }
//! ```

mod markets;
mod parse;

pub use markets::{FALLBACK_MARKET, resolve_markets};

use std::time::Duration;

use async_trait::async_trait;
use quotes_core::{
    GoogleSettings, Quote, QuoteError, QuoteProvider, QuoteSettings, QuoteSource, Result,
    RetryPolicy, Symbol,
};
use tracing::{debug, info, warn};

/// Provider tag written into quotes and cache rows.
const PROVIDER_NAME: &str = "GoogleFinance";

/// Google Finance quote provider.
///
/// Implements [`QuoteSource`] and [`QuoteProvider`].
#[derive(Debug)]
pub struct GoogleFinanceProvider {
    client: reqwest::Client,
    base_url: String,
    markets: String,
    retry: RetryPolicy,
}

impl GoogleFinanceProvider {
    /// Create a new provider with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::from_settings(&QuoteSettings::default())
    }

    /// Create a provider from the `google` and `retry` sections of the settings.
    #[must_use]
    pub fn from_settings(settings: &QuoteSettings) -> Self {
        let google = &settings.google;
        Self::with_client(build_client(google))
            .with_base_url(&google.base_url)
            .with_markets(&google.markets)
            .with_retry_policy(settings.retry.policy())
    }

    /// Create a provider with a custom HTTP client.
    ///
    /// The client is used as-is; its user agent and timeout are not changed.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        let defaults = GoogleSettings::default();
        Self {
            client,
            base_url: defaults.base_url,
            markets: defaults.markets,
            retry: RetryPolicy::default(),
        }
    }

    /// Set the base URL pages are fetched from.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the default markets, comma or whitespace separated.
    #[must_use]
    pub fn with_markets(mut self, markets: impl Into<String>) -> Self {
        self.markets = markets.into();
        self
    }

    /// Set the retry policy applied to each lookup.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Markets tried for `market_hint`, in order.
    #[must_use]
    pub fn markets_for(&self, market_hint: Option<&str>) -> Vec<String> {
        resolve_markets(market_hint, &self.markets)
    }

    fn quote_url(&self, symbol: &Symbol, market: &str) -> String {
        format!("{}/{}:{}", self.base_url, symbol.as_str(), market)
    }

    /// Fetch and parse the page for one market.
    async fn fetch_from_market(&self, symbol: &Symbol, market: &str) -> Result<Option<Quote>> {
        let url = self.quote_url(symbol, market);
        debug!("Fetching quote page: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok());
            return Err(QuoteError::rate_limited(PROVIDER_NAME, retry_after));
        }

        if !status.is_success() {
            debug!(ticker = %symbol, market, status = status.as_u16(), "Quote page not available");
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        let Some(figures) = parse::extract_figures(&body) else {
            info!(ticker = %symbol, market, "Price element not found");
            return Ok(None);
        };

        let (change, percent) = figures.change();
        Ok(Some(
            Quote::new(symbol.clone(), figures.price, PROVIDER_NAME)
                .with_change(change, percent)
                .with_market(market),
        ))
    }

    /// One pass over the market list.
    ///
    /// A rate limit aborts the pass. If no market produced an HTTP response at
    /// all, the last transport error is returned so the pass can be retried.
    async fn resolve_once(&self, symbol: &Symbol, markets: &[String]) -> Result<Option<Quote>> {
        let mut responded = false;
        let mut transport_error = None;

        for market in markets {
            match self.fetch_from_market(symbol, market).await {
                Ok(Some(quote)) => return Ok(Some(quote)),
                Ok(None) => responded = true,
                Err(e) if e.is_rate_limited() => return Err(e),
                Err(e) => {
                    debug!(ticker = %symbol, market = %market, error = %e, "Request failed, trying next market");
                    transport_error = Some(e);
                }
            }
        }

        match transport_error {
            Some(e) if !responded => return Err(e),
            _ => {}
        }

        info!(ticker = %symbol, ?markets, "No quote across markets");
        Ok(None)
    }
}

impl Default for GoogleFinanceProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn build_client(settings: &GoogleSettings) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to build HTTP client, using defaults");
            reqwest::Client::new()
        })
}

impl QuoteSource for GoogleFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn description(&self) -> &str {
        "Google Finance quote pages, scraped per exchange"
    }
}

#[async_trait]
impl QuoteProvider for GoogleFinanceProvider {
    async fn resolve(&self, ticker: &str, market_hint: Option<&str>) -> Result<Option<Quote>> {
        let Some(symbol) = Symbol::parse(ticker) else {
            return Ok(None);
        };
        let markets = self.markets_for(market_hint);

        self.retry
            .run(
                PROVIDER_NAME,
                || self.resolve_once(&symbol, &markets),
                |e| e.is_rate_limited() || e.is_transport(),
            )
            .await
    }
}
