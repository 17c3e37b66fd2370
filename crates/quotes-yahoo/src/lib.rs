#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Yahoo Finance quote provider.
//!
//! This crate provides [`YahooQuoteProvider`], which implements the
//! [`QuoteProvider`] trait from `quotes-core` on top of Yahoo Finance's
//! quote API.
//!
//! # Features
//!
//! - Single request per lookup; the market hint is ignored
//! - Price, change, and exchange are mapped as reported, without derivation
//! - HTTP 429 responses are retried with exponential backoff
//!
//! # Example
//!
//! ```no_run
//! use quotes_yahoo::YahooQuoteProvider;
//! use quotes_core::QuoteProvider;
//!
//! # async fn example() -> quotes_core::Result<()> {
//! let provider = YahooQuoteProvider::new();
//! if let Some(quote) = provider.resolve("AAPL", None).await? {
//!     println!("{} {}", quote.ticker, quote.last_price);
//! }
//! # Ok(())
//! # }
//! ```

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use quotes_core::{
    Quote, QuoteError, QuoteProvider, QuoteSettings, QuoteSource, Result, RetryPolicy, Symbol,
    YahooSettings,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Provider tag written into quotes and cache rows.
const PROVIDER_NAME: &str = "YahooFinance";

/// Path of the quote endpoint, relative to the base URL.
const QUOTE_PATH: &str = "/v7/finance/quote";

/// Yahoo Finance quote provider.
///
/// Implements [`QuoteSource`] and [`QuoteProvider`].
#[derive(Debug)]
pub struct YahooQuoteProvider {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl YahooQuoteProvider {
    /// Create a new provider with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::from_settings(&QuoteSettings::default())
    }

    /// Create a provider from the `yahoo` and `retry` sections of the settings.
    #[must_use]
    pub fn from_settings(settings: &QuoteSettings) -> Self {
        let yahoo = &settings.yahoo;
        let client = reqwest::Client::builder()
            .user_agent(yahoo.user_agent.as_str())
            .timeout(Duration::from_secs(yahoo.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build HTTP client, using defaults");
                reqwest::Client::new()
            });

        Self::with_client(client)
            .with_base_url(&yahoo.base_url)
            .with_retry_policy(settings.retry.policy())
    }

    /// Create a provider with a custom HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: YahooSettings::default().base_url,
            retry: RetryPolicy::default(),
        }
    }

    /// Set the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the retry policy applied to rate-limited lookups.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn quote_url(&self) -> String {
        format!("{}{}", self.base_url, QUOTE_PATH)
    }

    /// Perform one request.
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Option<Quote>> {
        let url = self.quote_url();
        debug!("Fetching quote: {}?symbols={}", url, symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("symbols", symbol.as_str())])
            .header(reqwest::header::ACCEPT, "application/json")
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
            warn!(ticker = %symbol, status = status.as_u16(), "Quote request failed");
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        match parse_quote(symbol, &body) {
            Ok(quote) => Ok(Some(quote)),
            Err(e) => {
                info!(ticker = %symbol, error = %e, "No usable quote in response");
                Ok(None)
            }
        }
    }
}

impl Default for YahooQuoteProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteSource for YahooQuoteProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn description(&self) -> &str {
        "Yahoo Finance quote API"
    }
}

#[async_trait]
impl QuoteProvider for YahooQuoteProvider {
    async fn resolve(&self, ticker: &str, _market_hint: Option<&str>) -> Result<Option<Quote>> {
        let Some(symbol) = Symbol::parse(ticker) else {
            return Ok(None);
        };

        self.retry
            .run(
                PROVIDER_NAME,
                || self.fetch_quote(&symbol),
                QuoteError::is_rate_limited,
            )
            .await
    }
}

/// Maps the first result of a quote response.
fn parse_quote(symbol: &Symbol, body: &str) -> Result<Quote> {
    let envelope: QuoteEnvelope =
        serde_json::from_str(body).map_err(|e| QuoteError::Parse(e.to_string()))?;

    let result = envelope
        .quote_response
        .result
        .into_iter()
        .next()
        .ok_or_else(|| QuoteError::Parse("Empty result".to_string()))?;

    let last_price = result
        .regular_market_price
        .as_ref()
        .and_then(decimal_from)
        .filter(|price| !price.is_sign_negative())
        .ok_or_else(|| QuoteError::Parse("Missing or negative regularMarketPrice".to_string()))?;

    let market = result
        .full_exchange_name
        .or(result.exchange)
        .filter(|name| !name.trim().is_empty());

    let mut quote = Quote::new(symbol.clone(), last_price, PROVIDER_NAME);
    quote.change_today = result.regular_market_change.as_ref().and_then(decimal_from);
    quote.change_today_percentage = result
        .regular_market_change_percent
        .as_ref()
        .and_then(decimal_from);
    quote.market_identifier = market;
    Ok(quote)
}

/// Reads a decimal from a JSON number or numeric string.
fn decimal_from(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

// ============================================================================
// Yahoo Finance API Response Types
// ============================================================================

/// Quote API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<QuoteResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResult {
    regular_market_price: Option<Value>,
    regular_market_change: Option<Value>,
    regular_market_change_percent: Option<Value>,
    full_exchange_name: Option<String>,
    exchange: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{any, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const AAPL_BODY: &str = r#"{
        "quoteResponse": {
            "result": [{
                "symbol": "AAPL",
                "regularMarketPrice": 189.84,
                "regularMarketChange": -1.21,
                "regularMarketChangePercent": -0.6333,
                "exchange": "NMS",
                "fullExchangeName": "NasdaqGS"
            }],
            "error": null
        }
    }"#;

    fn provider_for(server: &MockServer) -> YahooQuoteProvider {
        YahooQuoteProvider::with_client(reqwest::Client::new())
            .with_base_url(server.uri())
            .with_retry_policy(RetryPolicy::new(
                3,
                Duration::from_millis(1),
                2.0,
                Duration::from_millis(5),
            ))
    }

    #[test]
    fn test_provider_name() {
        let provider = YahooQuoteProvider::new();
        assert_eq!(provider.name(), "YahooFinance");
    }

    #[test]
    fn test_parse_quote_maps_fields() {
        let quote = parse_quote(&Symbol::new("AAPL"), AAPL_BODY).unwrap();
        assert_eq!(quote.last_price, dec!(189.84));
        assert_eq!(quote.change_today, Some(dec!(-1.21)));
        assert_eq!(quote.change_today_percentage, Some(dec!(-0.6333)));
        assert_eq!(quote.market_identifier.as_deref(), Some("NasdaqGS"));
    }

    #[test]
    fn test_parse_quote_falls_back_to_exchange_code() {
        let body = r#"{"quoteResponse":{"result":[{"regularMarketPrice":"12.5","exchange":"NYQ"}]}}"#;
        let quote = parse_quote(&Symbol::new("F"), body).unwrap();
        assert_eq!(quote.last_price, dec!(12.5));
        assert_eq!(quote.change_today, None);
        assert_eq!(quote.change_today_percentage, None);
        assert_eq!(quote.market_identifier.as_deref(), Some("NYQ"));
    }

    #[test]
    fn test_parse_quote_rejects_unusable_bodies() {
        let symbol = Symbol::new("AAPL");
        for body in [
            "not json",
            r#"{"quoteResponse":{"result":[]}}"#,
            r#"{"quoteResponse":{"result":[{"regularMarketPrice":null}]}}"#,
            r#"{"quoteResponse":{"result":[{"regularMarketPrice":"n/a"}]}}"#,
            r#"{"quoteResponse":{"result":[{"regularMarketPrice":-5.25}]}}"#,
            r#"{"somethingElse":{}}"#,
        ] {
            assert!(
                matches!(parse_quote(&symbol, body), Err(QuoteError::Parse(_))),
                "body should not parse: {body}"
            );
        }
    }

    #[test]
    fn test_decimal_from_scientific() {
        let value: Value = serde_json::from_str("1.5e-3").unwrap();
        assert_eq!(decimal_from(&value), Some(dec!(0.0015)));
    }

    #[tokio::test]
    async fn test_resolve_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7/finance/quote"))
            .and(query_param("symbols", "AAPL"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(AAPL_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let quote = provider_for(&server)
            .resolve("aapl", Some("NASDAQ"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(quote.ticker.as_str(), "AAPL");
        assert_eq!(quote.provider, "YahooFinance");
        assert_eq!(quote.last_price, dec!(189.84));
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7/finance/quote"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v7/finance/quote"))
            .respond_with(ResponseTemplate::new(200).set_body_string(AAPL_BODY))
            .mount(&server)
            .await;

        let quote = provider_for(&server).resolve("AAPL", None).await.unwrap();
        assert!(quote.is_some());
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let quote = provider_for(&server).resolve("AAPL", None).await.unwrap();
        assert!(quote.is_none());
    }

    #[tokio::test]
    async fn test_malformed_body_is_absent() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let quote = provider_for(&server).resolve("AAPL", None).await.unwrap();
        assert!(quote.is_none());
    }

    #[tokio::test]
    async fn test_blank_ticker_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        assert!(provider_for(&server).resolve("  ", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion_keeps_retry_after() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
            .expect(3)
            .mount(&server)
            .await;

        match provider_for(&server).resolve("AAPL", None).await {
            Err(QuoteError::RateLimited {
                provider,
                retry_after,
            }) => {
                assert_eq!(provider, "YahooFinance");
                assert_eq!(retry_after, Some(Duration::from_secs(30)));
            }
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_error_is_surfaced_without_retry() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(AAPL_BODY)
                    .set_delay(Duration::from_millis(500)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let provider = YahooQuoteProvider::with_client(client)
            .with_base_url(server.uri())
            .with_retry_policy(RetryPolicy::new(
                3,
                Duration::from_millis(1),
                2.0,
                Duration::from_millis(5),
            ));

        let result = provider.resolve("AAPL", None).await;
        assert!(matches!(result, Err(QuoteError::Network(_))));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
