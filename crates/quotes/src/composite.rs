//! Ordered fallback chain of quote providers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use quotes_core::{Quote, QuoteError, QuoteProvider, QuoteSettings, QuoteSource, Result, Symbol};

/// Provider that tries its delegates in order and returns the first quote.
///
/// A delegate that returns nothing or fails is logged and skipped; later
/// delegates are not invoked once one produces a quote. The composite itself
/// never returns an error from [`QuoteProvider::resolve`].
///
/// # Example
///
/// ```rust,ignore
/// use quotes::CompositeProvider;
///
/// let provider = CompositeProvider::new()
///     .with_google()
///     .with_yahoo();
///
/// let quote = provider.resolve_required("SPY", Some("NYSEARCA")).await?;
/// ```
#[derive(Default)]
pub struct CompositeProvider {
    providers: Vec<Arc<dyn QuoteProvider>>,
}

impl std::fmt::Debug for CompositeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeProvider")
            .field("providers", &self.provider_names())
            .finish()
    }
}

impl CompositeProvider {
    /// Create a new empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chain from providers, in priority order.
    #[must_use]
    pub fn from_providers(providers: Vec<Arc<dyn QuoteProvider>>) -> Self {
        Self { providers }
    }

    /// Build the default chain from settings: Google Finance, then Yahoo Finance.
    ///
    /// Providers whose feature is disabled are left out.
    #[must_use]
    #[cfg_attr(
        not(any(feature = "google", feature = "yahoo")),
        allow(unused_mut, unused_variables)
    )]
    pub fn from_settings(settings: &QuoteSettings) -> Self {
        let mut chain = Self::new();
        #[cfg(feature = "google")]
        chain.register(Arc::new(quotes_google::GoogleFinanceProvider::from_settings(
            settings,
        )));
        #[cfg(feature = "yahoo")]
        chain.register(Arc::new(quotes_yahoo::YahooQuoteProvider::from_settings(
            settings,
        )));
        chain
    }

    /// Append a provider to the end of the chain.
    pub fn register(&mut self, provider: Arc<dyn QuoteProvider>) {
        debug!(provider = provider.name(), "Registering quote provider");
        self.providers.push(provider);
    }

    /// Append a provider to the end of the chain.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn QuoteProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Names of the delegates, in order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Number of delegates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if no delegate is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Like [`QuoteProvider::resolve`], but absence is an error.
    ///
    /// # Errors
    /// Returns [`QuoteError::AllProvidersExhausted`] if no delegate produced a quote.
    pub async fn resolve_required(&self, ticker: &str, market_hint: Option<&str>) -> Result<Quote> {
        self.resolve_chain(ticker, market_hint, None)
            .await
            .ok_or_else(|| QuoteError::AllProvidersExhausted {
                ticker: ticker.trim().to_uppercase(),
            })
    }

    async fn resolve_chain(
        &self,
        ticker: &str,
        market_hint: Option<&str>,
        source_hint: Option<&str>,
    ) -> Option<Quote> {
        let symbol = Symbol::parse(ticker)?;

        for provider in &self.providers {
            debug!(provider = provider.name(), ticker = %symbol, "Resolving quote");

            match provider
                .resolve_with_source(symbol.as_str(), market_hint, source_hint)
                .await
            {
                Ok(Some(quote)) => return Some(quote),
                Ok(None) => {
                    debug!(provider = provider.name(), ticker = %symbol, "No quote, trying next");
                }
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        ticker = %symbol,
                        error = %e,
                        "Provider failed, trying next"
                    );
                }
            }
        }

        warn!(ticker = %symbol, providers = ?self.provider_names(), "All providers exhausted");
        None
    }

    /// Add the Google Finance provider with default settings.
    #[cfg(feature = "google")]
    #[must_use]
    pub fn with_google(self) -> Self {
        self.with_provider(Arc::new(quotes_google::GoogleFinanceProvider::new()))
    }

    /// Add the Yahoo Finance provider with default settings.
    #[cfg(feature = "yahoo")]
    #[must_use]
    pub fn with_yahoo(self) -> Self {
        self.with_provider(Arc::new(quotes_yahoo::YahooQuoteProvider::new()))
    }
}

impl QuoteSource for CompositeProvider {
    fn name(&self) -> &str {
        "Composite"
    }

    fn description(&self) -> &str {
        "Ordered fallback over the registered quote providers"
    }
}

#[async_trait]
impl QuoteProvider for CompositeProvider {
    async fn resolve(&self, ticker: &str, market_hint: Option<&str>) -> Result<Option<Quote>> {
        Ok(self.resolve_chain(ticker, market_hint, None).await)
    }

    /// Forwards `market_hint` only to delegates named by `source_hint`.
    async fn resolve_with_source(
        &self,
        ticker: &str,
        market_hint: Option<&str>,
        source_hint: Option<&str>,
    ) -> Result<Option<Quote>> {
        Ok(self.resolve_chain(ticker, market_hint, source_hint).await)
    }
}
