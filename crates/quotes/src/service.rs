//! TTL read-through cache over a quote provider.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use quotes_core::{CachedQuote, QuoteProvider, QuoteSettings, QuoteStore, Symbol};

use crate::CompositeProvider;

/// Serves the last known quote per ticker, refreshing it once it goes stale.
///
/// Rows younger than the TTL are returned without touching any provider.
/// Missing or stale rows are refreshed through the provider; a successful
/// refresh overwrites the row, a failed one falls back to the stale row.
/// No method returns an error: store and provider failures are logged.
pub struct QuoteCacheService {
    store: Arc<dyn QuoteStore>,
    provider: Arc<dyn QuoteProvider>,
    ttl: Duration,
}

impl std::fmt::Debug for QuoteCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteCacheService")
            .field("provider", &self.provider.name())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl QuoteCacheService {
    /// Create a service over `store` and `provider` with the given TTL.
    #[must_use]
    pub fn new(store: Arc<dyn QuoteStore>, provider: Arc<dyn QuoteProvider>, ttl: Duration) -> Self {
        Self {
            store,
            provider,
            ttl,
        }
    }

    /// Create a service using the default provider chain built from `settings`.
    #[must_use]
    pub fn from_settings(settings: &QuoteSettings, store: Arc<dyn QuoteStore>) -> Self {
        let provider = CompositeProvider::from_settings(settings);
        Self::new(store, Arc::new(provider), settings.cache.ttl())
    }

    /// Maximum age of a row served without a refresh.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the quote for `ticker`, refreshing it if missing or stale.
    ///
    /// Returns `None` for a blank ticker, or when there is no row and the
    /// refresh fails.
    #[instrument(skip(self))]
    pub async fn get_quote(&self, ticker: &str) -> Option<CachedQuote> {
        let symbol = Symbol::parse(ticker)?;

        match self.load(&symbol).await {
            Some(row) if row.is_fresh(self.ttl, Utc::now()) => {
                debug!(ticker = %symbol, "Cache hit");
                Some(row)
            }
            Some(row) => {
                debug!(ticker = %symbol, last_updated = ?row.last_updated, "Cached quote is stale");
                self.refresh_or_keep(&symbol, row).await
            }
            None => {
                debug!(ticker = %symbol, "Cache miss");
                self.fetch_and_persist(&symbol, None).await
            }
        }
    }

    /// Refreshes `ticker` through the provider regardless of the row's age.
    ///
    /// Falls back to the stored row if the refresh fails.
    #[instrument(skip(self))]
    pub async fn refresh(&self, ticker: &str) -> Option<CachedQuote> {
        let symbol = Symbol::parse(ticker)?;

        match self.load(&symbol).await {
            Some(row) => self.refresh_or_keep(&symbol, row).await,
            None => self.fetch_and_persist(&symbol, None).await,
        }
    }

    async fn load(&self, symbol: &Symbol) -> Option<CachedQuote> {
        match self.store.get(symbol).await {
            Ok(row) => row,
            Err(e) => {
                warn!(ticker = %symbol, error = %e, "Failed to read cached quote, treating as miss");
                None
            }
        }
    }

    async fn refresh_or_keep(&self, symbol: &Symbol, row: CachedQuote) -> Option<CachedQuote> {
        match self.fetch_and_persist(symbol, Some(&row)).await {
            Some(fresh) => Some(fresh),
            None => {
                info!(ticker = %symbol, "Refresh failed, serving stale quote");
                Some(row)
            }
        }
    }

    /// Resolves through the provider and upserts the result.
    ///
    /// The previous row's market and provider are passed on as hints.
    async fn fetch_and_persist(
        &self,
        symbol: &Symbol,
        previous: Option<&CachedQuote>,
    ) -> Option<CachedQuote> {
        let market_hint = previous.and_then(|row| row.market_identifier.as_deref());
        let source_hint = previous.map(|row| row.provider_source.as_str());

        let quote = match self
            .provider
            .resolve_with_source(symbol.as_str(), market_hint, source_hint)
            .await
        {
            Ok(Some(quote)) => quote,
            Ok(None) => {
                debug!(ticker = %symbol, "No provider returned a quote");
                return None;
            }
            Err(e) => {
                warn!(ticker = %symbol, error = %e, "Quote refresh failed");
                return None;
            }
        };

        let row = CachedQuote::from_quote(symbol.clone(), &quote, Utc::now());
        if let Err(e) = self.store.upsert(&row).await {
            warn!(ticker = %symbol, error = %e, "Failed to persist quote");
        }
        debug!(ticker = %symbol, provider = %row.provider_source, "Quote refreshed");
        Some(row)
    }
}
