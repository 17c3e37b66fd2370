//! Provider traits for resolving quotes.
//!
//! This module defines the core provider traits:
//!
//! - [`QuoteSource`] - Base trait naming an upstream
//! - [`QuoteProvider`] - Resolves a ticker and optional market hint to a [`Quote`]

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::Result, types::Quote};

/// Base trait for all quote providers.
///
/// The name is the tag written into [`Quote::provider`] and into the cache
/// row's provider source.
pub trait QuoteSource: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "GoogleFinance").
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;
}

/// Resolves the latest quote for a ticker from one upstream.
///
/// Absence of data is `Ok(None)`, never an error. Errors are reserved for
/// transport or rate-limit failures that survived the provider's own retry
/// policy.
#[async_trait]
pub trait QuoteProvider: QuoteSource {
    /// Resolves a quote for `ticker`.
    ///
    /// # Arguments
    ///
    /// * `ticker` - The symbol; blank input yields `Ok(None)` without any I/O
    /// * `market_hint` - Comma or whitespace separated exchange codes to try first
    async fn resolve(&self, ticker: &str, market_hint: Option<&str>) -> Result<Option<Quote>>;

    /// Resolves a quote, forwarding `market_hint` only if `source_hint` names this provider.
    ///
    /// A market identifier stored in a cache row only means something to the
    /// provider that produced it. Without a `source_hint` the hint is always
    /// forwarded. Fallback chains override this to apply the rule per delegate.
    async fn resolve_with_source(
        &self,
        ticker: &str,
        market_hint: Option<&str>,
        source_hint: Option<&str>,
    ) -> Result<Option<Quote>> {
        let forward = source_hint.is_none_or(|source| source.eq_ignore_ascii_case(self.name()));
        let hint = if forward { market_hint } else { None };
        self.resolve(ticker, hint).await
    }
}
