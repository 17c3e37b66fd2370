#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for the quote resolution pipeline.
//!
//! This crate provides the foundational abstractions shared by every provider
//! and store implementation:
//!
//! - [`QuoteSource`](provider::QuoteSource) - Base trait naming a quote upstream
//! - [`QuoteProvider`](provider::QuoteProvider) - Resolves a ticker to an optional [`Quote`]
//! - [`QuoteStore`](store::QuoteStore) - Persisted last-known quote per ticker
//! - [`RetryPolicy`](retry::RetryPolicy) - Bounded exponential backoff for rate-limited upstreams
//! - [`QuoteSettings`](settings::QuoteSettings) - Configuration consumed by the pipeline

/// Error types for quote operations.
pub mod error;
/// Provider traits for resolving quotes.
pub mod provider;
/// Retry and backoff policy.
pub mod retry;
/// Configuration types.
pub mod settings;
/// Store trait for persisted quotes.
pub mod store;
/// Core data types (Symbol, Quote, CachedQuote).
pub mod types;

// Re-export commonly used items at crate root
pub use error::{QuoteError, Result};
pub use provider::{QuoteProvider, QuoteSource};
pub use retry::RetryPolicy;
pub use settings::{CacheSettings, GoogleSettings, QuoteSettings, RetrySettings, YahooSettings};
pub use store::QuoteStore;
pub use types::{CachedQuote, Quote, Symbol};
