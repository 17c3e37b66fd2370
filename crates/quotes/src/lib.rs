#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Cached latest-price lookup for tickers.
//!
//! This crate re-exports the core types, store implementations, and provider
//! implementations, and adds the two pieces that tie them together:
//!
//! - [`CompositeProvider`] tries providers in order and returns the first quote
//! - [`QuoteCacheService`] serves quotes from a store while they are fresh and
//!   refreshes them through a provider when they are not
//!
//! # Features
//!
//! - `google` - Google Finance scraping provider
//! - `yahoo` - Yahoo Finance JSON provider
//! - `cache-sqlite` - SQLite-based store
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use quotes::{CompositeProvider, InMemoryStore, QuoteCacheService};
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = CompositeProvider::new().with_google().with_yahoo();
//!     let service = QuoteCacheService::new(
//!         Arc::new(InMemoryStore::new()),
//!         Arc::new(provider),
//!         Duration::from_secs(300),
//!     );
//!
//!     if let Some(quote) = service.get_quote("AAPL").await {
//!         println!("{:?}", quote);
//!     }
//! }
//! ```

// Core types and traits
pub use quotes_core::*;

// Store implementations
#[cfg(feature = "cache-sqlite")]
pub use quotes_cache::SqliteStore;
pub use quotes_cache::{InMemoryStore, NoopStore};

// Providers
#[cfg(feature = "google")]
pub use quotes_google::GoogleFinanceProvider;
#[cfg(feature = "yahoo")]
pub use quotes_yahoo::YahooQuoteProvider;

mod composite;
mod loader;
mod service;
#[cfg(test)]
mod testing;

pub use composite::CompositeProvider;
pub use loader::{load_settings, load_settings_from_str};
pub use service::QuoteCacheService;
