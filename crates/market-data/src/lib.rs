//! Papertrade Market Data Crate
//!
//! This crate provides quote fetching and caching for the paper-trading
//! application.
//!
//! # Overview
//!
//! The market data crate supports:
//! - A provider-agnostic [`QuoteProvider`] trait (one symbol per call)
//! - An HTTP provider speaking the Finnhub-shaped quote format
//! - A [`QuoteCache`] with a freshness window and a hard minimum interval
//!   between consecutive provider calls
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |    QuoteCache    |  (freshness policy + throttle gate)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |  QuoteProvider   |  (HTTP adapter, flaky, rate-limited)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |  ProviderQuote   |  (price / high / low / open)
//! +------------------+
//! ```
//!
//! The cache never drops a known value on a failed refresh: the prior quote
//! is retained, and a null-price placeholder is recorded only when no prior
//! quote exists.

pub mod cache;
pub mod errors;
pub mod models;
pub mod provider;

// Re-export the public surface
pub use cache::{CacheConfig, QuoteCache};
pub use errors::MarketDataError;
pub use models::{CachedQuote, Freshness, ProviderQuote, QuoteSnapshot, RefreshOutcome, RefreshReport};
pub use provider::{HttpQuoteProvider, QuoteProvider};
