//! Market data models.
//!
//! - [`ProviderQuote`] - one reply from the quote provider
//! - [`CachedQuote`] - a cache slot (quote plus fetch timestamp)
//! - [`QuoteSnapshot`] - what a price lookup hands back, with freshness
//! - [`RefreshReport`] - per-symbol outcomes of a batch refresh

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single quote as returned by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderQuote {
    /// Current price
    pub price: Decimal,
    /// High price of the day
    pub high: Decimal,
    /// Low price of the day
    pub low: Decimal,
    /// Open price of the day
    pub open: Decimal,
}

/// A cache slot for one symbol.
///
/// `quote` is `None` for the null-price placeholder written when a fetch
/// fails and no prior quote exists. Quotes are ephemeral: they live only in
/// the cache and are superseded by newer fetches, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedQuote {
    pub symbol: String,
    pub quote: Option<ProviderQuote>,
    pub fetched_at: DateTime<Utc>,
}

impl CachedQuote {
    /// Freshness of this slot at `now` under the given window.
    ///
    /// A quote is fresh iff `now - fetched_at < window`; exactly at the
    /// window boundary it is stale.
    pub fn freshness_at(&self, now: DateTime<Utc>, window: Duration) -> Freshness {
        let age = now.signed_duration_since(self.fetched_at);
        match chrono::Duration::from_std(window) {
            Ok(window) if age < window => Freshness::Fresh,
            _ => Freshness::Stale,
        }
    }

    /// The current price, if the slot holds a real quote.
    pub fn price(&self) -> Option<Decimal> {
        self.quote.map(|q| q.price)
    }
}

/// Whether a cached quote is inside the freshness window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Freshness {
    Fresh,
    Stale,
}

impl Freshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh)
    }
}

/// A price lookup result: the cached value plus its freshness.
///
/// Stale values are still returned; the caller decides whether staleness is
/// acceptable (display vs. order execution).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteSnapshot {
    pub cached: CachedQuote,
    pub freshness: Freshness,
}

impl QuoteSnapshot {
    /// The current price, if any.
    pub fn price(&self) -> Option<Decimal> {
        self.cached.price()
    }
}

/// Per-symbol outcome of a batch refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A provider call succeeded and the slot was replaced.
    Refreshed,
    /// The cached quote was still fresh; no provider call was made.
    SkippedFresh,
    /// The provider call failed; the prior quote (if any) was retained.
    Failed(String),
}

/// Result of a `refresh_all` pass.
///
/// Individual symbol failures never abort the batch; they show up here for
/// the caller to surface.
#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    pub outcomes: HashMap<String, RefreshOutcome>,
}

impl RefreshReport {
    pub fn record(&mut self, symbol: &str, outcome: RefreshOutcome) {
        self.outcomes.insert(symbol.to_string(), outcome);
    }

    pub fn refreshed_count(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, RefreshOutcome::Refreshed))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, RefreshOutcome::Failed(_)))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }
}
