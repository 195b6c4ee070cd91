//! Quote cache with a freshness window and a throttled provider gate.
//!
//! The cache owns the symbol -> quote mapping and a single "last provider
//! call" timestamp shared across all symbols. The provider accepts one
//! request at a time, so the gate is held across the call itself: no two
//! provider calls ever overlap, and consecutive calls are spaced by at
//! least the configured minimum interval regardless of how many refresh
//! requests were issued concurrently.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::Utc;
use log::{debug, warn};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::errors::MarketDataError;
use crate::models::{CachedQuote, ProviderQuote, QuoteSnapshot, RefreshOutcome, RefreshReport};
use crate::provider::QuoteProvider;

/// Design default: a quote is usable without refetching for 5 minutes.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(300);

/// Design default: hard minimum spacing between provider calls.
pub const DEFAULT_MIN_CALL_INTERVAL: Duration = Duration::from_secs(1);

/// Design default: bound on a single provider call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the quote cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum age at which a cached quote is used without refetching.
    pub freshness_window: Duration,
    /// Enforced minimum time between consecutive provider calls. This is a
    /// rate-limit contract with the provider, not a performance knob.
    pub min_call_interval: Duration,
    /// Bound on a single provider call; a timeout is a failure.
    pub call_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            min_call_interval: DEFAULT_MIN_CALL_INTERVAL,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Cache of last-known quotes keyed by symbol.
pub struct QuoteCache {
    provider: Arc<dyn QuoteProvider>,
    config: CacheConfig,
    /// Symbol -> cache slot. Written only after a completed fetch, so a
    /// cancelled refresh leaves the map unchanged.
    quotes: RwLock<HashMap<String, CachedQuote>>,
    /// Last provider call, shared across all symbols. Held across the call.
    gate: Mutex<Option<Instant>>,
}

impl QuoteCache {
    /// Create a cache in front of the given provider.
    pub fn new(provider: Arc<dyn QuoteProvider>, config: CacheConfig) -> Self {
        Self {
            provider,
            config,
            quotes: RwLock::new(HashMap::new()),
            gate: Mutex::new(None),
        }
    }

    /// Look up the last-known quote for a symbol.
    ///
    /// A stale quote is still returned, flagged as stale; the caller decides
    /// whether staleness is acceptable. Returns `None` only when the symbol
    /// has never been fetched.
    pub fn get_price(&self, symbol: &str) -> Option<QuoteSnapshot> {
        let quotes = self.read_quotes();
        quotes.get(symbol).map(|cached| QuoteSnapshot {
            freshness: cached.freshness_at(Utc::now(), self.config.freshness_window),
            cached: cached.clone(),
        })
    }

    /// Refresh every symbol in the set whose cached quote is not fresh.
    ///
    /// One pass, one provider call per refreshed symbol, throttled through
    /// the shared gate. A per-symbol failure retains the prior quote (or
    /// records a null-price placeholder when there is none) and the batch
    /// continues; failures are reported in the returned map, never raised.
    pub async fn refresh_all(&self, symbols: &[String]) -> RefreshReport {
        let mut report = RefreshReport::default();

        for symbol in symbols {
            if let Some(snapshot) = self.get_price(symbol) {
                // Placeholders never count as fresh, so failed symbols are
                // retried on the next pass.
                if snapshot.freshness.is_fresh() && snapshot.cached.quote.is_some() {
                    report.record(symbol, RefreshOutcome::SkippedFresh);
                    continue;
                }
            }

            match self.fetch_throttled(symbol).await {
                Ok(quote) => {
                    self.store_quote(symbol, quote);
                    report.record(symbol, RefreshOutcome::Refreshed);
                }
                Err(err) => {
                    warn!("Quote refresh failed for '{}': {}", symbol, err);
                    self.store_failure(symbol);
                    report.record(symbol, RefreshOutcome::Failed(err.to_string()));
                }
            }
        }

        debug!(
            "Refresh pass over {} symbols: {} refreshed, {} failed",
            symbols.len(),
            report.refreshed_count(),
            report.failed_count()
        );
        report
    }

    /// Refresh a single symbol, bypassing the freshness check.
    ///
    /// Still subject to the shared minimum-interval throttle. On failure the
    /// cache is left untouched; the caller may fall back to [`get_price`].
    ///
    /// [`get_price`]: QuoteCache::get_price
    pub async fn refresh_one(&self, symbol: &str) -> Result<CachedQuote, MarketDataError> {
        let quote = self.fetch_throttled(symbol).await?;
        Ok(self.store_quote(symbol, quote))
    }

    /// Issue one provider call through the throttle gate.
    ///
    /// The gate is held across the call, serializing all provider traffic.
    /// A timeout follows the same path as an explicit provider error.
    async fn fetch_throttled(&self, symbol: &str) -> Result<ProviderQuote, MarketDataError> {
        let mut gate = self.gate.lock().await;

        if let Some(last_call) = *gate {
            tokio::time::sleep_until(last_call + self.config.min_call_interval).await;
        }

        let result = match tokio::time::timeout(
            self.config.call_timeout,
            self.provider.fetch_quote(symbol),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(MarketDataError::Timeout {
                provider: self.provider.id().to_string(),
            }),
        };

        *gate = Some(Instant::now());
        result
    }

    fn store_quote(&self, symbol: &str, quote: ProviderQuote) -> CachedQuote {
        let cached = CachedQuote {
            symbol: symbol.to_string(),
            quote: Some(quote),
            fetched_at: Utc::now(),
        };
        let mut quotes = self.write_quotes();
        quotes.insert(symbol.to_string(), cached.clone());
        cached
    }

    /// Record a failed fetch: keep the prior slot if one exists, otherwise
    /// insert a null-price placeholder so the symbol is known to the cache.
    fn store_failure(&self, symbol: &str) {
        let mut quotes = self.write_quotes();
        quotes
            .entry(symbol.to_string())
            .or_insert_with(|| CachedQuote {
                symbol: symbol.to_string(),
                quote: None,
                fetched_at: Utc::now(),
            });
    }

    /// Lock the quote map for reading, recovering from poison. The map holds
    /// plain data, so recovery cannot observe a broken invariant.
    fn read_quotes(&self) -> RwLockReadGuard<'_, HashMap<String, CachedQuote>> {
        self.quotes.read().unwrap_or_else(|poisoned| {
            warn!("Quote map lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_quotes(&self) -> RwLockWriteGuard<'_, HashMap<String, CachedQuote>> {
        self.quotes.write().unwrap_or_else(|poisoned| {
            warn!("Quote map lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    fn quote(price: Decimal) -> ProviderQuote {
        ProviderQuote {
            price,
            high: price,
            low: price,
            open: price,
        }
    }

    /// Provider that replays scripted replies and records call times.
    struct ScriptedProvider {
        replies: StdMutex<HashMap<String, VecDeque<Result<ProviderQuote, String>>>>,
        calls: StdMutex<Vec<(String, Instant)>>,
        delay: Option<Duration>,
    }

    impl ScriptedProvider {
        fn new() -> Self {
            Self {
                replies: StdMutex::new(HashMap::new()),
                calls: StdMutex::new(Vec::new()),
                delay: None,
            }
        }

        fn with_delay(delay: Duration) -> Self {
            let mut provider = Self::new();
            provider.delay = Some(delay);
            provider
        }

        fn script(&self, symbol: &str, reply: Result<ProviderQuote, String>) {
            self.replies
                .lock()
                .unwrap()
                .entry(symbol.to_string())
                .or_default()
                .push_back(reply);
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl QuoteProvider for ScriptedProvider {
        fn id(&self) -> &'static str {
            "SCRIPTED"
        }

        async fn fetch_quote(&self, symbol: &str) -> Result<ProviderQuote, MarketDataError> {
            self.calls
                .lock()
                .unwrap()
                .push((symbol.to_string(), Instant::now()));

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let scripted = self
                .replies
                .lock()
                .unwrap()
                .get_mut(symbol)
                .and_then(|q| q.pop_front());

            match scripted {
                Some(Ok(q)) => Ok(q),
                Some(Err(message)) => Err(MarketDataError::ProviderError {
                    provider: "SCRIPTED".to_string(),
                    message,
                }),
                None => Ok(quote(dec!(100))),
            }
        }
    }

    fn cache_with(provider: Arc<ScriptedProvider>) -> QuoteCache {
        QuoteCache::new(provider, CacheConfig::default())
    }

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// Rewind a slot's fetch timestamp so it falls outside the window.
    fn force_stale(cache: &QuoteCache, symbol: &str) {
        let mut quotes = cache.write_quotes();
        if let Some(slot) = quotes.get_mut(symbol) {
            slot.fetched_at -= chrono::Duration::seconds(600);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_all_spaces_provider_calls() {
        let provider = Arc::new(ScriptedProvider::new());
        let cache = cache_with(provider.clone());

        cache.refresh_all(&symbols(&["AAPL", "MSFT", "GOOG"])).await;

        let times = provider.call_times();
        assert_eq!(times.len(), 3);
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= DEFAULT_MIN_CALL_INTERVAL);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_refreshes_share_the_throttle() {
        let provider = Arc::new(ScriptedProvider::new());
        let cache = Arc::new(cache_with(provider.clone()));

        let set = symbols(&["AAPL", "MSFT"]);
        let all = cache.refresh_all(&set);
        let one = cache.refresh_one("GOOG");
        let (report, single) = tokio::join!(all, one);

        assert_eq!(report.refreshed_count(), 2);
        assert!(single.is_ok());

        let mut times = provider.call_times();
        times.sort();
        assert_eq!(times.len(), 3);
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= DEFAULT_MIN_CALL_INTERVAL);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_all_skips_fresh_quotes() {
        let provider = Arc::new(ScriptedProvider::new());
        let cache = cache_with(provider.clone());
        let set = symbols(&["AAPL", "MSFT"]);

        cache.refresh_all(&set).await;
        assert_eq!(provider.call_count(), 2);

        let report = cache.refresh_all(&set).await;
        assert_eq!(provider.call_count(), 2);
        assert!(report
            .outcomes
            .values()
            .all(|o| matches!(o, RefreshOutcome::SkippedFresh)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_retains_prior_quote() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.script("AAPL", Ok(quote(dec!(150))));
        provider.script("AAPL", Err("upstream down".to_string()));
        let cache = cache_with(provider.clone());

        cache.refresh_all(&symbols(&["AAPL"])).await;
        force_stale(&cache, "AAPL");

        let report = cache.refresh_all(&symbols(&["AAPL"])).await;
        assert_eq!(report.failed_count(), 1);

        let snapshot = cache.get_price("AAPL").unwrap();
        assert_eq!(snapshot.price(), Some(dec!(150)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_inserts_placeholder_when_unknown() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.script("NEWCO", Err("upstream down".to_string()));
        let cache = cache_with(provider.clone());

        let report = cache.refresh_all(&symbols(&["NEWCO"])).await;
        assert_eq!(report.failed_count(), 1);

        let snapshot = cache.get_price("NEWCO").unwrap();
        assert_eq!(snapshot.price(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_continues_past_a_failure() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.script("AAPL", Err("upstream down".to_string()));
        provider.script("MSFT", Ok(quote(dec!(300))));
        let cache = cache_with(provider.clone());

        let report = cache.refresh_all(&symbols(&["AAPL", "MSFT"])).await;

        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.refreshed_count(), 1);
        assert_eq!(cache.get_price("MSFT").unwrap().price(), Some(dec!(300)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_one_bypasses_freshness() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.script("AAPL", Ok(quote(dec!(150))));
        provider.script("AAPL", Ok(quote(dec!(151))));
        let cache = cache_with(provider.clone());

        cache.refresh_all(&symbols(&["AAPL"])).await;
        let cached = cache.refresh_one("AAPL").await.unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(cached.price(), Some(dec!(151)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_one_failure_leaves_cache_untouched() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.script("AAPL", Ok(quote(dec!(150))));
        provider.script("AAPL", Err("upstream down".to_string()));
        let cache = cache_with(provider.clone());

        cache.refresh_one("AAPL").await.unwrap();
        let err = cache.refresh_one("AAPL").await.unwrap_err();

        assert!(matches!(err, MarketDataError::ProviderError { .. }));
        assert_eq!(cache.get_price("AAPL").unwrap().price(), Some(dec!(150)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let provider = Arc::new(ScriptedProvider::with_delay(Duration::from_secs(60)));
        let cache = cache_with(provider.clone());

        let err = cache.refresh_one("AAPL").await.unwrap_err();
        assert!(matches!(err, MarketDataError::Timeout { .. }));
        assert!(cache.get_price("AAPL").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_quote_still_returned_with_flag() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.script("AAPL", Ok(quote(dec!(150))));
        let cache = cache_with(provider.clone());

        cache.refresh_all(&symbols(&["AAPL"])).await;
        force_stale(&cache, "AAPL");

        let snapshot = cache.get_price("AAPL").unwrap();
        assert_eq!(snapshot.freshness, crate::models::Freshness::Stale);
        assert_eq!(snapshot.price(), Some(dec!(150)));
    }
}
