//! Session service - the thin orchestrator over ledger and cache.
//!
//! On start it resolves the user, loads profile and holdings, and warms the
//! cache for every held symbol. Order placement goes through a fresh price
//! confirmation before any funds are committed; display paths accept stale
//! quotes rather than failing.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use log::{debug, info, warn};
use rust_decimal::Decimal;

use super::session_model::{AccountSummary, SessionConfig};
use super::session_traits::IdentityProvider;
use crate::constants::DEFAULT_STORE_CALL_TIMEOUT;
use crate::errors::{Result, StoreError};
use crate::holdings::HoldingStore;
use crate::ledger::{
    market_value, plan_order, position_view, total_account_value, ExecutionResult, LedgerService,
    OrderPlan, OrderSide, PositionView,
};
use crate::profiles::{Profile, ProfileStore};
use crate::transactions::{Transaction, TransactionStore};
use papertrade_market_data::{Freshness, MarketDataError, QuoteCache, QuoteSnapshot};

/// Run one store call under the bounded timeout; a timeout is a failure,
/// same as in the ledger's execution path.
async fn store_call<T, F>(what: &str, call: F) -> std::result::Result<T, StoreError>
where
    F: Future<Output = std::result::Result<T, StoreError>>,
{
    match tokio::time::timeout(DEFAULT_STORE_CALL_TIMEOUT, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(format!(
            "{} exceeded {:?}",
            what, DEFAULT_STORE_CALL_TIMEOUT
        ))),
    }
}

/// One authenticated user's trading session.
pub struct SessionService {
    profile: Profile,
    ledger: LedgerService,
    cache: Arc<QuoteCache>,
    transaction_store: Arc<dyn TransactionStore>,
}

impl SessionService {
    /// Start a session: resolve the user, load (or create) the profile,
    /// load holdings, and warm the cache for every held symbol.
    ///
    /// The warm-up is a display refresh: per-symbol provider failures are
    /// logged and absorbed, stale or missing prices surface later as
    /// unpriced portfolio rows.
    pub async fn start(
        identity: Arc<dyn IdentityProvider>,
        profile_store: Arc<dyn ProfileStore>,
        holding_store: Arc<dyn HoldingStore>,
        transaction_store: Arc<dyn TransactionStore>,
        cache: Arc<QuoteCache>,
        config: SessionConfig,
    ) -> Result<Self> {
        let user_id = identity.current_user()?;

        let profile = match store_call("profile get", profile_store.get(&user_id)).await {
            Ok(profile) => profile,
            Err(StoreError::NotFound(_)) => {
                let display_name = config
                    .display_name
                    .clone()
                    .unwrap_or_else(|| user_id.clone());
                info!(
                    "No profile for user {}, creating one with starting cash {}",
                    user_id, config.starting_cash
                );
                store_call(
                    "profile create",
                    profile_store.create(&user_id, &display_name, config.starting_cash),
                )
                .await?
            }
            Err(err) => return Err(err.into()),
        };

        let holdings = store_call("holdings list", holding_store.list(&user_id)).await?;
        let held_symbols: Vec<String> = holdings.iter().map(|h| h.symbol.clone()).collect();

        let ledger = LedgerService::new(
            &user_id,
            profile.cash_balance,
            holdings,
            profile_store,
            holding_store,
            transaction_store.clone(),
        );

        let report = cache.refresh_all(&held_symbols).await;
        if report.has_failures() {
            warn!(
                "Warm-up refresh: {} of {} symbols failed",
                report.failed_count(),
                held_symbols.len()
            );
        }

        Ok(Self {
            profile,
            ledger,
            cache,
            transaction_store,
        })
    }

    pub fn user_id(&self) -> &str {
        self.ledger.user_id()
    }

    /// The profile as loaded at session start. The live cash balance is on
    /// the ledger, not here.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn ledger(&self) -> &LedgerService {
        &self.ledger
    }

    pub fn cash_balance(&self) -> Decimal {
        self.ledger.cash_balance()
    }

    /// Quote a symbol for display: cached-if-fresh, refreshed otherwise.
    ///
    /// A provider failure is absorbed when a prior quote exists - the stale
    /// value is returned, flagged stale. It surfaces only when the cache has
    /// nothing to fall back to.
    pub async fn quote(&self, symbol: &str) -> Result<QuoteSnapshot> {
        if let Some(snapshot) = self.cache.get_price(symbol) {
            if snapshot.freshness.is_fresh() && snapshot.cached.quote.is_some() {
                return Ok(snapshot);
            }
        }

        match self.cache.refresh_one(symbol).await {
            Ok(cached) => Ok(QuoteSnapshot {
                cached,
                freshness: Freshness::Fresh,
            }),
            Err(err) => {
                if let Some(snapshot) = self.cache.get_price(symbol) {
                    if snapshot.cached.quote.is_some() {
                        warn!(
                            "Quote refresh failed for '{}', serving stale value: {}",
                            symbol, err
                        );
                        return Ok(snapshot);
                    }
                }
                Err(err.into())
            }
        }
    }

    /// Validate and price an order against the cached quote, for the
    /// confirmation step. Stale prices are acceptable here; execution
    /// re-validates against a fresh one.
    pub fn preview_order(
        &self,
        side: OrderSide,
        symbol: &str,
        quantity: Decimal,
    ) -> Result<OrderPlan> {
        let price = self
            .cache
            .get_price(symbol)
            .and_then(|snapshot| snapshot.price())
            .ok_or_else(|| MarketDataError::MissingPrice {
                symbol: symbol.to_string(),
            })?;

        let holding = self.ledger.holding(symbol);
        let plan = plan_order(
            side,
            symbol,
            quantity,
            price,
            self.ledger.cash_balance(),
            holding.as_ref(),
        )?;
        Ok(plan)
    }

    /// Place a market order.
    ///
    /// The price is freshly confirmed immediately before committing funds;
    /// a provider failure aborts the order before any persistence call is
    /// made. Validation runs inside the ledger at execution time.
    pub async fn place_order(
        &self,
        side: OrderSide,
        symbol: &str,
        quantity: Decimal,
    ) -> Result<ExecutionResult> {
        let cached = self.cache.refresh_one(symbol).await?;
        let quote = cached.quote.ok_or(MarketDataError::MissingPrice {
            symbol: symbol.to_string(),
        })?;

        let result = self
            .ledger
            .execute_order(side, symbol, quantity, quote.price)
            .await?;

        // Post-trade refresh so the position view is current. Detached: the
        // order is already durable, and the throttle makes this wait.
        let cache = self.cache.clone();
        let symbol = symbol.to_string();
        tokio::spawn(async move {
            if let Err(err) = cache.refresh_one(&symbol).await {
                debug!("Post-trade quote refresh failed for '{}': {}", symbol, err);
            }
        });

        Ok(result)
    }

    /// Refresh prices for all held symbols (the manual refresh button).
    /// Per-symbol failures are reported in the result, never raised.
    pub async fn refresh_portfolio_prices(&self) -> papertrade_market_data::RefreshReport {
        let symbols: Vec<String> = self
            .ledger
            .holdings()
            .into_iter()
            .map(|h| h.symbol)
            .collect();
        self.cache.refresh_all(&symbols).await
    }

    /// Portfolio rows valued at the cached prices, sorted by symbol.
    /// Unpriced symbols come through with `None`s, not zeros.
    pub fn portfolio(&self) -> Vec<PositionView> {
        let mut views: Vec<PositionView> = self
            .ledger
            .holdings()
            .iter()
            .map(|holding| {
                let price = self
                    .cache
                    .get_price(&holding.symbol)
                    .and_then(|snapshot| snapshot.price());
                position_view(holding, price)
            })
            .collect();
        views.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        views
    }

    /// Cash, market value, and total account value at cached prices.
    pub fn account_summary(&self) -> AccountSummary {
        let holdings = self.ledger.holdings();
        let prices: HashMap<String, Decimal> = holdings
            .iter()
            .filter_map(|h| {
                self.cache
                    .get_price(&h.symbol)
                    .and_then(|snapshot| snapshot.price())
                    .map(|price| (h.symbol.clone(), price))
            })
            .collect();

        let cash_balance = self.ledger.cash_balance();
        AccountSummary {
            cash_balance,
            market_value: market_value(&holdings, &prices),
            total_account_value: total_account_value(cash_balance, &holdings, &prices),
        }
    }

    /// Transaction history, most recent first.
    pub async fn transactions(&self) -> Result<Vec<Transaction>> {
        Ok(store_call(
            "transactions list",
            self.transaction_store.list(self.user_id()),
        )
        .await?)
    }
}
