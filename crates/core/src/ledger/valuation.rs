//! Portfolio valuation - pure functions over holdings and a price map.
//!
//! Pricing falls back to a holding's average cost when no current price is
//! known, so an unvalued symbol never silently zeroes the portfolio. The
//! per-position views keep the gap visible instead: unpriced symbols carry
//! `None`s rather than zeros.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::holdings::Holding;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Price used to value a holding: the current price if known, else the
/// average cost.
pub fn price_for(holding: &Holding, prices: &HashMap<String, Decimal>) -> Decimal {
    prices
        .get(&holding.symbol)
        .copied()
        .unwrap_or(holding.average_cost)
}

/// Market value of the holdings set under the given prices.
pub fn market_value(holdings: &[Holding], prices: &HashMap<String, Decimal>) -> Decimal {
    holdings
        .iter()
        .map(|h| h.quantity * price_for(h, prices))
        .sum()
}

/// Cash plus market value.
pub fn total_account_value(
    cash_balance: Decimal,
    holdings: &[Holding],
    prices: &HashMap<String, Decimal>,
) -> Decimal {
    cash_balance + market_value(holdings, prices)
}

/// Unrealized gain/loss of a holding at the given price.
pub fn unrealized_gain(holding: &Holding, price: Decimal) -> Decimal {
    holding.quantity * (price - holding.average_cost)
}

/// Unrealized gain/loss as a percentage of cost basis.
///
/// Undefined (`None`, not zero) when the cost basis is zero.
pub fn unrealized_gain_percent(holding: &Holding, price: Decimal) -> Option<Decimal> {
    let cost_basis = holding.cost_basis();
    if cost_basis.is_zero() {
        return None;
    }
    Some(unrealized_gain(holding, price) / cost_basis * HUNDRED)
}

/// One portfolio row: a holding valued at an optional current price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionView {
    pub symbol: String,
    pub quantity: Decimal,
    pub average_cost: Decimal,
    pub current_price: Option<Decimal>,
    pub market_value: Option<Decimal>,
    pub cost_basis: Decimal,
    pub gain_loss: Option<Decimal>,
    pub gain_loss_percent: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

/// Build the portfolio row for one holding.
pub fn position_view(holding: &Holding, price: Option<Decimal>) -> PositionView {
    PositionView {
        symbol: holding.symbol.clone(),
        quantity: holding.quantity,
        average_cost: holding.average_cost,
        current_price: price,
        market_value: price.map(|p| holding.quantity * p),
        cost_basis: holding.cost_basis(),
        gain_loss: price.map(|p| unrealized_gain(holding, p)),
        gain_loss_percent: price.and_then(|p| unrealized_gain_percent(holding, p)),
        updated_at: holding.updated_at,
    }
}

/// Portfolio-level totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioTotals {
    pub total_value: Decimal,
    pub total_cost_basis: Decimal,
    pub total_gain_loss: Decimal,
    pub total_gain_loss_percent: Option<Decimal>,
}

/// Totals over the portfolio rows. Unpriced rows are valued at cost basis,
/// matching the fallback used for market value.
pub fn portfolio_totals(views: &[PositionView]) -> PortfolioTotals {
    let total_value: Decimal = views
        .iter()
        .map(|v| v.market_value.unwrap_or(v.cost_basis))
        .sum();
    let total_cost_basis: Decimal = views.iter().map(|v| v.cost_basis).sum();
    let total_gain_loss = total_value - total_cost_basis;
    let total_gain_loss_percent = if total_cost_basis.is_zero() {
        None
    } else {
        Some(total_gain_loss / total_cost_basis * HUNDRED)
    };

    PortfolioTotals {
        total_value,
        total_cost_basis,
        total_gain_loss,
        total_gain_loss_percent,
    }
}
