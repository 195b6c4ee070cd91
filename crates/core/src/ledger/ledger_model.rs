//! Order domain types and the pure validation/planning functions.
//!
//! Everything here is side-effect-free: `validate_order` and `plan_order`
//! compute over snapshots of cash and the symbol's holding, which keeps the
//! weighted-average and deletion rules unit-testable without any store.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::holdings::Holding;
use crate::transactions::Transaction;

/// Side of a market order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Why an order was rejected. User-correctable; reported verbatim with the
/// computed shortfall/owned amounts and never retried automatically.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderRejection {
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity { quantity: Decimal },

    #[error("Insufficient funds: need {required} but only {available} available (short {shortfall})")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
        shortfall: Decimal,
    },

    #[error("No holding for symbol {symbol}")]
    NoHolding { symbol: String },

    #[error("Insufficient shares: requested {requested} but only {owned} owned")]
    InsufficientShares { requested: Decimal, owned: Decimal },
}

/// What an order does to the position, as a tagged variant rather than
/// nested conditionals. Each variant carries the post-trade figures it
/// implies; realized gain is reported, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OrderOutcome {
    /// First buy of a symbol: average cost is the fill price.
    NewPosition {
        quantity: Decimal,
        average_cost: Decimal,
    },
    /// Subsequent buy: weighted-average cost over old and new shares.
    AddToPosition {
        new_quantity: Decimal,
        new_average_cost: Decimal,
    },
    /// Partial sell: quantity shrinks, average cost is unchanged.
    ReducePosition {
        new_quantity: Decimal,
        average_cost: Decimal,
        realized_gain: Decimal,
    },
    /// Full sell: the holding is deleted rather than kept at zero.
    ClosePosition { realized_gain: Decimal },
}

impl OrderOutcome {
    /// Realized gain/loss for sells; `None` for buys.
    pub fn realized_gain(&self) -> Option<Decimal> {
        match self {
            OrderOutcome::ReducePosition { realized_gain, .. }
            | OrderOutcome::ClosePosition { realized_gain } => Some(*realized_gain),
            _ => None,
        }
    }
}

/// A fully computed order, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlan {
    pub side: OrderSide,
    pub symbol: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// `quantity * unit_price`: total cost for a buy, total proceeds for a sell.
    pub total_amount: Decimal,
    pub new_cash_balance: Decimal,
    pub outcome: OrderOutcome,
}

/// The persistence steps of order execution, in canonical order:
/// cash balance, then holding, then transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStep {
    CashBalance,
    Holding,
    Transaction,
}

impl fmt::Display for ExecutionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStep::CashBalance => write!(f, "CASH_BALANCE"),
            ExecutionStep::Holding => write!(f, "HOLDING"),
            ExecutionStep::Transaction => write!(f, "TRANSACTION"),
        }
    }
}

/// Result of a fully executed order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    /// The appended audit record.
    pub transaction: Transaction,
    pub outcome: OrderOutcome,
    pub new_cash_balance: Decimal,
    /// The holding as persisted, `None` when the position was closed.
    pub holding: Option<Holding>,
    /// Realized gain/loss for sells.
    pub realized_gain: Option<Decimal>,
}

/// Validate an order against a snapshot of cash and the symbol's holding.
///
/// Pure and side-effect-free. Rules are checked in order, first failure
/// wins; exact equality passes both the funds and the shares check. It runs
/// before the confirmation step and again at execution time, since prices
/// and balances may have changed in between.
pub fn validate_order(
    side: OrderSide,
    symbol: &str,
    quantity: Decimal,
    unit_price: Decimal,
    cash_balance: Decimal,
    holding: Option<&Holding>,
) -> Result<(), OrderRejection> {
    // Decimal carries no NaN/infinity, so positivity is the whole check.
    if quantity <= Decimal::ZERO {
        return Err(OrderRejection::InvalidQuantity { quantity });
    }

    match side {
        OrderSide::Buy => {
            let required = quantity * unit_price;
            if required > cash_balance {
                return Err(OrderRejection::InsufficientFunds {
                    required,
                    available: cash_balance,
                    shortfall: required - cash_balance,
                });
            }
        }
        OrderSide::Sell => {
            let holding = holding.ok_or_else(|| OrderRejection::NoHolding {
                symbol: symbol.to_string(),
            })?;
            if holding.quantity < quantity {
                return Err(OrderRejection::InsufficientShares {
                    requested: quantity,
                    owned: holding.quantity,
                });
            }
        }
    }

    Ok(())
}

/// Validate and compute an order plan from the pre-update snapshot.
///
/// The weighted average for an add-to-position buy is computed with the old
/// quantity and old average cost, never an already-mutated holding:
/// `(old_qty * old_avg + total_cost) / (old_qty + qty)`.
pub fn plan_order(
    side: OrderSide,
    symbol: &str,
    quantity: Decimal,
    unit_price: Decimal,
    cash_balance: Decimal,
    holding: Option<&Holding>,
) -> Result<OrderPlan, OrderRejection> {
    validate_order(side, symbol, quantity, unit_price, cash_balance, holding)?;

    let total_amount = quantity * unit_price;

    let (new_cash_balance, outcome) = match side {
        OrderSide::Buy => {
            let outcome = match holding {
                None => OrderOutcome::NewPosition {
                    quantity,
                    average_cost: unit_price,
                },
                Some(old) => {
                    let new_quantity = old.quantity + quantity;
                    let new_average_cost =
                        (old.quantity * old.average_cost + total_amount) / new_quantity;
                    OrderOutcome::AddToPosition {
                        new_quantity,
                        new_average_cost,
                    }
                }
            };
            (cash_balance - total_amount, outcome)
        }
        OrderSide::Sell => {
            let old = holding.ok_or_else(|| OrderRejection::NoHolding {
                symbol: symbol.to_string(),
            })?;
            let realized_gain = quantity * (unit_price - old.average_cost);
            let new_quantity = old.quantity - quantity;
            let outcome = if new_quantity.is_zero() {
                OrderOutcome::ClosePosition { realized_gain }
            } else {
                OrderOutcome::ReducePosition {
                    new_quantity,
                    average_cost: old.average_cost,
                    realized_gain,
                }
            };
            (cash_balance + total_amount, outcome)
        }
    };

    Ok(OrderPlan {
        side,
        symbol: symbol.to_string(),
        quantity,
        unit_price,
        total_amount,
        new_cash_balance,
        outcome,
    })
}
