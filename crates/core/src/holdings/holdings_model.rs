use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One held position: quantity and average cost for a symbol.
///
/// Invariant: a holding with quantity <= 0 must not exist; it is deleted
/// instead. The ledger enforces this on every sell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub user_id: String,
    /// Unique per user.
    pub symbol: String,
    /// Always positive.
    pub quantity: Decimal,
    /// Average price paid per unit (cost basis), always positive.
    pub average_cost: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl Holding {
    pub fn new(
        user_id: impl Into<String>,
        symbol: impl Into<String>,
        quantity: Decimal,
        average_cost: Decimal,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            symbol: symbol.into(),
            quantity,
            average_cost,
            updated_at: Utc::now(),
        }
    }

    /// Total amount paid for this position at the average cost.
    pub fn cost_basis(&self) -> Decimal {
        self.quantity * self.average_cost
    }
}
