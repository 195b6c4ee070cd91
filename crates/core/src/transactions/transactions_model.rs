use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::OrderSide;

/// One executed order, append-only and immutable once written.
///
/// The transaction id is a UUIDv7, so ids are unique and time-ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub user_id: String,
    pub transaction_id: Uuid,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price_per_share: Decimal,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        user_id: impl Into<String>,
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: Decimal,
        price_per_share: Decimal,
        total_amount: Decimal,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            transaction_id: Uuid::now_v7(),
            symbol: symbol.into(),
            side,
            quantity,
            price_per_share,
            total_amount,
            created_at: Utc::now(),
        }
    }

    /// The cash-flow effect of this transaction: negative for a buy,
    /// positive for a sell. Summing signed amounts over the audit trail
    /// reproduces the cash balance delta exactly.
    pub fn signed_amount(&self) -> Decimal {
        match self.side {
            OrderSide::Buy => -self.total_amount,
            OrderSide::Sell => self.total_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_signed_amount_by_side() {
        let buy = Transaction::new("u1", "AAPL", OrderSide::Buy, dec!(10), dec!(150), dec!(1500));
        let sell = Transaction::new("u1", "AAPL", OrderSide::Sell, dec!(5), dec!(160), dec!(800));
        assert_eq!(buy.signed_amount(), dec!(-1500));
        assert_eq!(sell.signed_amount(), dec!(800));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Transaction::new("u1", "AAPL", OrderSide::Buy, dec!(1), dec!(1), dec!(1));
        let b = Transaction::new("u1", "AAPL", OrderSide::Buy, dec!(1), dec!(1), dec!(1));
        assert_ne!(a.transaction_id, b.transaction_id);
    }
}
