use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A user's profile record.
///
/// Created once, at most once, per user id. The cash balance is mutated
/// only by the ledger, and a validated buy can never overdraw it, so it
/// stays non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Opaque authenticated user identifier; immutable.
    pub user_id: String,
    pub display_name: String,
    pub cash_balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>, starting_cash: Decimal) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            cash_balance: starting_cash,
            created_at: now,
            updated_at: now,
        }
    }
}
