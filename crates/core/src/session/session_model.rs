use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_STARTING_CASH;

/// Configuration for session start.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Display name used when the profile is created on first login.
    /// Falls back to the user id when not provided.
    pub display_name: Option<String>,
    /// Simulated cash granted to a newly created profile.
    pub starting_cash: Decimal,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            display_name: None,
            starting_cash: DEFAULT_STARTING_CASH,
        }
    }
}

/// Top-line account figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub cash_balance: Decimal,
    pub market_value: Decimal,
    pub total_account_value: Decimal,
}
