//! Design defaults for the core crate.

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Simulated cash balance granted when a profile is first created.
pub const DEFAULT_STARTING_CASH: Decimal = dec!(10000);

/// Bound on a single persistence-collaborator call during order execution.
pub const DEFAULT_STORE_CALL_TIMEOUT: Duration = Duration::from_secs(10);
