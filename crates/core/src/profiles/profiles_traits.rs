use async_trait::async_trait;
use rust_decimal::Decimal;

use super::Profile;
use crate::errors::StoreError;

/// Durable store for profile records.
///
/// A remote key-value service with per-call success/failure and no
/// transactions across calls. Implementations convert their own errors to
/// [`StoreError`].
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile for a user. `StoreError::NotFound` when absent.
    async fn get(&self, user_id: &str) -> Result<Profile, StoreError>;

    /// Create a profile. Must reject with `StoreError::AlreadyExists` if a
    /// profile already exists for this user id (create-once semantics).
    async fn create(
        &self,
        user_id: &str,
        display_name: &str,
        starting_cash: Decimal,
    ) -> Result<Profile, StoreError>;

    /// Persist a new cash balance for the user.
    async fn update_cash_balance(&self, user_id: &str, new_balance: Decimal)
        -> Result<(), StoreError>;
}
