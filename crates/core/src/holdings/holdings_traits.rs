use async_trait::async_trait;

use super::Holding;
use crate::errors::StoreError;

/// Durable store for holding records, keyed by (user, symbol).
#[async_trait]
pub trait HoldingStore: Send + Sync {
    /// List all holdings for a user. Empty-but-present is `Ok(vec![])`,
    /// never `NotFound`.
    async fn list(&self, user_id: &str) -> Result<Vec<Holding>, StoreError>;

    /// Create or replace the holding for (user, symbol).
    async fn upsert(&self, holding: &Holding) -> Result<(), StoreError>;

    /// Remove the holding for (user, symbol). Quantity reaching zero routes
    /// here rather than storing a zero row.
    async fn delete(&self, user_id: &str, symbol: &str) -> Result<(), StoreError>;
}
