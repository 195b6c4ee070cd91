use async_trait::async_trait;

use super::Transaction;
use crate::errors::StoreError;

/// Durable, append-only store for transaction records.
///
/// Records are never updated or deleted; they are the audit trail every
/// reconciliation pass works from.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Append one transaction record.
    async fn append(&self, transaction: &Transaction) -> Result<(), StoreError>;

    /// List a user's transactions, most recent first.
    async fn list(&self, user_id: &str) -> Result<Vec<Transaction>, StoreError>;
}
