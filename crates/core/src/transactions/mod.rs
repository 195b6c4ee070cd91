//! Transactions module - the append-only audit trail.

mod transactions_model;
mod transactions_traits;

// Re-export the public interface
pub use transactions_model::Transaction;
pub use transactions_traits::TransactionStore;
