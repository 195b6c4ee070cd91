//! Core error types for the paper-trading application.
//!
//! This module defines storage-agnostic error types. Store-specific errors
//! (DynamoDB, SQLite, whatever backs the collaborator traits) are converted
//! to [`StoreError`] by the implementing layer.

use thiserror::Error;

use crate::ledger::{ExecutionStep, OrderRejection};
use papertrade_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the core.
#[derive(Error, Debug)]
pub enum Error {
    /// An order failed validation. User-correctable, reported verbatim with
    /// the computed shortfall/owned amount, never retried automatically.
    #[error("Order validation failed: {0}")]
    Validation(#[from] OrderRejection),

    /// A quote fetch failed where a confirmed price was required.
    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    /// A persistence collaborator call failed outside order execution.
    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),

    /// Order execution halted at a persistence step. Earlier steps are NOT
    /// rolled back; the caller must treat this as a recoverable
    /// inconsistency requiring reconciliation, not retry it blindly.
    #[error("Order execution halted at step {step}: {source}")]
    ExecutionHalted {
        /// The step that failed.
        step: ExecutionStep,
        /// The steps that had already completed durably, in order.
        completed: Vec<ExecutionStep>,
        /// The underlying store failure.
        source: StoreError,
    },

    /// No authenticated session.
    #[error("No authenticated user session")]
    Unauthenticated,
}

/// Storage-agnostic error type for the collaborator stores.
///
/// Uses `String` for the details so implementations can convert their own
/// error types without this crate depending on them.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// The requested record was not found. Distinguished from
    /// empty-but-present collections, which are `Ok` with an empty list.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A create collided with an existing record (create-once keys).
    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    /// The store call failed.
    #[error("Store call failed: {0}")]
    CallFailed(String),

    /// The store call exceeded its bounded timeout. Treated exactly like an
    /// explicit failure, never as success.
    #[error("Store call timed out: {0}")]
    Timeout(String),
}

impl Error {
    /// True for errors the user can correct by changing the order.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
