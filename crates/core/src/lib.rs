//! Papertrade Core - Position ledger, collaborator traits, and session flow.
//!
//! This crate contains the core business logic for the paper-trading
//! application. It is storage-agnostic: the profile, holding, and
//! transaction stores are traits implemented by the hosting application,
//! and the ledger only ever receives a price value, never a cache handle.

pub mod constants;
pub mod errors;
pub mod holdings;
pub mod ledger;
pub mod profiles;
pub mod session;
pub mod transactions;

// Re-export common types
pub use holdings::{Holding, HoldingStore};
pub use ledger::{
    plan_order, validate_order, ExecutionResult, ExecutionStep, LedgerService, OrderOutcome,
    OrderPlan, OrderRejection, OrderSide,
};
pub use profiles::{Profile, ProfileStore};
pub use session::{AccountSummary, IdentityProvider, SessionConfig, SessionService};
pub use transactions::{Transaction, TransactionStore};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
pub use errors::StoreError;
