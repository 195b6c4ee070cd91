//! Session module - orchestrates identity, stores, ledger, and cache.

mod session_model;
mod session_service;
mod session_traits;


// Re-export the public interface
pub use session_model::{AccountSummary, SessionConfig};
pub use session_service::SessionService;
pub use session_traits::IdentityProvider;
