//! Holdings module - domain model and store trait.

mod holdings_model;
mod holdings_traits;

// Re-export the public interface
pub use holdings_model::Holding;
pub use holdings_traits::HoldingStore;
