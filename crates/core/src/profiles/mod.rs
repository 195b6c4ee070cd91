//! Profiles module - domain model and store trait.

mod profiles_model;
mod profiles_traits;

// Re-export the public interface
pub use profiles_model::Profile;
pub use profiles_traits::ProfileStore;
