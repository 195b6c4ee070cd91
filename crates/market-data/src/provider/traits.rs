//! Quote provider trait definition.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::ProviderQuote;

/// Trait for quote providers.
///
/// The provider accepts exactly one symbol per call; there is no batch form
/// and no guaranteed SLA. The cache is responsible for spacing calls out,
/// providers only report errors.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Unique identifier for this provider, used in logs and errors.
    fn id(&self) -> &'static str;

    /// Fetch the current quote for a single symbol.
    async fn fetch_quote(&self, symbol: &str) -> Result<ProviderQuote, MarketDataError>;
}
