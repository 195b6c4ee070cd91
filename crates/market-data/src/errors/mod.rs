//! Error types for the market data crate.

use thiserror::Error;

/// Errors that can occur while fetching quotes.
///
/// The quote cache treats every variant the same way during a batch refresh:
/// the symbol is marked failed and the batch moves on. Callers that need a
/// confirmed price (order execution) surface these instead.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The requested symbol was not found by the provider.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request to the provider timed out. Treated as a failure along
    /// the same path as an explicit error response, never as success.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// A provider-specific error occurred.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider replied without a usable current price.
    #[error("No price in provider reply for symbol: {symbol}")]
    MissingPrice {
        /// The symbol whose reply lacked a price
        symbol: String,
    },

    /// A network error occurred while communicating with the provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = MarketDataError::SymbolNotFound("INVALID".to_string());
        assert_eq!(format!("{}", error), "Symbol not found: INVALID");

        let error = MarketDataError::Timeout {
            provider: "HTTP".to_string(),
        };
        assert_eq!(format!("{}", error), "Timeout: HTTP");

        let error = MarketDataError::MissingPrice {
            symbol: "AAPL".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "No price in provider reply for symbol: AAPL"
        );
    }
}
