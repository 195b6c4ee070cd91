//! HTTP quote provider.
//!
//! Talks to a single-quote HTTP endpoint of the form
//! `GET {base_url}?symbol={symbol}` returning the Finnhub-shaped body:
//! `c` (current), `h` (high), `l` (low), `o` (open).

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::ProviderQuote;
use crate::provider::QuoteProvider;

const PROVIDER_ID: &str = "HTTP";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Response body of the quote endpoint.
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
    /// High price of the day
    h: Option<f64>,
    /// Low price of the day
    l: Option<f64>,
    /// Open price of the day
    o: Option<f64>,
}

impl QuoteResponse {
    /// Convert the raw reply into a quote.
    ///
    /// A missing or non-finite current price is an error; the other fields
    /// fall back to the current price when absent (the endpoint omits them
    /// outside trading hours).
    fn into_provider_quote(self, symbol: &str) -> Result<ProviderQuote, MarketDataError> {
        let price = self
            .c
            .and_then(to_decimal)
            .ok_or_else(|| MarketDataError::MissingPrice {
                symbol: symbol.to_string(),
            })?;

        Ok(ProviderQuote {
            price,
            high: self.h.and_then(to_decimal).unwrap_or(price),
            low: self.l.and_then(to_decimal).unwrap_or(price),
            open: self.o.and_then(to_decimal).unwrap_or(price),
        })
    }
}

fn to_decimal(value: f64) -> Option<Decimal> {
    Decimal::try_from(value).ok()
}

/// Quote provider backed by a single-quote HTTP endpoint.
pub struct HttpQuoteProvider {
    client: Client,
    base_url: String,
}

impl HttpQuoteProvider {
    /// Create a provider for the given endpoint with a bounded client timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl QuoteProvider for HttpQuoteProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<ProviderQuote, MarketDataError> {
        debug!("Fetching quote for '{}' from {}", symbol, self.base_url);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("symbol", symbol)])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
        }
        if !status.is_success() {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {} for symbol {}", status, symbol),
            });
        }

        let body: QuoteResponse = response.json().await?;
        body.into_provider_quote(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_full_reply_converts() {
        let response = QuoteResponse {
            c: Some(150.25),
            h: Some(152.0),
            l: Some(148.5),
            o: Some(149.0),
        };
        let quote = response.into_provider_quote("AAPL").unwrap();
        assert_eq!(quote.price, dec!(150.25));
        assert_eq!(quote.high, dec!(152.0));
        assert_eq!(quote.low, dec!(148.5));
        assert_eq!(quote.open, dec!(149.0));
    }

    #[test]
    fn test_missing_price_is_error() {
        let response = QuoteResponse {
            c: None,
            h: Some(152.0),
            l: Some(148.5),
            o: Some(149.0),
        };
        let err = response.into_provider_quote("AAPL").unwrap_err();
        assert!(matches!(err, MarketDataError::MissingPrice { .. }));
    }

    #[test]
    fn test_missing_ohl_falls_back_to_price() {
        let response = QuoteResponse {
            c: Some(150.0),
            h: None,
            l: None,
            o: None,
        };
        let quote = response.into_provider_quote("AAPL").unwrap();
        assert_eq!(quote.high, dec!(150.0));
        assert_eq!(quote.low, dec!(150.0));
        assert_eq!(quote.open, dec!(150.0));
    }

    #[test]
    fn test_non_finite_price_is_error() {
        let response = QuoteResponse {
            c: Some(f64::NAN),
            h: None,
            l: None,
            o: None,
        };
        let err = response.into_provider_quote("AAPL").unwrap_err();
        assert!(matches!(err, MarketDataError::MissingPrice { .. }));
    }
}
