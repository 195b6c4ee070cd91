//! Quote provider implementations.

mod http;
mod traits;

pub use http::HttpQuoteProvider;
pub use traits::QuoteProvider;
