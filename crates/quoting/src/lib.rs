//! Quote acquisition and the swap router pipeline
//!
//! Fans quote requests out over a bounded task set, optionally caches
//! ladders, and wires route generation, quoting, and split selection
//! together behind [`SwapRouter`].

pub mod cache;
pub mod fetch;
pub mod pipeline;
pub mod provider;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use cache::{CachingQuoteProvider, TtlCache};
pub use fetch::{fetch_quote_matrix, QuoteFailure, QuoteMatrix};
pub use pipeline::{RouteRequest, SwapRouter};
pub use provider::QuoteProvider;
