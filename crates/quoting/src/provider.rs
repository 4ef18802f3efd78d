//! Quote provider contract
//!
//! A provider prices one route at every amount of the ladder in a single
//! call. Each slot may fail on its own (`None`); an `Err` fails the whole
//! ladder for that route.

use std::future::Future;
use std::sync::Arc;

use router_core::{Amount, TradeType};
use routing::{Route, SliceQuote};

/// Source of per-route quote ladders (on-chain quoter, simulator, ...)
pub trait QuoteProvider: Send + Sync + 'static {
    /// Quote `route` at each of `amounts`.
    ///
    /// Exact input: output received for each input amount. Exact output:
    /// input required for each output amount. The returned ladder must have
    /// one slot per amount.
    fn quote_route(
        &self,
        route: &Route,
        amounts: &[Amount],
        trade_type: TradeType,
    ) -> impl Future<Output = anyhow::Result<Vec<Option<SliceQuote>>>> + Send;
}

impl<P: QuoteProvider> QuoteProvider for Arc<P> {
    fn quote_route(
        &self,
        route: &Route,
        amounts: &[Amount],
        trade_type: TradeType,
    ) -> impl Future<Output = anyhow::Result<Vec<Option<SliceQuote>>>> + Send {
        P::quote_route(self, route, amounts, trade_type)
    }
}
