//! Quote Fan-out
//!
//! Materialises the route x percent quote matrix. One task per route runs on
//! a `JoinSet`, at most `max_concurrency` at a time, each under its own
//! deadline. Failures are recorded per route or per slice and never fail the
//! whole request.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use router_core::{Amount, QuoteError, QuoteFetchConfig, RoutingError, TradeType};
use routing::{Route, SliceQuote};

use crate::provider::QuoteProvider;

/// A route or slice that produced no usable quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteFailure {
    pub route_index: usize,
    /// `None` when the whole ladder was lost
    pub percent_index: Option<usize>,
    /// Stable failure code (`timeout`, `provider`, `zero_quote`, ...)
    pub code: String,
    pub message: String,
}

impl QuoteFailure {
    fn route(route_index: usize, error: &QuoteError) -> Self {
        Self {
            route_index,
            percent_index: None,
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }

    fn slice(route_index: usize, percent_index: usize, code: &str, message: String) -> Self {
        Self {
            route_index,
            percent_index: Some(percent_index),
            code: code.to_string(),
            message,
        }
    }
}

/// Quotes that came back, ordered by route index then percent index
#[derive(Debug, Clone, Default)]
pub struct QuoteMatrix {
    pub slices: Vec<(usize, usize, SliceQuote)>,
    pub failures: Vec<QuoteFailure>,
}

impl QuoteMatrix {
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn get(&self, route_index: usize, percent_index: usize) -> Option<&SliceQuote> {
        self.slices
            .binary_search_by(|(r, p, _)| (*r, *p).cmp(&(route_index, percent_index)))
            .ok()
            .map(|i| &self.slices[i].2)
    }
}

type LadderResult = Result<Vec<Option<SliceQuote>>, QuoteError>;

/// Quote every route at every amount of the ladder.
///
/// `percents[i]` and `amounts[i]` describe the same bucket. Dropping the
/// returned future aborts every task still in flight.
pub async fn fetch_quote_matrix<P: QuoteProvider>(
    provider: Arc<P>,
    routes: &[Arc<Route>],
    percents: &[u8],
    amounts: &[Amount],
    trade_type: TradeType,
    config: &QuoteFetchConfig,
) -> Result<QuoteMatrix, RoutingError> {
    if percents.len() != amounts.len() {
        return Err(RoutingError::InvalidAmount {
            message: format!(
                "{} percents but {} amounts in the distribution",
                percents.len(),
                amounts.len()
            ),
        });
    }

    let semaphore = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
    let amounts_shared: Arc<Vec<Amount>> = Arc::new(amounts.to_vec());
    let deadline = config.request_timeout();
    let millis = config.request_timeout_ms;

    let mut tasks: JoinSet<(usize, LadderResult)> = JoinSet::new();
    for (index, route) in routes.iter().enumerate() {
        let provider = Arc::clone(&provider);
        let route = Arc::clone(route);
        let amounts = Arc::clone(&amounts_shared);
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    let closed = QuoteError::TaskAborted {
                        message: "quote semaphore closed".to_string(),
                    };
                    return (index, Err(closed));
                }
            };

            let quoting = AssertUnwindSafe(provider.quote_route(&route, &amounts, trade_type)).catch_unwind();
            let result = match tokio::time::timeout(deadline, quoting).await {
                Ok(Ok(Ok(ladder))) => Ok(ladder),
                Ok(Ok(Err(e))) => Err(QuoteError::Provider(e)),
                Ok(Err(_)) => Err(QuoteError::TaskAborted {
                    message: format!("provider panicked quoting {}", route.key()),
                }),
                Err(_) => Err(QuoteError::Timeout { millis }),
            };
            (index, result)
        });
    }

    let mut ladders: Vec<Option<LadderResult>> = (0..routes.len()).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => ladders[index] = Some(result),
            Err(e) => tracing::warn!("Quote task did not complete: {}", e),
        }
    }

    let mut matrix = QuoteMatrix::default();
    for (route_index, ladder) in ladders.into_iter().enumerate() {
        let route = &routes[route_index];
        let ladder = match ladder {
            Some(Ok(ladder)) => ladder,
            Some(Err(e)) => {
                tracing::warn!("Quoting {} failed: {}", route, e);
                matrix.failures.push(QuoteFailure::route(route_index, &e));
                continue;
            }
            None => {
                let e = QuoteError::TaskAborted {
                    message: format!("no result for {}", route.key()),
                };
                tracing::warn!("{}", e);
                matrix.failures.push(QuoteFailure::route(route_index, &e));
                continue;
            }
        };

        if ladder.len() > percents.len() {
            let e = QuoteError::InconsistentLadder {
                route: route.key(),
                got: ladder.len(),
                expected: percents.len(),
            };
            tracing::warn!("{}", e);
            matrix.failures.push(QuoteFailure::route(route_index, &e));
            continue;
        }
        if ladder.len() < percents.len() {
            let e = QuoteError::InconsistentLadder {
                route: route.key(),
                got: ladder.len(),
                expected: percents.len(),
            };
            tracing::warn!("{}; trailing slices treated as missing", e);
            matrix.failures.push(QuoteFailure::route(route_index, &e));
        }

        for (percent_index, slot) in ladder.into_iter().enumerate() {
            match slot {
                Some(quote) if quote.amount_quoted == 0 => {
                    tracing::warn!("Zero quote for {}% of {}", percents[percent_index], route);
                    matrix.failures.push(QuoteFailure::slice(
                        route_index,
                        percent_index,
                        "zero_quote",
                        format!("{} quoted zero at {}%", route.key(), percents[percent_index]),
                    ));
                }
                Some(quote) => matrix.slices.push((route_index, percent_index, quote)),
                None => {
                    tracing::warn!("Missing quote for {}% of {}", percents[percent_index], route);
                    matrix.failures.push(QuoteFailure::slice(
                        route_index,
                        percent_index,
                        "missing",
                        format!("{} has no quote at {}%", route.key(), percents[percent_index]),
                    ));
                }
            }
        }
    }

    tracing::debug!(
        "Quote matrix: {} slices over {} routes, {} failures",
        matrix.slices.len(),
        routes.len(),
        matrix.failures.len()
    );

    Ok(matrix)
}
