//! Swap Router Pipeline
//!
//! Generate routes, quote them at every percent bucket, price gas, and pick
//! the best split.

use std::sync::Arc;

use tracing::Instrument;

use router_core::{Amount, ChainId, QuoteFetchConfig, RoutingConfig, RoutingError, Token, TradeType};
use routing::{
    amount_distribution, compute_all_routes, select_best_swap_route, GasModel, Pool, PortionProvider, Route,
    RouteWithQuote, SwapRoute,
};

use crate::fetch::fetch_quote_matrix;
use crate::provider::QuoteProvider;

/// Everything one routing request needs besides the router's own config
pub struct RouteRequest<'a> {
    pub token_in: Token,
    pub token_out: Token,
    /// Input amount (exact input) or output amount (exact output)
    pub amount: Amount,
    pub trade_type: TradeType,
    pub chain_id: ChainId,
    /// Pool snapshot to route through
    pub pools: &'a [Pool],
    pub gas_model: &'a dyn GasModel,
    pub portion: &'a dyn PortionProvider,
}

/// End-to-end router over one quote provider
pub struct SwapRouter<P> {
    provider: Arc<P>,
    routing: RoutingConfig,
    fetch: QuoteFetchConfig,
}

impl<P: QuoteProvider> SwapRouter<P> {
    pub fn new(provider: P, routing: RoutingConfig, fetch: QuoteFetchConfig) -> Self {
        Self {
            provider: Arc::new(provider),
            routing,
            fetch,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn routing_config(&self) -> &RoutingConfig {
        &self.routing
    }

    /// Best swap route for `request`, or `None` when no route or no valid
    /// split exists.
    pub async fn route(&self, request: RouteRequest<'_>) -> Result<Option<SwapRoute>, RoutingError> {
        let span = tracing::info_span!(
            "route",
            chain_id = %request.chain_id,
            trade_type = %request.trade_type
        );
        self.route_inner(request).instrument(span).await
    }

    async fn route_inner(&self, request: RouteRequest<'_>) -> Result<Option<SwapRoute>, RoutingError> {
        let RouteRequest {
            token_in,
            token_out,
            amount,
            trade_type,
            chain_id,
            pools,
            gas_model,
            portion,
        } = request;

        self.routing.validate()?;
        self.routing.validate_protocols(trade_type)?;
        if amount == 0 {
            return Err(RoutingError::InvalidAmount {
                message: "cannot route a zero amount".to_string(),
            });
        }

        let routes: Vec<Arc<Route>> = compute_all_routes(
            &token_in,
            &token_out,
            pools,
            self.routing.max_hops,
            &self.routing.protocols,
        )
        .into_iter()
        .map(Arc::new)
        .collect();

        if routes.is_empty() {
            tracing::debug!("No route found {} -> {}", token_in, token_out);
            return Ok(None);
        }

        let (percents, amounts) = amount_distribution(amount, self.routing.distribution_percent);
        let matrix = fetch_quote_matrix(
            Arc::clone(&self.provider),
            &routes,
            &percents,
            &amounts,
            trade_type,
            &self.fetch,
        )
        .await?;

        let route_with_quotes: Vec<RouteWithQuote> = matrix
            .slices
            .into_iter()
            .map(|(r, p, quote)| {
                let gas = gas_model.estimate_gas_cost(&routes[r], &quote);
                RouteWithQuote::new(
                    Arc::clone(&routes[r]),
                    percents[p],
                    amounts[p],
                    quote.amount_quoted,
                    gas,
                    trade_type,
                )
            })
            .collect();

        tracing::debug!(
            "Selecting over {} quoted slices from {} routes ({} quote failures)",
            route_with_quotes.len(),
            routes.len(),
            matrix.failures.len()
        );

        let best = select_best_swap_route(
            amount,
            &percents,
            &route_with_quotes,
            trade_type,
            chain_id,
            &self.routing,
            portion,
        )?;

        match &best {
            Some(swap) => tracing::info!(
                "Routed {} {} -> {}: quote {} (gas adjusted {}) over {} route(s)",
                amount,
                token_in,
                token_out,
                swap.quote,
                swap.quote_gas_adjusted,
                swap.split_count()
            ),
            None => tracing::debug!("No valid split for {} {} -> {}", amount, token_in, token_out),
        }

        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use router_core::Protocol;
    use routing::{ExchangeRate, FixedPortion, HeuristicGasModel, NoPortion};

    use crate::cache::CachingQuoteProvider;
    use crate::test_support::{token, v2_pool, v3_pool, MockProvider, Script};

    fn routing_config(distribution_percent: u8) -> RoutingConfig {
        RoutingConfig {
            distribution_percent,
            ..Default::default()
        }
    }

    fn free_gas() -> HeuristicGasModel {
        HeuristicGasModel::new(0, ExchangeRate::identity(), ExchangeRate::identity())
    }

    #[tokio::test]
    async fn test_routes_two_way_split() {
        router_core::telemetry::init_tracing("quoting=debug");

        let (a, b) = (token(1), token(2));
        let pools = vec![v3_pool("p1", &a, &b), v3_pool("p2", &a, &b), v3_pool("p3", &a, &b)];
        let provider = MockProvider::new()
            .with("p1", Script::Ladder(vec![Some(10), Some(20), Some(30), Some(38)]))
            .with("p2", Script::Ladder(vec![Some(14), Some(21), Some(27), Some(32)]))
            .with("p3", Script::Ladder(vec![Some(5), Some(10), Some(15), Some(20)]));
        let router = SwapRouter::new(provider, routing_config(25), QuoteFetchConfig::default());
        let gas = free_gas();

        let swap = router
            .route(RouteRequest {
                token_in: a.clone(),
                token_out: b.clone(),
                amount: 1_000,
                trade_type: TradeType::ExactInput,
                chain_id: ChainId::MAINNET,
                pools: &pools,
                gas_model: &gas,
                portion: &NoPortion,
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(swap.quote, 44);
        assert_eq!(swap.total_percent(), 100);
        assert_eq!(swap.route[0].route.key(), "p1");
        assert_eq!(swap.route[0].amount, 750);
        assert_eq!(swap.route[1].route.key(), "p2");
        assert_eq!(swap.route[1].amount, 250);
        assert_eq!(router.provider().call_count(), 3);
    }

    #[tokio::test]
    async fn test_gas_steers_to_direct_route() {
        let (a, b, c) = (token(1), token(2), token(3));
        let pools = vec![v3_pool("ab", &a, &b), v3_pool("ac", &a, &c), v3_pool("cb", &c, &b)];
        // two-hop route quotes 1% better before gas
        let provider = MockProvider::new()
            .with("ab", Script::Ladder(vec![Some(1_000_000)]))
            .with("ac>cb", Script::Ladder(vec![Some(1_010_000)]));
        let config = RoutingConfig {
            max_splits: 1,
            ..routing_config(100)
        };
        let router = SwapRouter::new(provider, config, QuoteFetchConfig::default());
        // 1 wei of quote token per gas unit: the extra hop costs 80_000
        let gas = HeuristicGasModel::new(1, ExchangeRate::identity(), ExchangeRate::identity());

        let swap = router
            .route(RouteRequest {
                token_in: a.clone(),
                token_out: b.clone(),
                amount: 5_000,
                trade_type: TradeType::ExactInput,
                chain_id: ChainId::MAINNET,
                pools: &pools,
                gas_model: &gas,
                portion: &NoPortion,
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(swap.route[0].route.key(), "ab");
        assert_eq!(swap.estimated_gas_used, 82_000);
        assert_eq!(swap.quote_gas_adjusted, 1_000_000 - 82_000);
    }

    #[tokio::test]
    async fn test_no_route_is_none() {
        let (a, b, c) = (token(1), token(2), token(3));
        let pools = vec![v3_pool("ac", &a, &c)];
        let router = SwapRouter::new(MockProvider::new(), routing_config(25), QuoteFetchConfig::default());
        let gas = free_gas();

        let result = router
            .route(RouteRequest {
                token_in: a,
                token_out: b,
                amount: 1_000,
                trade_type: TradeType::ExactInput,
                chain_id: ChainId::MAINNET,
                pools: &pools,
                gas_model: &gas,
                portion: &NoPortion,
            })
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(router.provider().call_count(), 0);
    }

    #[tokio::test]
    async fn test_all_quotes_failing_is_none() {
        let (a, b) = (token(1), token(2));
        let pools = vec![v3_pool("p1", &a, &b)];
        let provider = MockProvider::new().with("p1", Script::Fail("execution reverted"));
        let router = SwapRouter::new(provider, routing_config(25), QuoteFetchConfig::default());
        let gas = free_gas();

        let result = router
            .route(RouteRequest {
                token_in: a,
                token_out: b,
                amount: 1_000,
                trade_type: TradeType::ExactInput,
                chain_id: ChainId::MAINNET,
                pools: &pools,
                gas_model: &gas,
                portion: &NoPortion,
            })
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_exact_output_with_v2_rejected() {
        let (a, b) = (token(1), token(2));
        let pools = vec![v2_pool("p1", &a, &b)];
        let router = SwapRouter::new(MockProvider::new(), routing_config(25), QuoteFetchConfig::default());
        let gas = free_gas();

        let err = router
            .route(RouteRequest {
                token_in: a,
                token_out: b,
                amount: 1_000,
                trade_type: TradeType::ExactOutput,
                chain_id: ChainId::MAINNET,
                pools: &pools,
                gas_model: &gas,
                portion: &NoPortion,
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "incompatible_protocol_set");
        assert_eq!(router.provider().call_count(), 0);
    }

    #[tokio::test]
    async fn test_exact_output_over_v3() {
        let (a, b) = (token(1), token(2));
        let pools = vec![v3_pool("p1", &a, &b), v2_pool("v2", &a, &b)];
        let provider = MockProvider::new().with("p1", Script::Ladder(vec![Some(520), Some(1_050)]));
        let config = RoutingConfig {
            protocols: vec![Protocol::V3],
            ..routing_config(50)
        };
        let router = SwapRouter::new(provider, config, QuoteFetchConfig::default());
        let gas = free_gas();
        let portion = FixedPortion::new(100).unwrap();

        let swap = router
            .route(RouteRequest {
                token_in: a,
                token_out: b,
                amount: 1_000,
                trade_type: TradeType::ExactOutput,
                chain_id: ChainId::MAINNET,
                pools: &pools,
                gas_model: &gas,
                portion: &portion,
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(swap.quote, 1_050);
        assert_eq!(swap.trade_type, TradeType::ExactOutput);
        assert_eq!(swap.portion_amount, Some(10));
        assert_eq!(swap.quote_gas_and_portion_adjusted, Some(1_060));
    }

    #[tokio::test]
    async fn test_invalid_requests_rejected() {
        let (a, b) = (token(1), token(2));
        let pools = vec![v3_pool("p1", &a, &b)];
        let gas = free_gas();

        let bad_config = RoutingConfig {
            protocols: vec![Protocol::V2, Protocol::V3],
            ..routing_config(25)
        };
        let router = SwapRouter::new(MockProvider::new(), bad_config, QuoteFetchConfig::default());
        let err = router
            .route(RouteRequest {
                token_in: a.clone(),
                token_out: b.clone(),
                amount: 1_000,
                trade_type: TradeType::ExactInput,
                chain_id: ChainId::MAINNET,
                pools: &pools,
                gas_model: &gas,
                portion: &NoPortion,
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "incompatible_protocol_set");

        let router = SwapRouter::new(MockProvider::new(), routing_config(30), QuoteFetchConfig::default());
        let err = router
            .route(RouteRequest {
                token_in: a.clone(),
                token_out: b.clone(),
                amount: 1_000,
                trade_type: TradeType::ExactInput,
                chain_id: ChainId::MAINNET,
                pools: &pools,
                gas_model: &gas,
                portion: &NoPortion,
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "invalid_config");

        let router = SwapRouter::new(MockProvider::new(), routing_config(25), QuoteFetchConfig::default());
        let err = router
            .route(RouteRequest {
                token_in: a,
                token_out: b,
                amount: 0,
                trade_type: TradeType::ExactInput,
                chain_id: ChainId::MAINNET,
                pools: &pools,
                gas_model: &gas,
                portion: &NoPortion,
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "invalid_amount");
    }

    #[tokio::test]
    async fn test_cached_provider_serves_repeat_request() {
        let (a, b) = (token(1), token(2));
        let pools = vec![v3_pool("p1", &a, &b), v3_pool("p2", &a, &b)];
        let mock = Arc::new(MockProvider::new().with_fallback(Script::Curve {
            rate_bps: 9_970,
            depth: 10_000,
        }));
        let provider = CachingQuoteProvider::new(Arc::clone(&mock), &Default::default());
        let router = SwapRouter::new(provider, routing_config(25), QuoteFetchConfig::default());
        let gas = free_gas();

        let mut results = Vec::new();
        for _ in 0..2 {
            let swap = router
                .route(RouteRequest {
                    token_in: a.clone(),
                    token_out: b.clone(),
                    amount: 10_000,
                    trade_type: TradeType::ExactInput,
                    chain_id: ChainId::MAINNET,
                    pools: &pools,
                    gas_model: &gas,
                    portion: &NoPortion,
                })
                .await
                .unwrap()
                .unwrap();
            results.push(swap.quote_gas_adjusted);
        }

        assert_eq!(results[0], results[1]);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_swap_route_serializes() {
        let (a, b) = (token(1), token(2));
        let pools = vec![v3_pool("p1", &a, &b)];
        let provider = MockProvider::new().with("p1", Script::Ladder(vec![Some(990)]));
        let router = SwapRouter::new(provider, routing_config(100), QuoteFetchConfig::default());
        let gas = free_gas();

        let swap = router
            .route(RouteRequest {
                token_in: a,
                token_out: b,
                amount: 1_000,
                trade_type: TradeType::ExactInput,
                chain_id: ChainId::MAINNET,
                pools: &pools,
                gas_model: &gas,
                portion: &NoPortion,
            })
            .await
            .unwrap()
            .unwrap();

        let json = serde_json::to_value(&swap).unwrap();
        assert_eq!(json["trade_type"], "EXACT_INPUT");
        assert_eq!(json["quote"], 990);
        assert_eq!(json["route"][0]["percent"], 100);
        assert_eq!(json["route"][0]["route"]["protocol"], "V3");
    }
}
