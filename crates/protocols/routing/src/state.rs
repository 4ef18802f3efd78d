//! Routing State Types
//!
//! Data structures for pools, routes, quoted slices, and the final swap route.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use router_core::{
    Amount, ChainId, GasUnits, Protocol, RoutingError, SignedAmount, Token, TokenAddress,
    TradeType,
};
use serde::{Deserialize, Serialize};

/// Liquidity snapshot of a pool. The variant fixes the pool's protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "protocol")]
pub enum LiquidityState {
    /// Constant-product pair
    V2 { reserve0: Amount, reserve1: Amount },
    /// Concentrated-liquidity pool
    V3 {
        /// Fee in hundredths of a bip (500 = 0.05%)
        fee_tier: u32,
        liquidity: Amount,
        sqrt_price_x96: Amount,
        tick: i32,
    },
}

/// AMM pool snapshot: one undirected edge of the pool graph. Its two sides
/// are always distinct tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawPool")]
pub struct Pool {
    /// Pool (or pair) contract address
    pool_id: String,
    token0: Token,
    token1: Token,
    liquidity: LiquidityState,
}

#[derive(Deserialize)]
struct RawPool {
    pool_id: String,
    token0: Token,
    token1: Token,
    liquidity: LiquidityState,
}

impl TryFrom<RawPool> for Pool {
    type Error = RoutingError;

    fn try_from(raw: RawPool) -> Result<Self, Self::Error> {
        Self::new(raw.pool_id, raw.token0, raw.token1, raw.liquidity)
    }
}

impl Pool {
    /// Build a V2 pair
    pub fn new_v2(
        pool_id: impl Into<String>,
        token0: Token,
        token1: Token,
        reserve0: Amount,
        reserve1: Amount,
    ) -> Result<Self, RoutingError> {
        Self::new(
            pool_id.into(),
            token0,
            token1,
            LiquidityState::V2 { reserve0, reserve1 },
        )
    }

    /// Build a V3 pool
    pub fn new_v3(
        pool_id: impl Into<String>,
        token0: Token,
        token1: Token,
        fee_tier: u32,
        liquidity: Amount,
    ) -> Result<Self, RoutingError> {
        Self::new(
            pool_id.into(),
            token0,
            token1,
            LiquidityState::V3 {
                fee_tier,
                liquidity,
                sqrt_price_x96: 0,
                tick: 0,
            },
        )
    }

    pub fn new(
        pool_id: String,
        token0: Token,
        token1: Token,
        liquidity: LiquidityState,
    ) -> Result<Self, RoutingError> {
        if token0 == token1 {
            return Err(RoutingError::InvalidPool {
                pool_id,
                reason: format!("both sides are {}", token0.address),
            });
        }
        Ok(Self {
            pool_id,
            token0,
            token1,
            liquidity,
        })
    }

    pub fn pool_id(&self) -> &str {
        &self.pool_id
    }

    pub fn token0(&self) -> &Token {
        &self.token0
    }

    pub fn token1(&self) -> &Token {
        &self.token1
    }

    pub fn liquidity(&self) -> &LiquidityState {
        &self.liquidity
    }

    /// Pool protocol, never `Mixed`
    pub fn protocol(&self) -> Protocol {
        match self.liquidity {
            LiquidityState::V2 { .. } => Protocol::V2,
            LiquidityState::V3 { .. } => Protocol::V3,
        }
    }

    /// Fee tier, present only for V3 pools
    pub fn fee_tier(&self) -> Option<u32> {
        match self.liquidity {
            LiquidityState::V2 { .. } => None,
            LiquidityState::V3 { fee_tier, .. } => Some(fee_tier),
        }
    }

    pub fn involves_token(&self, token: &TokenAddress) -> bool {
        &self.token0.address == token || &self.token1.address == token
    }

    /// The opposite side of `token`, or `None` if the pool does not hold it
    pub fn other_token(&self, token: &TokenAddress) -> Option<&Token> {
        if &self.token0.address == token {
            Some(&self.token1)
        } else if &self.token1.address == token {
            Some(&self.token0)
        } else {
            None
        }
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fee_tier() {
            Some(fee) => write!(
                f,
                "V3 {}/{} {:.2}%",
                self.token0.label(),
                self.token1.label(),
                fee as f64 / 10_000.0
            ),
            None => write!(f, "V2 {}/{}", self.token0.label(), self.token1.label()),
        }
    }
}

/// Ordered pools from `token_in` to `token_out`, plus the token path they walk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePath {
    pub pools: Vec<Pool>,
    /// `pools.len() + 1` tokens, starting at `token_in` and ending at `token_out`
    pub path: Vec<Token>,
}

impl RoutePath {
    pub fn token_in(&self) -> &Token {
        &self.path[0]
    }

    pub fn token_out(&self) -> &Token {
        &self.path[self.path.len() - 1]
    }
}

/// A candidate route, tagged by the protocols of its pools
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "protocol", content = "route")]
pub enum Route {
    V2(RoutePath),
    V3(RoutePath),
    Mixed(RoutePath),
}

impl Route {
    /// Build a route, checking that consecutive pools connect, that no token
    /// repeats, and that the pools reach `token_out`. The protocol tag is
    /// derived from pool membership.
    pub fn new(pools: Vec<Pool>, token_in: &Token, token_out: &Token) -> Result<Self, RoutingError> {
        let route_id = pools
            .iter()
            .map(|p| p.pool_id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let invalid = |reason: String| RoutingError::InvalidPool {
            pool_id: route_id.clone(),
            reason,
        };

        if pools.is_empty() {
            return Err(invalid("route has no pools".to_string()));
        }

        let mut path = Vec::with_capacity(pools.len() + 1);
        let mut visited: HashSet<&TokenAddress> = HashSet::new();
        path.push(token_in.clone());
        visited.insert(&token_in.address);

        let mut current = token_in;
        for pool in &pools {
            let next = pool.other_token(&current.address).ok_or_else(|| {
                invalid(format!("pool {} does not hold {}", pool.pool_id, current))
            })?;
            if !visited.insert(&next.address) {
                return Err(invalid(format!("token {} visited twice", next)));
            }
            path.push(next.clone());
            current = next;
        }

        if current != token_out {
            return Err(invalid(format!("route ends at {}, not {}", current, token_out)));
        }

        let all_v2 = pools.iter().all(|p| p.protocol() == Protocol::V2);
        let all_v3 = pools.iter().all(|p| p.protocol() == Protocol::V3);
        let inner = RoutePath { pools, path };

        Ok(if all_v2 {
            Route::V2(inner)
        } else if all_v3 {
            Route::V3(inner)
        } else {
            Route::Mixed(inner)
        })
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            Route::V2(_) => Protocol::V2,
            Route::V3(_) => Protocol::V3,
            Route::Mixed(_) => Protocol::Mixed,
        }
    }

    pub fn inner(&self) -> &RoutePath {
        match self {
            Route::V2(r) | Route::V3(r) | Route::Mixed(r) => r,
        }
    }

    pub fn pools(&self) -> &[Pool] {
        &self.inner().pools
    }

    /// Tokens along the route, endpoints included
    pub fn token_path(&self) -> &[Token] {
        &self.inner().path
    }

    pub fn token_in(&self) -> &Token {
        self.inner().token_in()
    }

    pub fn token_out(&self) -> &Token {
        self.inner().token_out()
    }

    /// Number of pools traversed
    pub fn hops(&self) -> usize {
        self.pools().len()
    }

    /// Fewest hops a route with this tag may have
    pub fn min_hops(&self) -> usize {
        match self {
            Route::V2(_) | Route::V3(_) => 1,
            Route::Mixed(_) => 2,
        }
    }

    /// Identity of the ordered pool sequence
    pub fn key(&self) -> String {
        self.pools()
            .iter()
            .map(|p| p.pool_id.as_str())
            .collect::<Vec<_>>()
            .join(">")
    }

    pub fn shares_pool_with(&self, other: &Route) -> bool {
        self.pools()
            .iter()
            .any(|a| other.pools().iter().any(|b| a.pool_id == b.pool_id))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.inner();
        write!(f, "[{}] {}", self.protocol(), r.token_in())?;
        for (pool, token) in r.pools.iter().zip(r.path.iter().skip(1)) {
            match pool.fee_tier() {
                Some(fee) => write!(f, " -- {:.2}% --> {}", fee as f64 / 10_000.0, token)?,
                None => write!(f, " -- V2 --> {}", token)?,
            }
        }
        Ok(())
    }
}

/// One quoted slice as returned by the quoting layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceQuote {
    /// Output amount (exact input) or required input amount (exact output)
    pub amount_quoted: Amount,
    /// Initialized ticks crossed per hop, V3 hops only
    #[serde(default)]
    pub initialized_ticks_crossed: Vec<u32>,
    /// Gas reported by the quoter, if any. Used only when above the heuristic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_estimate: Option<GasUnits>,
}

impl SliceQuote {
    pub fn new(amount_quoted: Amount) -> Self {
        Self {
            amount_quoted,
            initialized_ticks_crossed: Vec::new(),
            gas_estimate: None,
        }
    }
}

/// Execution cost of a slice in every reported denomination
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasCost {
    pub gas_estimate: GasUnits,
    /// Cost in the chain's native currency (wei)
    pub native: Amount,
    /// Cost in the quote token
    pub quote_token: Amount,
    pub usd: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_token: Option<Amount>,
}

/// A route quoted at one percent bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteWithQuote {
    pub route: Arc<Route>,
    pub percent: u8,
    /// Slice of the trade amount this quote is for
    pub amount: Amount,
    pub raw_quote: Amount,
    /// `raw_quote - gas` for exact input, `raw_quote + gas` for exact output
    pub quote_adjusted_for_gas: SignedAmount,
    pub gas_cost: GasCost,
    pub trade_type: TradeType,
}

impl RouteWithQuote {
    pub fn new(
        route: Arc<Route>,
        percent: u8,
        amount: Amount,
        raw_quote: Amount,
        gas_cost: GasCost,
        trade_type: TradeType,
    ) -> Self {
        let quote_adjusted_for_gas =
            crate::calculator::adjust_for_gas(raw_quote, gas_cost.quote_token, trade_type);
        Self {
            route,
            percent,
            amount,
            raw_quote,
            quote_adjusted_for_gas,
            gas_cost,
            trade_type,
        }
    }

    pub fn hops(&self) -> usize {
        self.route.hops()
    }
}

impl fmt::Display for RouteWithQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}% = {} (adj {}, gas {})",
            self.percent, self.route, self.quote_adjusted_for_gas, self.gas_cost.gas_estimate
        )
    }
}

/// The selected execution plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRoute {
    pub chain_id: ChainId,
    pub trade_type: TradeType,
    /// Total amount being traded
    pub amount: Amount,
    /// Sum of raw slice quotes
    pub quote: Amount,
    pub quote_gas_adjusted: SignedAmount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_gas_and_portion_adjusted: Option<SignedAmount>,
    pub estimated_gas_used: GasUnits,
    pub estimated_gas_used_native: Amount,
    pub estimated_gas_used_quote_token: Amount,
    pub estimated_gas_used_usd: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_gas_used_gas_token: Option<Amount>,
    /// Selected slices, largest percent first
    pub route: Vec<RouteWithQuote>,
    /// Portion taken, in output-token units
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portion_amount: Option<Amount>,
}

impl SwapRoute {
    pub fn split_count(&self) -> usize {
        self.route.len()
    }

    pub fn total_percent(&self) -> u32 {
        self.route.iter().map(|r| r.percent as u32).sum()
    }
}
