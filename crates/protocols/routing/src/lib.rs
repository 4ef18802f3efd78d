//! Swap Routing
//!
//! Enumerates candidate routes through V2, V3 and mixed pools, prices each
//! quoted slice for gas, and picks the best split of a trade across routes.

pub mod best_swap_route;
pub mod calculator;
pub mod constants;
pub mod gas_model;
pub mod portion;
pub mod router;
pub mod state;
pub mod swap_route;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use best_swap_route::select_best_swap_route;
pub use calculator::{adjust_for_gas, amount_distribution, mul_div, percent_ladder};
pub use constants::{fee_tiers, v2_gas, v3_gas};
pub use gas_model::{heuristic_gas_units, ExchangeRate, GasModel, HeuristicGasModel};
pub use portion::{FixedPortion, NoPortion, PortionProvider};
pub use router::{build_pool_graph, compute_all_routes, compute_routes, find_paths, PoolGraph};
pub use state::{
    GasCost, LiquidityState, Pool, Route, RoutePath, RouteWithQuote, SliceQuote, SwapRoute,
};
pub use swap_route::assemble_swap_route;
