//! Route Generator
//!
//! Enumerates simple paths through the pool graph for one protocol family.
//! A path never revisits a token, which rules out arbitrage detours such as
//! USDC -> DAI (0.05%) -> USDC (0.3%) -> WETH.

use std::collections::{HashMap, HashSet};

use router_core::{Protocol, Token, TokenAddress};

use crate::state::{Pool, Route};

// ---------------------------------------------------------------------------
// Pool Graph
// ---------------------------------------------------------------------------

/// An edge in the pool graph: a pool, seen from one of its tokens.
#[derive(Debug, Clone, Copy)]
pub struct PoolEdge {
    /// Index into [`PoolGraph::pools`]
    pub pool: usize,
}

/// Adjacency-list pool graph restricted to one protocol family.
#[derive(Debug, Clone)]
pub struct PoolGraph<'a> {
    pub pools: Vec<&'a Pool>,
    pub adjacency: HashMap<&'a TokenAddress, Vec<PoolEdge>>,
}

impl<'a> PoolGraph<'a> {
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }
}

/// Build a pool graph from the pools a family may use.
///
/// V2 and V3 families keep only their own pools; Mixed keeps both. Pools
/// repeated under the same `pool_id` are added once. Edge order follows
/// input order, which makes path enumeration reproducible.
pub fn build_pool_graph(pools: &[Pool], protocol: Protocol) -> PoolGraph<'_> {
    let mut graph = PoolGraph {
        pools: Vec::with_capacity(pools.len()),
        adjacency: HashMap::new(),
    };
    let mut seen: HashSet<&str> = HashSet::new();

    for pool in pools {
        let usable = match protocol {
            Protocol::V2 | Protocol::V3 => pool.protocol() == protocol,
            Protocol::Mixed => true,
        };
        if !usable {
            tracing::trace!("Skipping {} pool {} for {} routes", pool.protocol(), pool.pool_id(), protocol);
            continue;
        }
        if !seen.insert(pool.pool_id()) {
            tracing::trace!("Skipping duplicate pool {}", pool.pool_id());
            continue;
        }

        let idx = graph.pools.len();
        graph.pools.push(pool);
        graph
            .adjacency
            .entry(&pool.token0().address)
            .or_default()
            .push(PoolEdge { pool: idx });
        graph
            .adjacency
            .entry(&pool.token1().address)
            .or_default()
            .push(PoolEdge { pool: idx });
    }

    graph
}

// ---------------------------------------------------------------------------
// Path Finding
// ---------------------------------------------------------------------------

struct Search<'g, 'a> {
    graph: &'g PoolGraph<'a>,
    target: &'a TokenAddress,
    max_hops: usize,
    path: Vec<usize>,
    visited: HashSet<&'a TokenAddress>,
    used: Vec<bool>,
    results: Vec<Vec<usize>>,
}

impl<'g, 'a> Search<'g, 'a> {
    fn walk(&mut self, current: &'a TokenAddress) {
        let graph = self.graph;
        let Some(edges) = graph.adjacency.get(current) else {
            return;
        };

        for edge in edges {
            if self.used[edge.pool] {
                continue;
            }
            let pool = graph.pools[edge.pool];
            let Some(next) = pool.other_token(current) else {
                continue;
            };
            let next = &next.address;

            if next == self.target {
                let mut complete = self.path.clone();
                complete.push(edge.pool);
                self.results.push(complete);
            } else if self.path.len() + 1 < self.max_hops && !self.visited.contains(next) {
                self.visited.insert(next);
                self.used[edge.pool] = true;
                self.path.push(edge.pool);

                self.walk(next);

                self.path.pop();
                self.used[edge.pool] = false;
                self.visited.remove(next);
            }
        }
    }
}

/// Find all acyclic pool sequences from `source` to `target` of at most
/// `max_hops` pools, depth first.
pub fn find_paths<'a>(
    graph: &PoolGraph<'a>,
    source: &'a TokenAddress,
    target: &'a TokenAddress,
    max_hops: usize,
) -> Vec<Vec<&'a Pool>> {
    if source == target || max_hops == 0 {
        return Vec::new();
    }

    let mut search = Search {
        graph,
        target,
        max_hops,
        path: Vec::new(),
        visited: HashSet::from([source]),
        used: vec![false; graph.pool_count()],
        results: Vec::new(),
    };
    search.walk(source);

    search
        .results
        .into_iter()
        .map(|path| path.into_iter().map(|i| graph.pools[i]).collect())
        .collect()
}

// ---------------------------------------------------------------------------
// Route Generation
// ---------------------------------------------------------------------------

/// Compute every route of one protocol family from `token_in` to `token_out`.
///
/// Returns an empty list when no path of at most `max_hops` pools exists.
/// Mixed generation drops single-hop paths and paths whose pools all share
/// one protocol; those belong to the V2 and V3 families.
pub fn compute_routes(
    token_in: &Token,
    token_out: &Token,
    pools: &[Pool],
    max_hops: usize,
    protocol: Protocol,
) -> Vec<Route> {
    let graph = build_pool_graph(pools, protocol);
    let paths = find_paths(&graph, &token_in.address, &token_out.address, max_hops);

    let mut seen: HashSet<Vec<&str>> = HashSet::new();
    let mut routes = Vec::with_capacity(paths.len());

    for path in paths {
        let key: Vec<&str> = path.iter().map(|p| p.pool_id()).collect();
        if !seen.insert(key) {
            continue;
        }

        let pools: Vec<Pool> = path.into_iter().cloned().collect();
        let route = match Route::new(pools, token_in, token_out) {
            Ok(route) => route,
            Err(e) => {
                tracing::warn!("Discarding malformed path: {}", e);
                continue;
            }
        };

        let keep = match (&route, protocol) {
            (Route::V2(_), Protocol::V2) | (Route::V3(_), Protocol::V3) => true,
            (Route::Mixed(_), Protocol::Mixed) => route.hops() >= route.min_hops(),
            _ => false,
        };
        if keep {
            routes.push(route);
        }
    }

    tracing::debug!(
        "Computed {} {} routes {} -> {} (max_hops={})",
        routes.len(),
        protocol,
        token_in,
        token_out,
        max_hops
    );

    routes
}

/// Compute routes for every requested family, in V2, V3, Mixed order.
pub fn compute_all_routes(
    token_in: &Token,
    token_out: &Token,
    pools: &[Pool],
    max_hops: usize,
    protocols: &[Protocol],
) -> Vec<Route> {
    Protocol::ALL
        .iter()
        .filter(|p| protocols.contains(p))
        .flat_map(|&p| compute_routes(token_in, token_out, pools, max_hops, p))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
