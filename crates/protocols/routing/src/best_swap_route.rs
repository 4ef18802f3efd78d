//! Best-Swap-Route Selector
//!
//! Picks at most one quoted slice per route so that the percents add up to
//! exactly 100 and the gas-adjusted aggregate is best: highest output for
//! exact input, lowest input for exact output.
//!
//! The search is a depth-first branch-and-bound over routes ordered by value
//! density (best adjusted value per percent). Each state is bounded by a
//! table of the best value any `n` further picks can reach over exactly the
//! remaining percent, pool conflicts ignored. Branches are taken best bound
//! first and cut once their bound cannot beat the incumbent.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use num_bigint::BigInt;

use router_core::constants::FULL_PERCENT;
use router_core::{Amount, ChainId, Protocol, RoutingConfig, RoutingError, SignedAmount, TradeType};

use crate::portion::PortionProvider;
use crate::state::{Route, RouteWithQuote, SwapRoute};
use crate::swap_route::assemble_swap_route;

/// Slices of one route, ready for the search
struct RouteGroup<'q> {
    route: Arc<Route>,
    /// Sorted by utility, best first
    entries: Vec<Candidate<'q>>,
    /// Best `(utility, percent)` ratio over `entries`
    density: (SignedAmount, u32),
}

#[derive(Clone, Copy)]
struct Candidate<'q> {
    slice: &'q RouteWithQuote,
    percent: u32,
    /// Adjusted value in the maximisation direction
    utility: SignedAmount,
}

/// Select the best split of `amount` over the quoted slices.
///
/// Returns `Ok(None)` when no combination of available slices sums to 100%
/// within `[min_splits, max_splits]`. Slices whose percent is not in
/// `percents` are ignored; missing slices are simply unavailable.
pub fn select_best_swap_route(
    amount: Amount,
    percents: &[u8],
    route_with_quotes: &[RouteWithQuote],
    trade_type: TradeType,
    chain_id: ChainId,
    config: &RoutingConfig,
    portion_provider: &dyn PortionProvider,
) -> Result<Option<SwapRoute>, RoutingError> {
    config.validate()?;
    check_inputs(route_with_quotes, trade_type)?;

    let groups = group_by_route(percents, route_with_quotes, trade_type);
    if groups.is_empty() {
        tracing::debug!("No usable quotes for {} selection", trade_type);
        return Ok(None);
    }

    let conflicts = pool_conflicts(&groups, config.forbid_shared_pools);
    let bounds = SplitBounds::new(&groups, config.min_splits, config.max_splits);
    let mut search = SplitSearch {
        groups: &groups,
        conflicts: &conflicts,
        bounds: &bounds,
        min_splits: config.min_splits,
        chosen: Vec::with_capacity(config.max_splits),
        best: None,
        nodes: 0,
    };
    if bounds.best(0, 0, FULL_PERCENT as u32).is_some() {
        search.explore(0, FULL_PERCENT as u32, 0);
    }

    let nodes = search.nodes;
    let Some((score, picks)) = search.best else {
        tracing::debug!(
            "No split of {} routes sums to 100% within {}..={} splits ({} nodes)",
            groups.len(),
            config.min_splits,
            config.max_splits,
            nodes
        );
        return Ok(None);
    };

    tracing::debug!(
        "Best {} split: {} route(s), score {} ({} nodes over {} routes)",
        trade_type,
        picks.len(),
        score,
        nodes,
        groups.len()
    );

    let selected: Vec<RouteWithQuote> = picks
        .iter()
        .map(|&(g, e)| groups[g].entries[e].slice.clone())
        .collect();

    Ok(Some(assemble_swap_route(
        amount,
        selected,
        trade_type,
        chain_id,
        config.gas_token.is_some(),
        portion_provider,
    )))
}

/// Fail fast on inputs the selector must not silently drop
fn check_inputs(route_with_quotes: &[RouteWithQuote], trade_type: TradeType) -> Result<(), RoutingError> {
    if let Some(bad) = route_with_quotes.iter().find(|q| q.trade_type != trade_type) {
        return Err(RoutingError::TradeTypeMismatch {
            route: bad.route.key(),
            expected: trade_type,
            got: bad.trade_type,
        });
    }

    if trade_type == TradeType::ExactOutput {
        let offending: BTreeSet<Protocol> = route_with_quotes
            .iter()
            .map(|q| q.route.protocol())
            .filter(|p| matches!(p, Protocol::V2 | Protocol::Mixed))
            .collect();
        if !offending.is_empty() {
            return Err(RoutingError::IncompatibleProtocolSet {
                protocols: offending.into_iter().collect(),
                trade_type,
                reason: "exact output is only quoted over V3 routes".to_string(),
            });
        }
    }
    Ok(())
}

fn utility(slice: &RouteWithQuote, trade_type: TradeType) -> SignedAmount {
    match trade_type {
        TradeType::ExactInput => slice.quote_adjusted_for_gas,
        TradeType::ExactOutput => slice.quote_adjusted_for_gas.saturating_neg(),
    }
}

/// Group slices by route (first-seen order), keep the best slice per
/// percent, then order routes by density, best first.
fn group_by_route<'q>(
    percents: &[u8],
    route_with_quotes: &'q [RouteWithQuote],
    trade_type: TradeType,
) -> Vec<RouteGroup<'q>> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<RouteGroup<'q>> = Vec::new();

    for slice in route_with_quotes {
        if slice.percent == 0 || slice.percent > FULL_PERCENT || !percents.contains(&slice.percent) {
            tracing::trace!("Ignoring {}% slice of {}", slice.percent, slice.route);
            continue;
        }

        let key = slice.route.key();
        let g = *index.entry(key).or_insert_with(|| {
            groups.push(RouteGroup {
                route: Arc::clone(&slice.route),
                entries: Vec::new(),
                density: (0, 1),
            });
            groups.len() - 1
        });

        let candidate = Candidate {
            slice,
            percent: slice.percent as u32,
            utility: utility(slice, trade_type),
        };
        let entries = &mut groups[g].entries;
        match entries.iter_mut().find(|c| c.percent == candidate.percent) {
            Some(existing) if existing.utility >= candidate.utility => {}
            Some(existing) => *existing = candidate,
            None => entries.push(candidate),
        }
    }

    for group in &mut groups {
        group
            .entries
            .sort_by(|a, b| b.utility.cmp(&a.utility).then(a.percent.cmp(&b.percent)));
        group.density = group
            .entries
            .iter()
            .map(|c| (c.utility, c.percent))
            .max_by(|a, b| cmp_ratio(*a, *b))
            .unwrap_or((0, 1));
    }

    groups.sort_by(|a, b| cmp_ratio(b.density, a.density));
    groups
}

/// `conflicts[i][j]` is set when routes i and j may not appear together
fn pool_conflicts(groups: &[RouteGroup<'_>], forbid_shared_pools: bool) -> Vec<Vec<bool>> {
    let n = groups.len();
    let mut conflicts = vec![vec![false; n]; n];
    if !forbid_shared_pools {
        return conflicts;
    }
    for i in 0..n {
        for j in (i + 1)..n {
            if groups[i].route.shares_pool_with(&groups[j].route) {
                conflicts[i][j] = true;
                conflicts[j][i] = true;
            }
        }
    }
    conflicts
}

/// Compare `a.0 / a.1` with `b.0 / b.1` for positive denominators
fn cmp_ratio(a: (SignedAmount, u32), b: (SignedAmount, u32)) -> Ordering {
    let lhs = a.0.checked_mul(b.1 as SignedAmount);
    let rhs = b.0.checked_mul(a.1 as SignedAmount);
    match (lhs, rhs) {
        (Some(l), Some(r)) => l.cmp(&r),
        _ => (BigInt::from(a.0) * BigInt::from(b.1)).cmp(&(BigInt::from(b.0) * BigInt::from(a.1))),
    }
}

const PERCENT_SLOTS: usize = FULL_PERCENT as usize + 1;

/// Upper bounds on what the rest of a branch can add.
///
/// `exact[j][n][r]` is the best total utility of exactly `n` picks, one per
/// group, from groups `j..` covering exactly `r` percent. Pool conflicts are
/// ignored, so without them the bound is the optimum itself.
struct SplitBounds {
    exact: Vec<Option<SignedAmount>>,
    max_picks: usize,
    min_splits: usize,
    max_splits: usize,
}

impl SplitBounds {
    fn new(groups: &[RouteGroup<'_>], min_splits: usize, max_splits: usize) -> Self {
        let max_picks = max_splits.min(groups.len());
        let mut bounds = Self {
            exact: vec![None; (groups.len() + 1) * (max_picks + 1) * PERCENT_SLOTS],
            max_picks,
            min_splits,
            max_splits,
        };

        let end = bounds.index(groups.len(), 0, 0);
        bounds.exact[end] = Some(0);
        for j in (0..groups.len()).rev() {
            for n in 0..=max_picks {
                for r in 0..PERCENT_SLOTS {
                    let mut best = bounds.exact[bounds.index(j + 1, n, r)];
                    if n > 0 {
                        for candidate in &groups[j].entries {
                            let percent = candidate.percent as usize;
                            if percent > r {
                                continue;
                            }
                            if let Some(rest) = bounds.exact[bounds.index(j + 1, n - 1, r - percent)] {
                                let value = rest.saturating_add(candidate.utility);
                                best = Some(best.map_or(value, |b| b.max(value)));
                            }
                        }
                    }
                    let at = bounds.index(j, n, r);
                    bounds.exact[at] = best;
                }
            }
        }
        bounds
    }

    fn index(&self, group: usize, picks: usize, percent: usize) -> usize {
        (group * (self.max_picks + 1) + picks) * PERCENT_SLOTS + percent
    }

    /// Best value groups `next..` can add to a branch holding `count` picks
    /// with `remaining` percent left. `None` when no completion is valid.
    fn best(&self, next: usize, count: usize, remaining: u32) -> Option<SignedAmount> {
        let fewest = self.min_splits.saturating_sub(count);
        let most = self.max_splits.saturating_sub(count).min(self.max_picks);
        (fewest..=most)
            .filter_map(|picks| self.exact[self.index(next, picks, remaining as usize)])
            .max()
    }
}

struct SplitSearch<'s, 'q> {
    groups: &'s [RouteGroup<'q>],
    conflicts: &'s [Vec<bool>],
    bounds: &'s SplitBounds,
    min_splits: usize,
    /// `(group, entry)` picks on the current branch
    chosen: Vec<(usize, usize)>,
    best: Option<(SignedAmount, Vec<(usize, usize)>)>,
    nodes: u64,
}

impl<'s, 'q> SplitSearch<'s, 'q> {
    fn beats_incumbent(&self, ceiling: SignedAmount) -> bool {
        match &self.best {
            Some((score, _)) => ceiling > *score,
            None => true,
        }
    }

    fn explore(&mut self, next: usize, remaining: u32, current: SignedAmount) {
        self.nodes += 1;

        if remaining == 0 {
            if self.chosen.len() >= self.min_splits && self.beats_incumbent(current) {
                self.best = Some((current, self.chosen.clone()));
            }
            return;
        }
        if next >= self.groups.len() {
            return;
        }

        let count = self.chosen.len();
        let groups = self.groups;
        let group = &groups[next];

        // (ceiling, entry); `None` skips this route
        let mut branches: Vec<(SignedAmount, Option<usize>)> = Vec::with_capacity(group.entries.len() + 1);
        let blocked = self.chosen.iter().any(|&(g, _)| self.conflicts[g][next]);
        if !blocked {
            for (e, candidate) in group.entries.iter().enumerate() {
                if candidate.percent > remaining {
                    continue;
                }
                let rest = self.bounds.best(next + 1, count + 1, remaining - candidate.percent);
                if let Some(rest) = rest {
                    branches.push((current.saturating_add(candidate.utility).saturating_add(rest), Some(e)));
                }
            }
        }
        if let Some(rest) = self.bounds.best(next + 1, count, remaining) {
            branches.push((current.saturating_add(rest), None));
        }
        branches.sort_by(|a, b| b.0.cmp(&a.0));

        for (ceiling, pick) in branches {
            if !self.beats_incumbent(ceiling) {
                break;
            }
            match pick {
                Some(e) => {
                    let candidate = group.entries[e];
                    self.chosen.push((next, e));
                    self.explore(
                        next + 1,
                        remaining - candidate.percent,
                        current.saturating_add(candidate.utility),
                    );
                    self.chosen.pop();
                }
                None => self.explore(next + 1, remaining, current),
            }
        }
    }
}
