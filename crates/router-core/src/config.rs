//! Configuration types for the swap router

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::RoutingError;
use crate::types::{Protocol, TokenAddress, TradeType};

/// Route search and split selection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Fewest routes a split may use
    #[serde(default = "default_min_splits")]
    pub min_splits: usize,

    /// Most routes a split may use
    #[serde(default = "default_max_splits")]
    pub max_splits: usize,

    /// Granularity of the percent ladder (must divide 100)
    #[serde(default = "default_distribution_percent")]
    pub distribution_percent: u8,

    /// Longest route, in pools
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,

    /// Protocol families to route through
    #[serde(default = "default_protocols")]
    pub protocols: Vec<Protocol>,

    /// Extra denomination for reported gas cost
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_token: Option<TokenAddress>,

    /// Reject splits whose routes traverse a common pool
    #[serde(default = "default_forbid_shared_pools")]
    pub forbid_shared_pools: bool,
}

fn default_min_splits() -> usize {
    1
}

fn default_max_splits() -> usize {
    3
}

fn default_distribution_percent() -> u8 {
    5
}

fn default_max_hops() -> usize {
    3
}

fn default_protocols() -> Vec<Protocol> {
    Protocol::ALL.to_vec()
}

fn default_forbid_shared_pools() -> bool {
    true
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            min_splits: default_min_splits(),
            max_splits: default_max_splits(),
            distribution_percent: default_distribution_percent(),
            max_hops: default_max_hops(),
            protocols: default_protocols(),
            gas_token: None,
            forbid_shared_pools: default_forbid_shared_pools(),
        }
    }
}

impl RoutingConfig {
    /// Check numeric bounds. Protocol compatibility depends on the trade
    /// type and is checked by [`RoutingConfig::validate_protocols`].
    pub fn validate(&self) -> Result<(), RoutingError> {
        if self.min_splits == 0 {
            return Err(invalid("min_splits must be at least 1"));
        }
        if self.max_splits < self.min_splits {
            return Err(invalid(format!(
                "max_splits ({}) is below min_splits ({})",
                self.max_splits, self.min_splits
            )));
        }
        if self.distribution_percent == 0 || self.distribution_percent > 100 {
            return Err(invalid("distribution_percent must be in (0, 100]"));
        }
        if 100 % self.distribution_percent != 0 {
            return Err(invalid(format!(
                "distribution_percent {} does not divide 100",
                self.distribution_percent
            )));
        }
        if self.max_hops == 0 {
            return Err(invalid("max_hops must be at least 1"));
        }
        Ok(())
    }

    /// Reject protocol sets the quoting layer cannot service for this
    /// trade type. Offending protocols are never dropped silently.
    pub fn validate_protocols(&self, trade_type: TradeType) -> Result<(), RoutingError> {
        let has = |p: Protocol| self.protocols.contains(&p);
        let reject = |reason: &str| RoutingError::IncompatibleProtocolSet {
            protocols: self.protocols.clone(),
            trade_type,
            reason: reason.to_string(),
        };

        if self.protocols.is_empty() {
            return Err(reject("no protocols requested"));
        }
        if trade_type == TradeType::ExactOutput && (has(Protocol::V2) || has(Protocol::Mixed)) {
            return Err(reject("exact output is only quoted over V3 routes"));
        }
        if has(Protocol::V2) && has(Protocol::V3) && !has(Protocol::Mixed) {
            return Err(reject("V2 and V3 routes together require Mixed"));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> RoutingError {
    RoutingError::InvalidConfig {
        reason: reason.into(),
    }
}

/// Quote fan-out settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteFetchConfig {
    /// Routes quoted concurrently
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-route deadline in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_max_concurrency() -> usize {
    8
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

impl Default for QuoteFetchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl QuoteFetchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// TTL cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry lifetime in milliseconds
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,

    /// Entries kept before the oldest is evicted
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_ttl_ms() -> u64 {
    12_000
}

fn default_max_entries() -> usize {
    10_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_ttl_ms(),
            max_entries: default_max_entries(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}
