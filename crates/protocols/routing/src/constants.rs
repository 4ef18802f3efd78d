//! Routing Constants
//!
//! Gas heuristics per protocol and search defaults.

/// Gas heuristics for V2 pairs
pub mod v2_gas {
    /// Charged once per route containing a V2 hop
    pub const BASE_SWAP_COST: u64 = 135_000;

    /// Each V2 hop after the first
    pub const COST_PER_EXTRA_HOP: u64 = 50_000;
}

/// Gas heuristics for V3 pools
pub mod v3_gas {
    /// Charged once per route containing a V3 hop
    pub const BASE_SWAP_COST: u64 = 2_000;

    /// Every V3 hop
    pub const COST_PER_HOP: u64 = 80_000;

    /// Every initialized tick crossed during the swap
    pub const COST_PER_INIT_TICK: u64 = 31_000;
}

/// Fee tiers (hundredths of a bip)
pub mod fee_tiers {
    pub const LOWEST: u32 = 100;
    pub const LOW: u32 = 500;
    pub const MEDIUM: u32 = 3_000;
    pub const HIGH: u32 = 10_000;
}
