//! Error types for the swap router
//!
//! "No route" outcomes are not errors: the generator returns an empty list
//! and the selector returns `Ok(None)`. The variants here cover requests the
//! router refuses to service at all.

use thiserror::Error;

use crate::types::{Protocol, TradeType};

/// Errors that stop a routing request before or during selection
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("Invalid routing config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Protocols {protocols:?} cannot be used for {trade_type}: {reason}")]
    IncompatibleProtocolSet {
        protocols: Vec<Protocol>,
        trade_type: TradeType,
        reason: String,
    },

    #[error("Invalid token address {address}: {reason}")]
    InvalidToken { address: String, reason: String },

    #[error("Invalid pool {pool_id}: {reason}")]
    InvalidPool { pool_id: String, reason: String },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Quote for route {route} is {got}, request is {expected}")]
    TradeTypeMismatch {
        route: String,
        expected: TradeType,
        got: TradeType,
    },

    #[error("Quote acquisition failed: {0}")]
    Quote(#[from] QuoteError),
}

/// Failures at the quote-acquisition boundary. Per-slice failures are
/// recorded and skipped; these only surface when the whole fan-out cannot run.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("Quote provider error: {0}")]
    Provider(#[from] anyhow::Error),

    #[error("Quote request timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("Quote ladder for route {route} has {got} entries, expected {expected}")]
    InconsistentLadder {
        route: String,
        got: usize,
        expected: usize,
    },

    #[error("Quote task aborted: {message}")]
    TaskAborted { message: String },
}

/// Result type alias for router operations
pub type Result<T> = std::result::Result<T, RoutingError>;

impl RoutingError {
    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "invalid_config",
            Self::IncompatibleProtocolSet { .. } => "incompatible_protocol_set",
            Self::InvalidToken { .. } => "invalid_token",
            Self::InvalidPool { .. } => "invalid_pool",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::TradeTypeMismatch { .. } => "trade_type_mismatch",
            Self::Quote(_) => "quote_failed",
        }
    }

    /// Whether retrying the same request later could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Quote(_))
    }
}

impl QuoteError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Provider(_) => "provider",
            Self::Timeout { .. } => "timeout",
            Self::InconsistentLadder { .. } => "inconsistent_ladder",
            Self::TaskAborted { .. } => "task_aborted",
        }
    }
}
