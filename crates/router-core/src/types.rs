//! Core type definitions for the swap router

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::RoutingError;

/// Raw token amount in the token's smallest unit.
pub type Amount = u128;

/// Signed raw amount. Gas-adjusted quotes can drop below zero when the
/// execution cost exceeds the output of a slice.
pub type SignedAmount = i128;

/// Gas units consumed by execution
pub type GasUnits = u64;

/// Token contract address (20 bytes, `0x`-prefixed, lower-cased hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenAddress(String);

impl TokenAddress {
    /// Length of an address in bytes
    pub const BYTES: usize = 20;

    /// Parse and normalise an address. Accepts mixed-case hex with or
    /// without the `0x` prefix.
    pub fn parse(raw: &str) -> Result<Self, RoutingError> {
        let trimmed = raw.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let bytes = hex::decode(body).map_err(|e| RoutingError::InvalidToken {
            address: raw.to_string(),
            reason: e.to_string(),
        })?;
        if bytes.len() != Self::BYTES {
            return Err(RoutingError::InvalidToken {
                address: raw.to_string(),
                reason: format!("expected {} bytes, found {}", Self::BYTES, bytes.len()),
            });
        }

        Ok(Self(format!("0x{}", hex::encode(bytes))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First bytes of the address, for log lines
    pub fn short(&self) -> &str {
        &self.0[..10.min(self.0.len())]
    }
}

impl FromStr for TokenAddress {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TokenAddress {
    type Error = RoutingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TokenAddress> for String {
    fn from(value: TokenAddress) -> Self {
        value.0
    }
}

impl fmt::Display for TokenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token identity. Metadata is supplied by the caller; the router only
/// compares addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub address: TokenAddress,
    pub decimals: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl Token {
    pub fn new(address: TokenAddress, decimals: u8) -> Self {
        Self {
            address,
            decimals,
            symbol: None,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Symbol if known, otherwise the shortened address
    pub fn label(&self) -> &str {
        self.symbol.as_deref().unwrap_or_else(|| self.address.short())
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Token {}

impl std::hash::Hash for Token {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// EVM chain id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    pub const MAINNET: ChainId = ChainId(1);
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the trade is fixed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeType {
    /// Amount in is fixed, quotes are output amounts (maximise)
    ExactInput,
    /// Amount out is fixed, quotes are required input amounts (minimise)
    ExactOutput,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactInput => "EXACT_INPUT",
            Self::ExactOutput => "EXACT_OUTPUT",
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// AMM protocol family. `Mixed` is only ever a route tag, never a pool tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Protocol {
    V2,
    V3,
    Mixed,
}

impl Protocol {
    pub const ALL: [Protocol; 3] = [Protocol::V2, Protocol::V3, Protocol::Mixed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V2 => "V2",
            Self::V3 => "V3",
            Self::Mixed => "MIXED",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Constants
pub mod constants {
    /// Basis points in one whole
    pub const BIPS_BASE: u32 = 10_000;

    /// The whole trade, in percent
    pub const FULL_PERCENT: u8 = 100;
}
