//! Gas Model
//!
//! Attributes an execution cost to each quoted slice. The heuristic model is
//! keyed on the route's hops, so longer routes always cost more.

use serde::{Deserialize, Serialize};

use router_core::{Amount, GasUnits, Protocol, RoutingError};

use crate::calculator::mul_div;
use crate::constants::{v2_gas, v3_gas};
use crate::state::{GasCost, Route, SliceQuote};

/// Estimates the cost of executing one slice of a route
pub trait GasModel: Send + Sync {
    fn estimate_gas_cost(&self, route: &Route, quote: &SliceQuote) -> GasCost;
}

/// How much of a token one unit of the native currency buys.
///
/// `native_amount` wei is worth `token_amount` raw units of the token. The
/// native side is never zero, including after deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawExchangeRate")]
pub struct ExchangeRate {
    native_amount: Amount,
    token_amount: Amount,
}

#[derive(Deserialize)]
struct RawExchangeRate {
    native_amount: Amount,
    token_amount: Amount,
}

impl TryFrom<RawExchangeRate> for ExchangeRate {
    type Error = RoutingError;

    fn try_from(raw: RawExchangeRate) -> Result<Self, Self::Error> {
        Self::new(raw.native_amount, raw.token_amount)
    }
}

impl ExchangeRate {
    pub fn new(native_amount: Amount, token_amount: Amount) -> Result<Self, RoutingError> {
        if native_amount == 0 {
            return Err(RoutingError::InvalidAmount {
                message: "exchange rate needs a non-zero native amount".to_string(),
            });
        }
        Ok(Self {
            native_amount,
            token_amount,
        })
    }

    /// The token is the native currency (or its wrapped form)
    pub fn identity() -> Self {
        Self {
            native_amount: 1,
            token_amount: 1,
        }
    }

    pub fn native_amount(&self) -> Amount {
        self.native_amount
    }

    pub fn token_amount(&self) -> Amount {
        self.token_amount
    }

    /// Convert a native amount into token units, rounded down. Saturates at
    /// `u128::MAX` when the product does not fit.
    pub fn convert(&self, native: Amount) -> Amount {
        mul_div(native, self.token_amount, self.native_amount).unwrap_or(Amount::MAX)
    }
}

/// Gas units for a route, from pool counts per protocol and ticks crossed.
pub fn heuristic_gas_units(route: &Route, quote: &SliceQuote) -> GasUnits {
    let (v2_hops, v3_hops) = match route {
        Route::V2(r) => (r.pools.len() as u64, 0),
        Route::V3(r) => (0, r.pools.len() as u64),
        Route::Mixed(r) => {
            let v2 = r
                .pools
                .iter()
                .filter(|p| p.protocol() == Protocol::V2)
                .count() as u64;
            (v2, r.pools.len() as u64 - v2)
        }
    };

    let mut gas: GasUnits = 0;
    if v2_hops > 0 {
        gas += v2_gas::BASE_SWAP_COST + v2_gas::COST_PER_EXTRA_HOP * (v2_hops - 1);
    }
    if v3_hops > 0 {
        let ticks: u64 = quote
            .initialized_ticks_crossed
            .iter()
            .map(|&t| t as u64)
            .sum();
        gas += v3_gas::BASE_SWAP_COST
            + v3_gas::COST_PER_HOP * v3_hops
            + v3_gas::COST_PER_INIT_TICK * ticks;
    }
    gas
}

/// Hop-count heuristic priced at a fixed gas price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicGasModel {
    pub gas_price_wei: Amount,
    /// Native currency to the quote token (output token for exact input,
    /// input token for exact output)
    pub native_to_quote: ExchangeRate,
    pub native_to_usd: ExchangeRate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_to_gas_token: Option<ExchangeRate>,
}

impl HeuristicGasModel {
    pub fn new(gas_price_wei: Amount, native_to_quote: ExchangeRate, native_to_usd: ExchangeRate) -> Self {
        Self {
            gas_price_wei,
            native_to_quote,
            native_to_usd,
            native_to_gas_token: None,
        }
    }

    pub fn with_gas_token(mut self, rate: ExchangeRate) -> Self {
        self.native_to_gas_token = Some(rate);
        self
    }

    /// Price an amount of gas in every denomination this model knows
    pub fn price_gas(&self, gas_estimate: GasUnits) -> GasCost {
        let native = (gas_estimate as Amount).saturating_mul(self.gas_price_wei);
        GasCost {
            gas_estimate,
            native,
            quote_token: self.native_to_quote.convert(native),
            usd: self.native_to_usd.convert(native),
            gas_token: self.native_to_gas_token.map(|r| r.convert(native)),
        }
    }
}

impl GasModel for HeuristicGasModel {
    /// A quoter-supplied estimate only ever raises the heuristic, so the
    /// hop ordering of costs holds whatever the quoter reports.
    fn estimate_gas_cost(&self, route: &Route, quote: &SliceQuote) -> GasCost {
        let heuristic = heuristic_gas_units(route, quote);
        let units = quote.gas_estimate.map_or(heuristic, |reported| reported.max(heuristic));
        self.price_gas(units)
    }
}
