//! Builders shared by the unit tests in this crate

use std::sync::Arc;

use router_core::{Amount, Token, TokenAddress, TradeType};

use crate::state::{GasCost, Pool, Route, RouteWithQuote};

pub(crate) fn token(n: u8) -> Token {
    let address = TokenAddress::parse(&format!("0x{:040x}", n)).unwrap();
    Token::new(address, 18).with_symbol(format!("T{}", n))
}

pub(crate) fn v2_pool(id: &str, a: &Token, b: &Token) -> Pool {
    Pool::new_v2(id, a.clone(), b.clone(), 1_000_000, 1_000_000).unwrap()
}

pub(crate) fn v3_pool(id: &str, a: &Token, b: &Token, fee_tier: u32) -> Pool {
    Pool::new_v3(id, a.clone(), b.clone(), fee_tier, 1_000_000).unwrap()
}

/// A single-hop V3 route through its own pool, so routes never share pools
pub(crate) fn direct_route(id: &str, a: &Token, b: &Token) -> Arc<Route> {
    Arc::new(Route::new(vec![v3_pool(id, a, b, 500)], a, b).unwrap())
}

/// Quote with an explicit gas cost in quote-token units
pub(crate) fn quoted(
    route: &Arc<Route>,
    percent: u8,
    raw_quote: Amount,
    gas_in_quote: Amount,
    trade_type: TradeType,
) -> RouteWithQuote {
    let gas = GasCost {
        gas_estimate: 100_000,
        native: gas_in_quote,
        quote_token: gas_in_quote,
        usd: gas_in_quote,
        gas_token: None,
    };
    RouteWithQuote::new(
        Arc::clone(route),
        percent,
        percent as Amount * 10,
        raw_quote,
        gas,
        trade_type,
    )
}
