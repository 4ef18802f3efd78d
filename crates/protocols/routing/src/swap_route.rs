//! Result Assembler
//!
//! Packages a winning split into a [`SwapRoute`].

use router_core::{Amount, ChainId, SignedAmount, TradeType};

use crate::portion::PortionProvider;
use crate::state::{RouteWithQuote, SwapRoute};

/// Sum quotes and gas over the selected slices and layer the portion on top.
///
/// Slices are ordered by percent, largest first. The gas-token total is only
/// reported when `include_gas_token` is set and every slice carries one.
pub fn assemble_swap_route(
    amount: Amount,
    mut selected: Vec<RouteWithQuote>,
    trade_type: TradeType,
    chain_id: ChainId,
    include_gas_token: bool,
    portion_provider: &dyn PortionProvider,
) -> SwapRoute {
    selected.sort_by(|a, b| b.percent.cmp(&a.percent));

    let mut quote: Amount = 0;
    let mut quote_gas_adjusted: SignedAmount = 0;
    let mut gas_used: u64 = 0;
    let mut gas_native: Amount = 0;
    let mut gas_quote_token: Amount = 0;
    let mut gas_usd: Amount = 0;
    let mut gas_token: Option<Amount> = if include_gas_token { Some(0) } else { None };

    for slice in &selected {
        quote = quote.saturating_add(slice.raw_quote);
        quote_gas_adjusted = quote_gas_adjusted.saturating_add(slice.quote_adjusted_for_gas);
        gas_used = gas_used.saturating_add(slice.gas_cost.gas_estimate);
        gas_native = gas_native.saturating_add(slice.gas_cost.native);
        gas_quote_token = gas_quote_token.saturating_add(slice.gas_cost.quote_token);
        gas_usd = gas_usd.saturating_add(slice.gas_cost.usd);
        gas_token = match (gas_token, slice.gas_cost.gas_token) {
            (Some(total), Some(cost)) => Some(total.saturating_add(cost)),
            _ => None,
        };
    }

    let portion_amount = portion_provider.portion_amount(trade_type, amount, quote);
    let quote_gas_and_portion_adjusted =
        portion_provider.quote_gas_and_portion_adjusted(trade_type, amount, quote, quote_gas_adjusted);

    SwapRoute {
        chain_id,
        trade_type,
        amount,
        quote,
        quote_gas_adjusted,
        quote_gas_and_portion_adjusted,
        estimated_gas_used: gas_used,
        estimated_gas_used_native: gas_native,
        estimated_gas_used_quote_token: gas_quote_token,
        estimated_gas_used_usd: gas_usd,
        estimated_gas_used_gas_token: gas_token,
        route: selected,
        portion_amount,
    }
}
