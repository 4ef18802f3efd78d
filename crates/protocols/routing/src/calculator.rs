//! Routing Calculator
//!
//! Amount distribution, rate conversion and adjustment arithmetic.
//! Products go through `BigUint` so 128-bit amounts never overflow.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use router_core::constants::{BIPS_BASE, FULL_PERCENT};
use router_core::{Amount, SignedAmount, TradeType};

/// `value * numerator / denominator`, rounded down.
///
/// Returns `None` on a zero denominator or if the result exceeds `u128`.
pub fn mul_div(value: Amount, numerator: Amount, denominator: Amount) -> Option<Amount> {
    if denominator == 0 {
        return None;
    }
    let result = BigUint::from(value) * BigUint::from(numerator) / BigUint::from(denominator);
    result.to_u128()
}

/// Same as [`mul_div`] but saturates at `u128::MAX` instead of failing.
/// A zero denominator saturates too, unless the dividend is zero.
pub fn mul_div_saturating(value: Amount, numerator: Amount, denominator: Amount) -> Amount {
    if denominator == 0 {
        return if value == 0 || numerator == 0 { 0 } else { Amount::MAX };
    }
    let result = BigUint::from(value) * BigUint::from(numerator) / BigUint::from(denominator);
    if result.is_zero() {
        return 0;
    }
    result.to_u128().unwrap_or(Amount::MAX)
}

/// Percent ladder for a distribution granularity.
///
/// Granularity 25 gives `[25, 50, 75, 100]`. Granularities that do not
/// divide 100 yield an empty ladder.
pub fn percent_ladder(distribution_percent: u8) -> Vec<u8> {
    if distribution_percent == 0 || FULL_PERCENT % distribution_percent != 0 {
        return Vec::new();
    }
    (1..=FULL_PERCENT / distribution_percent)
        .map(|i| i * distribution_percent)
        .collect()
}

/// Split `amount` across the percent ladder.
///
/// Returns `(percents, amounts)` with `amounts[i] = amount * percents[i] / 100`.
pub fn amount_distribution(amount: Amount, distribution_percent: u8) -> (Vec<u8>, Vec<Amount>) {
    let percents = percent_ladder(distribution_percent);
    let amounts = percents
        .iter()
        .map(|&p| mul_div_saturating(amount, p as Amount, FULL_PERCENT as Amount))
        .collect();
    (percents, amounts)
}

/// Apply a gas cost to a raw quote in the direction that makes the trade
/// look worse: subtract for exact input, add for exact output.
pub fn adjust_for_gas(raw_quote: Amount, gas_in_quote_token: Amount, trade_type: TradeType) -> SignedAmount {
    let quote = to_signed(raw_quote);
    let gas = to_signed(gas_in_quote_token);
    match trade_type {
        TradeType::ExactInput => quote.saturating_sub(gas),
        TradeType::ExactOutput => quote.saturating_add(gas),
    }
}

/// `amount * bips / 10_000`, rounded down
pub fn apply_bips(amount: Amount, bips: u32) -> Amount {
    mul_div_saturating(amount, bips as Amount, BIPS_BASE as Amount)
}

/// Widen a raw amount to the signed domain, saturating at `i128::MAX`
pub fn to_signed(amount: Amount) -> SignedAmount {
    SignedAmount::try_from(amount).unwrap_or(SignedAmount::MAX)
}
