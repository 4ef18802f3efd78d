//! Portion (protocol fee) adjustment
//!
//! Applied after gas, once a split has been chosen. For exact input the
//! portion is a cut of the output; for exact output the swapper must also
//! buy the portion, which raises the required input.

use serde::{Deserialize, Serialize};

use router_core::constants::BIPS_BASE;
use router_core::{Amount, RoutingError, SignedAmount, TradeType};

use crate::calculator::{apply_bips, to_signed};

/// Source of the portion rate for a request
pub trait PortionProvider: Send + Sync {
    /// Portion in basis points, `None` when no portion applies
    fn portion_bips(&self, trade_type: TradeType) -> Option<u32>;

    /// Portion in output-token units.
    ///
    /// Exact input: a cut of the quoted output. Exact output: a cut of the
    /// requested output amount.
    fn portion_amount(&self, trade_type: TradeType, amount: Amount, quote: Amount) -> Option<Amount> {
        let bips = self.portion_bips(trade_type).filter(|&b| b > 0)?;
        Some(match trade_type {
            TradeType::ExactInput => apply_bips(quote, bips),
            TradeType::ExactOutput => apply_bips(amount, bips),
        })
    }

    /// Portion expressed in the quote token. Only defined for exact output,
    /// where the quote is denominated in the input token.
    fn portion_quote_amount(&self, trade_type: TradeType, quote: Amount) -> Option<Amount> {
        match trade_type {
            TradeType::ExactInput => None,
            TradeType::ExactOutput => {
                let bips = self.portion_bips(trade_type).filter(|&b| b > 0)?;
                Some(apply_bips(quote, bips))
            }
        }
    }

    /// Gas-adjusted quote with the portion layered on top
    fn quote_gas_and_portion_adjusted(
        &self,
        trade_type: TradeType,
        amount: Amount,
        quote: Amount,
        quote_gas_adjusted: SignedAmount,
    ) -> Option<SignedAmount> {
        match trade_type {
            TradeType::ExactInput => {
                let portion = self.portion_amount(trade_type, amount, quote)?;
                Some(quote_gas_adjusted.saturating_sub(to_signed(portion)))
            }
            TradeType::ExactOutput => {
                let portion = self.portion_quote_amount(trade_type, quote)?;
                Some(quote_gas_adjusted.saturating_add(to_signed(portion)))
            }
        }
    }
}

/// No portion is charged
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPortion;

impl PortionProvider for NoPortion {
    fn portion_bips(&self, _trade_type: TradeType) -> Option<u32> {
        None
    }
}

/// Same portion rate for both trade types. Never above [`BIPS_BASE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFixedPortion")]
pub struct FixedPortion {
    bips: u32,
}

#[derive(Deserialize)]
struct RawFixedPortion {
    bips: u32,
}

impl TryFrom<RawFixedPortion> for FixedPortion {
    type Error = RoutingError;

    fn try_from(raw: RawFixedPortion) -> Result<Self, Self::Error> {
        Self::new(raw.bips)
    }
}

impl FixedPortion {
    pub fn new(bips: u32) -> Result<Self, RoutingError> {
        if bips > BIPS_BASE {
            return Err(RoutingError::InvalidAmount {
                message: format!("portion of {} bips exceeds {}", bips, BIPS_BASE),
            });
        }
        Ok(Self { bips })
    }

    pub fn bips(&self) -> u32 {
        self.bips
    }
}

impl PortionProvider for FixedPortion {
    fn portion_bips(&self, _trade_type: TradeType) -> Option<u32> {
        Some(self.bips)
    }
}
