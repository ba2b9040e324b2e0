//! Tradable instrument metadata.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::router::MarketType;
use crate::{BtseError, Result};

/// One tradable instrument as listed by a `market_summary` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Market {
    /// Venue market identifier (e.g. `"BTC-USD"`, `"BTCPFC"`).
    pub id: String,
    /// Canonical symbol (e.g. `"BTC/USD"`, `"BTC/USD:BTCPFC"`).
    pub symbol: String,
    pub base: String,
    pub quote: String,
    pub base_id: String,
    pub quote_id: String,
    pub market_type: MarketType,
    pub active: Option<bool>,
    pub precision: Precision,
    pub limits: Limits,
    /// Raw venue entry.
    pub info: serde_json::Value,
}

/// Tick sizes for price and amount.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Precision {
    pub price: Option<Decimal>,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Limits {
    pub amount: MinMax,
    pub price: MinMax,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MinMax {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

impl Market {
    /// Truncates `amount` down to a multiple of the amount tick size.
    ///
    /// # Errors
    ///
    /// Returns [`BtseError::InvalidOrder`] if the scaled amount does not fit
    /// in a [`Decimal`].
    pub fn amount_to_precision(
        &self,
        operation: &'static str,
        amount: Decimal,
    ) -> Result<Decimal> {
        match self.precision.amount {
            Some(step) if step > Decimal::ZERO => amount
                .checked_div(step)
                .and_then(|steps| steps.trunc().checked_mul(step))
                .map(|v| v.normalize())
                .ok_or_else(|| out_of_range(operation, "amount", amount, step)),
            _ => Ok(amount),
        }
    }

    /// Rounds `price` half away from zero to a multiple of the price tick size.
    ///
    /// # Errors
    ///
    /// Returns [`BtseError::InvalidOrder`] if the scaled price does not fit
    /// in a [`Decimal`].
    pub fn price_to_precision(
        &self,
        operation: &'static str,
        price: Decimal,
    ) -> Result<Decimal> {
        match self.precision.price {
            Some(step) if step > Decimal::ZERO => price
                .checked_div(step)
                .and_then(|steps| {
                    steps
                        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                        .checked_mul(step)
                })
                .map(|v| v.normalize())
                .ok_or_else(|| out_of_range(operation, "price", price, step)),
            _ => Ok(price),
        }
    }
}

fn out_of_range(operation: &'static str, what: &str, value: Decimal, step: Decimal) -> BtseError {
    BtseError::InvalidOrder {
        operation,
        reason: format!("{what} {value} cannot be scaled to tick size {step}"),
    }
}
