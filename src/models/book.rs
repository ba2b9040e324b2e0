//! Order book snapshot models.

use rust_decimal::Decimal;
use serde::Serialize;

/// A single price level in the order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub size: Decimal,
}

/// Normalized order book snapshot for one market.
///
/// Bids are sorted by descending price and asks by ascending price, with
/// at most one level per price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBook {
    pub symbol: String,
    /// Venue timestamp in epoch milliseconds.
    pub timestamp: Option<u64>,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    /// Venue timestamp reused as a staleness marker across polls.
    pub nonce: Option<u64>,
}

impl OrderBook {
    /// Returns `true` if `self` is at least as recent as `previous`.
    ///
    /// Snapshots without a nonce are never considered fresher.
    pub fn is_fresher_than(&self, previous: &OrderBook) -> bool {
        match (self.nonce, previous.nonce) {
            (Some(current), Some(prev)) => current >= prev,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }
}
