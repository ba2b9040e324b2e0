use rust_decimal::Decimal;
use serde::Serialize;

/// Point-in-time market snapshot.
///
/// Fields the venue does not report (bid/ask volume, vwap, open, close,
/// change, average, base volume) are `None` rather than derived.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticker {
    pub symbol: String,
    /// Local receipt time in epoch milliseconds.
    pub timestamp: u64,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub bid: Option<Decimal>,
    pub bid_volume: Option<Decimal>,
    pub ask: Option<Decimal>,
    pub ask_volume: Option<Decimal>,
    pub vwap: Option<Decimal>,
    pub open: Option<Decimal>,
    pub close: Option<Decimal>,
    pub last: Option<Decimal>,
    pub change: Option<Decimal>,
    pub percentage: Option<Decimal>,
    pub average: Option<Decimal>,
    pub base_volume: Option<Decimal>,
    pub quote_volume: Option<Decimal>,
    pub info: serde_json::Value,
}
