use rust_decimal::Decimal;
use serde::Serialize;

/// One executed fill, public or own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub id: Option<String>,
    /// Order id, present for own trades.
    pub order: Option<String>,
    pub symbol: String,
    /// Lower-cased taker side (`"buy"`/`"sell"`) as reported by the venue.
    pub side: Option<String>,
    pub price: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub fee: Option<Decimal>,
    /// Epoch milliseconds.
    pub timestamp: Option<u64>,
    pub info: serde_json::Value,
}
