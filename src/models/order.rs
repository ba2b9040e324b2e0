//! Order lifecycle models and the venue code tables.
//!
//! BTSE reports order status and order type as numeric codes. Both tables
//! pass unrecognized codes through unchanged (as `Unrecognized`) instead of
//! failing, so a code introduced by the venue surfaces to the caller as-is.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// Canonical order lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Created,
    Open,
    Closed,
    Canceled,
    Rejected,
    /// Venue status code with no mapping, carried verbatim.
    Unrecognized(String),
}

impl OrderStatus {
    /// Maps a venue status code.
    ///
    /// | code | status |
    /// |---|---|
    /// | 2, 9 | created |
    /// | 4 | closed |
    /// | 5, 10 | open |
    /// | 6 | canceled |
    /// | 15, 16 | rejected |
    pub fn from_code(code: &str) -> Self {
        match code {
            "2" | "9" => Self::Created,
            "4" => Self::Closed,
            "5" | "10" => Self::Open,
            "6" => Self::Canceled,
            "15" | "16" => Self::Rejected,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "created",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Canceled => "canceled",
            Self::Rejected => "rejected",
            Self::Unrecognized(code) => code,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

/// Canonical order type of a reported order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderType {
    Limit,
    Market,
    Peg,
    /// Venue type code with no mapping, carried verbatim.
    Unrecognized(String),
}

impl OrderType {
    /// Maps a venue order type code: 76 limit, 77 market, 80 peg.
    pub fn from_code(code: &str) -> Self {
        match code {
            "76" => Self::Limit,
            "77" => Self::Market,
            "80" => Self::Peg,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Limit => "limit",
            Self::Market => "market",
            Self::Peg => "peg",
            Self::Unrecognized(code) => code,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

macro_rules! string_repr {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

string_repr!(OrderStatus);
string_repr!(OrderType);

/// A submitted order and its lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: Option<String>,
    /// Epoch milliseconds.
    pub timestamp: Option<u64>,
    /// Canonical symbol, or the raw venue id when the market is not loaded.
    pub symbol: Option<String>,
    pub order_type: Option<OrderType>,
    pub side: Option<String>,
    /// Limit price, else trigger price, else average fill price.
    pub price: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub filled: Option<Decimal>,
    /// `amount - filled` when both are known.
    pub remaining: Option<Decimal>,
    pub average: Option<Decimal>,
    /// `filled * price`, only when `filled != 0` and the price is known.
    pub cost: Option<Decimal>,
    pub status: Option<OrderStatus>,
    pub info: serde_json::Value,
}

/// Result of a cancel request.
#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    /// The cancelled order, normalized.
    Order(Box<Order>),
    /// Bulk-cancel acknowledgment, returned exactly as the venue sent it.
    AllCancelled(serde_json::Value),
}

/// Venue message acknowledging that every order was cancelled.
pub const ALL_ORDER_CANCELLED_SUCCESS: &str = "ALL_ORDER_CANCELLED_SUCCESS";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_code_maps_to_canonical_state() {
        let expected = [
            ("2", OrderStatus::Created),
            ("4", OrderStatus::Closed),
            ("5", OrderStatus::Open),
            ("6", OrderStatus::Canceled),
            ("9", OrderStatus::Created),
            ("10", OrderStatus::Open),
            ("15", OrderStatus::Rejected),
            ("16", OrderStatus::Rejected),
        ];
        for (code, status) in expected {
            let mapped = OrderStatus::from_code(code);
            assert!(mapped.is_recognized());
            assert_eq!(mapped, status, "code {code}");
        }
    }

    #[test]
    fn unknown_status_passes_through() {
        for code in ["1", "3", "7", "99", "", "FILLED"] {
            let mapped = OrderStatus::from_code(code);
            assert_eq!(mapped, OrderStatus::Unrecognized(code.to_string()));
            assert_eq!(mapped.as_str(), code);
        }
    }

    #[test]
    fn type_codes_map_and_pass_through() {
        assert_eq!(OrderType::from_code("76"), OrderType::Limit);
        assert_eq!(OrderType::from_code("77"), OrderType::Market);
        assert_eq!(OrderType::from_code("80"), OrderType::Peg);
        assert_eq!(OrderType::from_code("81").as_str(), "81");
    }

    #[test]
    fn serializes_as_plain_strings() {
        assert_eq!(
            serde_json::to_value(OrderStatus::Canceled).unwrap(),
            serde_json::json!("canceled")
        );
        assert_eq!(
            serde_json::to_value(OrderType::Unrecognized("90".into())).unwrap(),
            serde_json::json!("90")
        );
    }
}
