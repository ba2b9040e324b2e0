//! Outbound order request models.
//!
//! The caller names the order type with a string (`LIMIT`, `MARKET`,
//! `STOP`, `TRAILINGSTOP`, any case). Each type fills a different set of
//! fields in the request body and requires its own price input:
//!
//! | type | body fields | requires |
//! |---|---|---|
//! | LIMIT | `type`, `txType`, `price` | price |
//! | MARKET | `type` | nothing |
//! | STOP | `txType`, `stopPrice` | trigger price |
//! | TRAILINGSTOP | `trailValue` | trail value |

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::BtseError;

const OPERATION: &str = "create_order";

/// Order submission type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderKind {
    Limit,
    Market,
    Stop,
    TrailingStop,
}

impl OrderKind {
    pub const SUPPORTED: &'static str = "LIMIT, MARKET, STOP, TRAILINGSTOP";

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Limit => "LIMIT",
            Self::Market => "MARKET",
            Self::Stop => "STOP",
            Self::TrailingStop => "TRAILINGSTOP",
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderKind {
    type Err = BtseError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "LIMIT" => Ok(Self::Limit),
            "MARKET" => Ok(Self::Market),
            "STOP" => Ok(Self::Stop),
            "TRAILINGSTOP" => Ok(Self::TrailingStop),
            _ => Err(BtseError::InvalidOrder {
                operation: OPERATION,
                reason: format!(
                    "order type {s:?} is not supported, expected one of {}",
                    Self::SUPPORTED
                ),
            }),
        }
    }
}

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl FromStr for OrderSide {
    type Err = BtseError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            _ => Err(BtseError::InvalidOrder {
                operation: OPERATION,
                reason: format!("order side {s:?} is not supported, expected buy or sell"),
            }),
        }
    }
}

/// Body of a `POST order` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    pub time_in_force: &'static str,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub order_type: Option<&'static str>,
    #[serde(rename = "txType", skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<&'static str>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
    #[serde(
        rename = "stopPrice",
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub stop_price: Option<Decimal>,
    #[serde(
        rename = "trailValue",
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub trail_value: Option<Decimal>,
    #[serde(rename = "clOrderID", skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
}

/// Builder validating the fields each [`OrderKind`] requires.
#[derive(Debug, Clone)]
pub struct OrderRequestBuilder {
    kind: OrderKind,
    side: OrderSide,
    market_id: String,
    size: Decimal,
    price: Option<Decimal>,
    client_order_id: Option<String>,
}

impl OrderRequestBuilder {
    /// Starts a request for `market_id`. `size` should already be rounded to
    /// the market's amount precision.
    #[must_use]
    pub fn new(kind: OrderKind, side: OrderSide, market_id: &str, size: Decimal) -> Self {
        Self {
            kind,
            side,
            market_id: market_id.to_string(),
            size,
            price: None,
            client_order_id: None,
        }
    }

    /// Sets the price input: limit price, stop trigger price or trail value
    /// depending on the order type.
    #[must_use]
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub fn with_client_order_id(mut self, id: &str) -> Self {
        self.client_order_id = Some(id.to_string());
        self
    }

    /// Validates and builds the request.
    ///
    /// # Errors
    ///
    /// Returns [`BtseError::InvalidOrder`] if the size is not positive or
    /// the price input required by the order type is missing.
    pub fn build(self) -> crate::Result<OrderRequest> {
        if self.size <= Decimal::ZERO {
            return Err(BtseError::InvalidOrder {
                operation: OPERATION,
                reason: format!("{} order size must be positive, got {}", self.kind, self.size),
            });
        }

        let mut request = OrderRequest {
            symbol: self.market_id.to_ascii_uppercase(),
            side: self.side,
            size: self.size,
            time_in_force: "GTC",
            order_type: None,
            tx_type: None,
            price: None,
            stop_price: None,
            trail_value: None,
            client_order_id: self.client_order_id,
        };

        match self.kind {
            OrderKind::Limit => {
                request.order_type = Some("LIMIT");
                request.tx_type = Some("LIMIT");
                request.price = Some(self.price.ok_or_else(|| missing(self.kind, "price"))?);
            }
            OrderKind::Market => {
                request.order_type = Some("MARKET");
            }
            OrderKind::Stop => {
                request.tx_type = Some("STOP");
                request.stop_price =
                    Some(self.price.ok_or_else(|| missing(self.kind, "trigger price"))?);
            }
            OrderKind::TrailingStop => {
                request.trail_value =
                    Some(self.price.ok_or_else(|| missing(self.kind, "trail value"))?);
            }
        }

        Ok(request)
    }
}

fn missing(kind: OrderKind, field: &str) -> BtseError {
    BtseError::InvalidOrder {
        operation: OPERATION,
        reason: format!("{kind} order requires a {field}"),
    }
}
