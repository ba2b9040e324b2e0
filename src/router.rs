//! Endpoint routing across the BTSE REST surfaces.
//!
//! BTSE serves the same logical operation from different API versions
//! depending on the product line: spot calls go to `/spot/api/v3.1`,
//! futures calls to `/futures/api/v2.1`. The [`ROUTES`] table maps every
//! [`Operation`] to its spot and futures [`Endpoint`]; [`route`] picks one
//! based on the caller's requested type, the per-operation default and the
//! global default, in that order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::RouteOptions;
use crate::{BtseError, Result};

/// Product line an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketType {
    #[default]
    Spot,
    Futures,
}

impl MarketType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spot => "spot",
            Self::Futures => "futures",
        }
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketType {
    type Err = BtseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "spot" => Ok(Self::Spot),
            "futures" => Ok(Self::Futures),
            other => Err(BtseError::Config(format!(
                "unknown market type {other:?}, expected \"spot\" or \"futures\""
            ))),
        }
    }
}

/// One of the independent REST API versions exposed by the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    SpotV2,
    SpotV3,
    FuturesV2,
}

impl Surface {
    /// Path of the surface relative to the venue host.
    pub fn base_path(self) -> &'static str {
        match self {
            Self::SpotV2 => "/spot/api/v2",
            Self::SpotV3 => "/spot/api/v3.1",
            Self::FuturesV2 => "/futures/api/v2.1",
        }
    }

    /// Product-line prefix stripped from a URL to obtain its signature path.
    pub fn product_prefix(self) -> &'static str {
        match self {
            Self::SpotV2 | Self::SpotV3 => "/spot/",
            Self::FuturesV2 => "/futures/",
        }
    }

    /// Absolute base URL of the surface for the given venue host.
    pub fn base_url(self, host: &str) -> String {
        format!("{}{}", host.trim_end_matches('/'), self.base_path())
    }
}

/// Whether an endpoint requires a signed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Public,
    Private,
}

/// HTTP verb used by an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Delete,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }

    /// Whether requests with this verb carry a JSON body instead of a query string.
    pub fn has_body(self) -> bool {
        matches!(self, Self::Post)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete API endpoint: surface, access level, verb and relative path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub surface: Surface,
    pub access: Access,
    pub verb: Verb,
    pub path: &'static str,
}

impl Endpoint {
    const fn new(surface: Surface, access: Access, verb: Verb, path: &'static str) -> Self {
        Self {
            surface,
            access,
            verb,
            path,
        }
    }

    /// Absolute URL of the endpoint, without query string.
    pub fn url(&self, host: &str) -> String {
        format!("{}/{}", self.surface.base_url(host), self.path)
    }

    pub fn is_private(&self) -> bool {
        self.access == Access::Private
    }
}

/// Logical adapter operations that issue a venue request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    FetchTime,
    FetchMarkets,
    FetchTicker,
    FetchTickers,
    FetchOrderBook,
    FetchTrades,
    FetchOhlcv,
    FetchBalance,
    FetchDeposits,
    CreateOrder,
    CancelOrder,
    CancelAllOrders,
    FetchOpenOrders,
    FetchClosedOrders,
    SetLeverage,
}

impl Operation {
    /// Every operation, in declaration order.
    pub const ALL: [Operation; 15] = [
        Self::FetchTime,
        Self::FetchMarkets,
        Self::FetchTicker,
        Self::FetchTickers,
        Self::FetchOrderBook,
        Self::FetchTrades,
        Self::FetchOhlcv,
        Self::FetchBalance,
        Self::FetchDeposits,
        Self::CreateOrder,
        Self::CancelOrder,
        Self::CancelAllOrders,
        Self::FetchOpenOrders,
        Self::FetchClosedOrders,
        Self::SetLeverage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FetchTime => "fetch_time",
            Self::FetchMarkets => "fetch_markets",
            Self::FetchTicker => "fetch_ticker",
            Self::FetchTickers => "fetch_tickers",
            Self::FetchOrderBook => "fetch_order_book",
            Self::FetchTrades => "fetch_trades",
            Self::FetchOhlcv => "fetch_ohlcv",
            Self::FetchBalance => "fetch_balance",
            Self::FetchDeposits => "fetch_deposits",
            Self::CreateOrder => "create_order",
            Self::CancelOrder => "cancel_order",
            Self::CancelAllOrders => "cancel_all_orders",
            Self::FetchOpenOrders => "fetch_open_orders",
            Self::FetchClosedOrders => "fetch_closed_orders",
            Self::SetLeverage => "set_leverage",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The spot and futures endpoints serving one operation.
#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub operation: Operation,
    pub spot: Option<Endpoint>,
    pub futures: Option<Endpoint>,
}

impl Route {
    pub fn endpoint(&self, market_type: MarketType) -> Option<Endpoint> {
        match market_type {
            MarketType::Spot => self.spot,
            MarketType::Futures => self.futures,
        }
    }
}

const fn public(operation: Operation, path: &'static str) -> Route {
    Route {
        operation,
        spot: Some(Endpoint::new(Surface::SpotV3, Access::Public, Verb::Get, path)),
        futures: Some(Endpoint::new(
            Surface::FuturesV2,
            Access::Public,
            Verb::Get,
            path,
        )),
    }
}

const fn private(operation: Operation, verb: Verb, path: &'static str) -> Route {
    Route {
        operation,
        spot: Some(Endpoint::new(Surface::SpotV3, Access::Private, verb, path)),
        futures: Some(Endpoint::new(Surface::FuturesV2, Access::Private, verb, path)),
    }
}

/// Static routing table, one entry per [`Operation`].
pub const ROUTES: [Route; 15] = [
    public(Operation::FetchTime, "time"),
    public(Operation::FetchMarkets, "market_summary"),
    public(Operation::FetchTicker, "market_summary"),
    public(Operation::FetchTickers, "market_summary"),
    public(Operation::FetchOrderBook, "orderbook/L2"),
    public(Operation::FetchTrades, "trades"),
    public(Operation::FetchOhlcv, "ohlcv"),
    private(Operation::FetchBalance, Verb::Get, "user/wallet"),
    private(Operation::FetchDeposits, Verb::Get, "user/wallet_history"),
    private(Operation::CreateOrder, Verb::Post, "order"),
    private(Operation::CancelOrder, Verb::Delete, "order"),
    private(Operation::CancelAllOrders, Verb::Post, "order/cancelAllAfter"),
    private(Operation::FetchOpenOrders, Verb::Get, "user/open_orders"),
    Route {
        operation: Operation::FetchClosedOrders,
        spot: None,
        futures: None,
    },
    Route {
        operation: Operation::SetLeverage,
        spot: None,
        futures: Some(Endpoint::new(
            Surface::FuturesV2,
            Access::Private,
            Verb::Post,
            "leverage",
        )),
    },
];

/// Returns the table entry for an operation.
pub fn route_for(operation: Operation) -> &'static Route {
    // ROUTES is declared in the same order as Operation::ALL.
    &ROUTES[operation as usize]
}

/// Resolves the market type for a call: explicit request, then the
/// per-operation default, then the global default.
pub fn resolve_type(
    operation: Operation,
    requested: Option<MarketType>,
    options: &RouteOptions,
) -> MarketType {
    requested
        .or_else(|| options.operations.get(&operation).copied())
        .unwrap_or(options.default_type)
}

/// Resolves the endpoint that serves `operation` for the requested type.
///
/// # Errors
///
/// Returns [`BtseError::UnsupportedOperation`] when the operation has no
/// endpoint on the resolved product line.
pub fn route(
    operation: Operation,
    requested: Option<MarketType>,
    options: &RouteOptions,
) -> Result<(MarketType, Endpoint)> {
    let market_type = resolve_type(operation, requested, options);
    route_for(operation)
        .endpoint(market_type)
        .map(|endpoint| (market_type, endpoint))
        .ok_or_else(|| BtseError::UnsupportedOperation {
            operation: operation.as_str(),
            reason: format!("no {market_type} endpoint"),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn options(default_type: MarketType, overrides: &[(Operation, MarketType)]) -> RouteOptions {
        RouteOptions {
            default_type,
            operations: overrides.iter().copied().collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn table_covers_every_operation_in_order() {
        for operation in Operation::ALL {
            assert_eq!(route_for(operation).operation, operation);
        }
    }

    #[test]
    fn defaults_to_spot_v3() {
        let (market_type, endpoint) =
            route(Operation::FetchTicker, None, &RouteOptions::default()).unwrap();
        assert_eq!(market_type, MarketType::Spot);
        assert_eq!(endpoint.surface, Surface::SpotV3);
        assert_eq!(endpoint.verb, Verb::Get);
        assert_eq!(endpoint.path, "market_summary");
    }

    #[test]
    fn per_operation_default_beats_global_default() {
        let opts = options(
            MarketType::Spot,
            &[(Operation::FetchOrderBook, MarketType::Futures)],
        );
        let (_, book) = route(Operation::FetchOrderBook, None, &opts).unwrap();
        let (_, trades) = route(Operation::FetchTrades, None, &opts).unwrap();
        assert_eq!(book.surface, Surface::FuturesV2);
        assert_eq!(trades.surface, Surface::SpotV3);
    }

    #[test]
    fn explicit_type_beats_per_operation_default() {
        let opts = options(
            MarketType::Futures,
            &[(Operation::CreateOrder, MarketType::Futures)],
        );
        let (market_type, endpoint) =
            route(Operation::CreateOrder, Some(MarketType::Spot), &opts).unwrap();
        assert_eq!(market_type, MarketType::Spot);
        assert_eq!(endpoint.surface, Surface::SpotV3);
        assert!(endpoint.is_private());
        assert_eq!(endpoint.verb, Verb::Post);
    }

    #[test]
    fn futures_only_operation_rejects_spot() {
        let err = route(Operation::SetLeverage, None, &RouteOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            BtseError::UnsupportedOperation {
                operation: "set_leverage",
                ..
            }
        ));
        assert!(err.to_string().contains("no spot endpoint"));

        let (_, endpoint) =
            route(Operation::SetLeverage, Some(MarketType::Futures), &RouteOptions::default())
                .unwrap();
        assert_eq!(endpoint.surface, Surface::FuturesV2);
    }

    #[test]
    fn closed_orders_have_no_route() {
        for market_type in [MarketType::Spot, MarketType::Futures] {
            let routed = route(
                Operation::FetchClosedOrders,
                Some(market_type),
                &RouteOptions::default(),
            );
            assert!(routed.is_err());
        }
    }

    #[test]
    fn endpoint_urls_follow_surface_base() {
        let (_, endpoint) =
            route(Operation::CancelOrder, Some(MarketType::Futures), &RouteOptions::default())
                .unwrap();
        assert_eq!(
            endpoint.url("https://api.btse.com/"),
            "https://api.btse.com/futures/api/v2.1/order"
        );
        assert_eq!(
            Surface::SpotV2.base_url("https://api.btse.com"),
            "https://api.btse.com/spot/api/v2"
        );
    }

    #[test]
    fn market_type_parses_case_insensitively() {
        assert_eq!("SPOT".parse::<MarketType>().unwrap(), MarketType::Spot);
        assert_eq!("futures".parse::<MarketType>().unwrap(), MarketType::Futures);
        assert!("margin".parse::<MarketType>().is_err());
    }
}
