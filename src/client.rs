//! The BTSE venue adapter.
//!
//! [`Btse`] is the canonical interface over the three BTSE REST surfaces.
//! Each operation resolves its endpoint through the router, assembles the
//! request (query or JSON body), signs it when private, sends it through the
//! [`Transport`] and normalizes the response.
//!
//! Only [`load_markets`](Btse::load_markets) and
//! [`load_time_difference`](Btse::load_time_difference) mutate the adapter;
//! every other operation takes `&self`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::auth::{self, NonceSource};
use crate::config::{BtseConfig, RouteOptions};
use crate::credentials::Credentials;
use crate::http::{HttpRequest, Transport};
use crate::markets::MarketRegistry;
use crate::models::order::ALL_ORDER_CANCELLED_SUCCESS;
use crate::models::{
    Balances, CancelOutcome, Candle, Market, Order, OrderBook, OrderKind, OrderRequestBuilder,
    OrderSide, Ticker, Timeframe, Trade,
};
use crate::normalize::{self, Fields, fields};
use crate::router::{self, MarketType, Operation};
use crate::{BtseError, Result};

/// Dead-man switch window sent with a bulk cancel, in milliseconds.
const CANCEL_ALL_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Serialize)]
struct LeverageRequest<'a> {
    symbol: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    leverage: Decimal,
}

/// Optional inputs of [`Btse::create_order`].
#[derive(Debug, Clone, Default)]
pub struct OrderOptions {
    /// Limit price, stop trigger price or trail value depending on the type.
    pub price: Option<Decimal>,
    pub client_order_id: Option<String>,
    pub market_type: Option<MarketType>,
}

/// BTSE venue adapter over a [`Transport`].
#[derive(Debug)]
pub struct Btse<T> {
    host: String,
    credentials: Option<Credentials>,
    routes: RouteOptions,
    markets: MarketRegistry,
    nonce: NonceSource,
    transport: T,
}

impl<T: Transport> Btse<T> {
    /// Creates an adapter with an empty market registry and no clock offset.
    pub fn new(config: BtseConfig, transport: T) -> Self {
        Self {
            host: config.base_url.trim_end_matches('/').to_string(),
            credentials: config.credentials,
            routes: config.routes,
            markets: MarketRegistry::new(),
            nonce: NonceSource::default(),
            transport,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn markets(&self) -> &MarketRegistry {
        &self.markets
    }

    pub fn routes(&self) -> &RouteOptions {
        &self.routes
    }

    /// Local minus server time in milliseconds, as cached by the last
    /// [`load_time_difference`](Self::load_time_difference).
    pub fn clock_offset_ms(&self) -> i64 {
        self.nonce.clock_offset_ms()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Routes, assembles, signs and sends one request.
    ///
    /// `query` goes to the URL for GET and DELETE; `body` is serialized as
    /// JSON for POST.
    async fn request(
        &self,
        operation: Operation,
        requested: Option<MarketType>,
        query: &[(&'static str, String)],
        body: Option<Value>,
    ) -> Result<Value> {
        let (market_type, endpoint) = router::route(operation, requested, &self.routes)?;

        let mut url = endpoint.url(&self.host);
        let body = if endpoint.verb.has_body() {
            Some(serde_json::to_string(&body.unwrap_or_else(|| json!({})))?)
        } else {
            if !query.is_empty() {
                let mut parsed = reqwest::Url::parse(&url)
                    .map_err(|e| BtseError::Config(format!("invalid request url {url:?}: {e}")))?;
                parsed.query_pairs_mut().extend_pairs(query);
                url = parsed.to_string();
            }
            None
        };

        let headers = if endpoint.is_private() {
            let nonce = self.nonce.next();
            auth::sign(
                operation.as_str(),
                self.credentials.as_ref(),
                &self.host,
                &endpoint,
                nonce,
                body.as_deref(),
            )?
        } else {
            Vec::new()
        };

        debug!(
            operation = operation.as_str(),
            market_type = market_type.as_str(),
            verb = endpoint.verb.as_str(),
            url = %url,
            signed = endpoint.is_private(),
            "Sending request"
        );
        self.transport
            .send(HttpRequest {
                verb: endpoint.verb,
                url,
                headers,
                body,
            })
            .await
    }

    fn resolve(&self, operation: Operation, symbol: &str) -> Result<&Market> {
        self.markets.resolve(operation.as_str(), symbol)
    }

    /// Server time in epoch milliseconds.
    pub async fn fetch_time(&self, market_type: Option<MarketType>) -> Result<u64> {
        let operation = Operation::FetchTime;
        let response = self.request(operation, market_type, &[], None).await?;
        let epoch = Fields::new(operation.as_str(), &response)?.required_decimal("epoch")?;
        (epoch * Decimal::from(1000))
            .trunc()
            .to_u64()
            .ok_or_else(|| BtseError::malformed(operation.as_str(), "epoch", epoch))
    }

    /// Refreshes the cached clock offset used for request nonces.
    ///
    /// Returns the new offset (local minus server time, milliseconds).
    pub async fn load_time_difference(&mut self) -> Result<i64> {
        let server = self.fetch_time(None).await?;
        let offset = auth::now_millis() as i64 - server as i64;
        self.nonce.set_clock_offset_ms(offset);
        info!(offset_ms = offset, "Loaded time difference");
        Ok(offset)
    }

    /// Lists the markets of one product line.
    pub async fn fetch_markets(&self, market_type: MarketType) -> Result<Vec<Market>> {
        let operation = Operation::FetchMarkets;
        let response = self
            .request(operation, Some(market_type), &[], None)
            .await?;
        fields::array(operation.as_str(), &response)?
            .iter()
            .map(|entry| normalize::parse_market(operation.as_str(), entry, market_type))
            .collect()
    }

    /// Rebuilds the market registry from the spot and futures listings.
    ///
    /// The previous registry is kept if loading fails.
    ///
    /// # Errors
    ///
    /// Returns [`BtseError::Config`] if a venue id or symbol appears twice
    /// across both listings.
    pub async fn load_markets(&mut self) -> Result<&MarketRegistry> {
        let spot = self.fetch_markets(MarketType::Spot).await?;
        let futures = self.fetch_markets(MarketType::Futures).await?;
        let (spot_count, futures_count) = (spot.len(), futures.len());

        self.markets = MarketRegistry::from_markets(spot.into_iter().chain(futures))?;
        info!(
            spot = spot_count,
            futures = futures_count,
            "Loaded markets"
        );
        Ok(&self.markets)
    }

    pub async fn fetch_ticker(
        &self,
        symbol: &str,
        market_type: Option<MarketType>,
    ) -> Result<Ticker> {
        let operation = Operation::FetchTicker;
        let market = self.resolve(operation, symbol)?;
        let query = [("symbol", market.id.clone())];
        let response = self.request(operation, market_type, &query, None).await?;
        let entry = fields::first(operation.as_str(), &response)?;
        normalize::parse_ticker(
            operation.as_str(),
            entry,
            &self.markets,
            Some(market),
            auth::now_millis(),
        )
    }

    /// Tickers keyed by symbol, optionally restricted to `symbols`.
    pub async fn fetch_tickers(
        &self,
        symbols: Option<&[&str]>,
        market_type: Option<MarketType>,
    ) -> Result<BTreeMap<String, Ticker>> {
        let operation = Operation::FetchTickers;
        let response = self.request(operation, market_type, &[], None).await?;
        let received_at = auth::now_millis();

        let mut tickers = BTreeMap::new();
        for entry in fields::array(operation.as_str(), &response)? {
            let ticker = normalize::parse_ticker(
                operation.as_str(),
                entry,
                &self.markets,
                None,
                received_at,
            )?;
            if symbols.is_none_or(|wanted| wanted.contains(&ticker.symbol.as_str())) {
                tickers.insert(ticker.symbol.clone(), ticker);
            }
        }
        Ok(tickers)
    }

    pub async fn fetch_order_book(
        &self,
        symbol: &str,
        depth: Option<u32>,
        market_type: Option<MarketType>,
    ) -> Result<OrderBook> {
        let operation = Operation::FetchOrderBook;
        let market = self.resolve(operation, symbol)?;
        let mut query = vec![("symbol", market.id.clone())];
        if let Some(depth) = depth {
            query.push(("depth", depth.to_string()));
        }
        let response = self.request(operation, market_type, &query, None).await?;
        normalize::parse_order_book(operation.as_str(), &response, &market.symbol)
    }

    /// Public trades sorted by timestamp, filtered by `since` and `limit`.
    pub async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<u64>,
        limit: Option<usize>,
        market_type: Option<MarketType>,
    ) -> Result<Vec<Trade>> {
        let operation = Operation::FetchTrades;
        let market = self.resolve(operation, symbol)?;
        let mut query = vec![("symbol", market.id.clone())];
        if let Some(limit) = limit {
            query.push(("count", limit.to_string()));
        }
        let response = self.request(operation, market_type, &query, None).await?;
        let trades = fields::array(operation.as_str(), &response)?
            .iter()
            .map(|entry| {
                normalize::parse_trade(operation.as_str(), entry, &self.markets, Some(market))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(normalize::filter_by_since_limit(trades, since, limit))
    }

    /// Candles ending now. `since` is epoch milliseconds; the venue takes
    /// seconds for `start` and `end`.
    pub async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<u64>,
        limit: Option<usize>,
        market_type: Option<MarketType>,
    ) -> Result<Vec<Candle>> {
        let operation = Operation::FetchOhlcv;
        let market = self.resolve(operation, symbol)?;
        let mut query = vec![
            ("symbol", market.id.clone()),
            ("resolution", timeframe.resolution().to_string()),
            ("end", (auth::now_millis() / 1000).to_string()),
        ];
        if let Some(since) = since {
            query.push(("start", (since / 1000).to_string()));
        }
        let response = self.request(operation, market_type, &query, None).await?;
        let mut candles = fields::array(operation.as_str(), &response)?
            .iter()
            .map(|row| normalize::parse_candle(operation.as_str(), row))
            .collect::<Result<Vec<_>>>()?;
        candles.sort_by_key(|c| c.timestamp);
        if let Some(limit) = limit {
            candles.truncate(limit);
        }
        Ok(candles)
    }

    pub async fn fetch_balance(&self, market_type: Option<MarketType>) -> Result<Balances> {
        let operation = Operation::FetchBalance;
        let response = self.request(operation, market_type, &[], None).await?;
        normalize::parse_balance(operation.as_str(), &response)
    }

    /// Wallet history entries of type `Deposit`, unparsed.
    pub async fn fetch_deposits(&self, market_type: Option<MarketType>) -> Result<Vec<Value>> {
        let operation = Operation::FetchDeposits;
        let response = self.request(operation, market_type, &[], None).await?;
        Ok(fields::array(operation.as_str(), &response)?
            .iter()
            .filter(|entry| entry.get("type").and_then(Value::as_str) == Some("Deposit"))
            .cloned()
            .collect())
    }

    /// Submits an order.
    ///
    /// `order_type` is one of `LIMIT`, `MARKET`, `STOP`, `TRAILINGSTOP` in
    /// any case. The size is truncated and the price rounded to the market
    /// precision. Validation happens before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns [`BtseError::InvalidOrder`] for an unknown type, a missing
    /// price input or a non-positive size.
    pub async fn create_order(
        &self,
        symbol: &str,
        order_type: &str,
        side: OrderSide,
        size: Decimal,
        options: OrderOptions,
    ) -> Result<Order> {
        let operation = Operation::CreateOrder;
        let market = self.resolve(operation, symbol)?;
        let kind: OrderKind = order_type.parse()?;

        let size = market.amount_to_precision(operation.as_str(), size)?;
        let mut builder = OrderRequestBuilder::new(kind, side, &market.id, size);
        if let Some(price) = options.price {
            builder = builder.with_price(market.price_to_precision(operation.as_str(), price)?);
        }
        if let Some(id) = &options.client_order_id {
            builder = builder.with_client_order_id(id);
        }
        let request = builder.build()?;

        info!(
            symbol = %market.symbol,
            kind = kind.as_str(),
            side = ?side,
            size = %request.size,
            "Creating order"
        );
        let response = self
            .request(
                operation,
                options.market_type,
                &[],
                Some(serde_json::to_value(&request)?),
            )
            .await?;
        let entry = fields::first(operation.as_str(), &response)?;
        normalize::parse_order(operation.as_str(), entry, &self.markets, Some(market))
    }

    /// Cancels one order.
    ///
    /// A bulk acknowledgment (`ALL_ORDER_CANCELLED_SUCCESS`) is returned
    /// verbatim as [`CancelOutcome::AllCancelled`].
    pub async fn cancel_order(
        &self,
        id: &str,
        symbol: &str,
        market_type: Option<MarketType>,
    ) -> Result<CancelOutcome> {
        let operation = Operation::CancelOrder;
        let market = self.resolve(operation, symbol)?;
        let query = [("symbol", market.id.clone()), ("orderID", id.to_string())];
        info!(symbol = %market.symbol, order_id = id, "Cancelling order");
        let response = self.request(operation, market_type, &query, None).await?;

        let entry = fields::first(operation.as_str(), &response)?;
        if entry.get("message").and_then(Value::as_str) == Some(ALL_ORDER_CANCELLED_SUCCESS) {
            return Ok(CancelOutcome::AllCancelled(entry.clone()));
        }
        normalize::parse_order(operation.as_str(), entry, &self.markets, Some(market))
            .map(|order| CancelOutcome::Order(Box::new(order)))
    }

    /// Arms the venue's cancel-all-after timer for every open order.
    ///
    /// Returns the `result` object of the response, or `{}` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`BtseError::UnsupportedOperation`] when a symbol is given;
    /// per-symbol bulk cancellation has no defined venue contract.
    pub async fn cancel_all_orders(
        &self,
        symbol: Option<&str>,
        market_type: Option<MarketType>,
    ) -> Result<Value> {
        let operation = Operation::CancelAllOrders;
        if let Some(symbol) = symbol {
            return Err(BtseError::UnsupportedOperation {
                operation: operation.as_str(),
                reason: format!("per-symbol bulk cancellation (symbol {symbol:?})"),
            });
        }
        info!("Cancelling all orders");
        let response = self
            .request(
                operation,
                market_type,
                &[],
                Some(json!({ "timeout": CANCEL_ALL_TIMEOUT_MS })),
            )
            .await?;
        Ok(response.get("result").cloned().unwrap_or_else(|| json!({})))
    }

    /// Open orders for a market, optionally narrowed to one order id.
    pub async fn fetch_open_orders(
        &self,
        symbol: &str,
        order_id: Option<&str>,
        market_type: Option<MarketType>,
    ) -> Result<Vec<Order>> {
        let operation = Operation::FetchOpenOrders;
        let market = self.resolve(operation, symbol)?;
        let mut query = vec![("symbol", market.id.clone())];
        if let Some(id) = order_id {
            query.push(("orderID", id.to_string()));
        }
        let response = self.request(operation, market_type, &query, None).await?;
        fields::array(operation.as_str(), &response)?
            .iter()
            .map(|entry| {
                normalize::parse_order(operation.as_str(), entry, &self.markets, Some(market))
            })
            .collect()
    }

    /// Looks up one open order; `None` if the venue does not report it.
    pub async fn fetch_order(
        &self,
        id: &str,
        symbol: &str,
        market_type: Option<MarketType>,
    ) -> Result<Option<Order>> {
        let orders = self
            .fetch_open_orders(symbol, Some(id), market_type)
            .await?;
        Ok(orders.into_iter().next())
    }

    /// Always fails: closed-order retrieval has no defined venue contract.
    pub async fn fetch_closed_orders(&self, symbol: &str) -> Result<Vec<Order>> {
        let operation = Operation::FetchClosedOrders;
        self.resolve(operation, symbol)?;
        router::route(operation, None, &self.routes)?;
        Err(BtseError::UnsupportedOperation {
            operation: operation.as_str(),
            reason: "no closed-order endpoint".to_string(),
        })
    }

    /// Sets leverage for a futures market. Returns the raw response.
    pub async fn set_leverage(
        &self,
        symbol: &str,
        leverage: Decimal,
        market_type: Option<MarketType>,
    ) -> Result<Value> {
        let operation = Operation::SetLeverage;
        let market = self.resolve(operation, symbol)?;
        if leverage <= Decimal::ZERO {
            return Err(BtseError::InvalidOrder {
                operation: operation.as_str(),
                reason: format!("leverage must be positive, got {leverage}"),
            });
        }
        let body = serde_json::to_value(LeverageRequest {
            symbol: &market.id,
            leverage,
        })?;
        info!(symbol = %market.symbol, leverage = %leverage, "Setting leverage");
        self.request(operation, market_type, &[], Some(body)).await
    }
}
