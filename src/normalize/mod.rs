//! Response normalizer: raw venue payloads → canonical entities.
//!
//! One pure function per entity kind. Symbols are resolved through the
//! [`MarketRegistry`]; unknown venue ids pass through unchanged. Fields the
//! venue omits stay `None`.

pub mod fields;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::warn;

pub use fields::Fields;

use crate::markets::MarketRegistry;
use crate::models::{
    Balance, Balances, Candle, Limits, Market, MinMax, Order, OrderBook, OrderStatus, OrderType,
    Precision, PriceLevel, Ticker, Trade,
};
use crate::router::MarketType;
use crate::{BtseError, Result};

/// Parses one `market_summary` entry.
///
/// Spot markets get `BASE/QUOTE`; futures markets get `BASE/QUOTE:<id>` so
/// a perpetual never shadows the spot pair with the same currencies.
pub fn parse_market(
    operation: &'static str,
    value: &Value,
    market_type: MarketType,
) -> Result<Market> {
    let f = Fields::new(operation, value)?;
    let id = f.required_string("symbol")?;
    let base_id = f.required_string("base")?;
    let quote_id = f.required_string("quote")?;
    let base = base_id.to_ascii_uppercase();
    let quote = quote_id.to_ascii_uppercase();
    let symbol = match market_type {
        MarketType::Spot => format!("{base}/{quote}"),
        MarketType::Futures => format!("{base}/{quote}:{id}"),
    };

    Ok(Market {
        symbol,
        base,
        quote,
        base_id,
        quote_id,
        market_type,
        active: f.boolean("active")?,
        precision: Precision {
            price: f.decimal("minPriceIncrement")?,
            amount: f.decimal("minSizeIncrement")?,
        },
        limits: Limits {
            amount: MinMax {
                min: f.decimal("minOrderSize")?,
                max: f.decimal("maxOrderSize")?,
            },
            price: MinMax {
                min: f.decimal("minValidPrice")?,
                max: None,
            },
        },
        id,
        info: value.clone(),
    })
}

/// Canonical symbol for a payload: the caller's market when given,
/// otherwise the payload's venue id resolved with pass-through.
fn payload_symbol(
    f: &Fields<'_>,
    registry: &MarketRegistry,
    market: Option<&Market>,
) -> Result<Option<String>> {
    if let Some(market) = market {
        return Ok(Some(market.symbol.clone()));
    }
    Ok(f
        .string("symbol")?
        .map(|id| registry.lookup_by_id(&id).symbol().to_string()))
}

/// Parses one `market_summary` entry as a ticker stamped with `received_at`.
pub fn parse_ticker(
    operation: &'static str,
    value: &Value,
    registry: &MarketRegistry,
    market: Option<&Market>,
    received_at: u64,
) -> Result<Ticker> {
    let f = Fields::new(operation, value)?;
    let symbol = payload_symbol(&f, registry, market)?
        .ok_or_else(|| BtseError::malformed(operation, "symbol", "missing"))?;

    Ok(Ticker {
        symbol,
        timestamp: received_at,
        high: f.decimal("high24Hr")?,
        low: f.decimal("low24Hr")?,
        bid: f.decimal("highestBid")?,
        bid_volume: None,
        ask: f.decimal("lowestAsk")?,
        ask_volume: None,
        vwap: None,
        open: None,
        close: None,
        last: f.decimal("last")?,
        change: None,
        percentage: f.decimal("percentageChange")?,
        average: None,
        base_volume: None,
        quote_volume: f.decimal("volume")?,
        info: value.clone(),
    })
}

fn parse_levels(operation: &'static str, f: &Fields<'_>, key: &str) -> Result<Vec<PriceLevel>> {
    let Some(value) = f.value(key) else {
        return Ok(Vec::new());
    };
    fields::array(operation, value)?
        .iter()
        .map(|level| {
            let level = Fields::new(operation, level)?;
            Ok(PriceLevel {
                price: level.required_decimal("price")?,
                size: level.required_decimal("size")?,
            })
        })
        .collect()
}

/// Sorts levels (descending for bids) and keeps the first level per price.
fn sort_levels(levels: &mut Vec<PriceLevel>, descending: bool) {
    if descending {
        levels.sort_by(|a, b| b.price.cmp(&a.price));
    } else {
        levels.sort_by(|a, b| a.price.cmp(&b.price));
    }
    levels.dedup_by(|later, earlier| later.price == earlier.price);
}

/// Parses an `orderbook/L2` snapshot. The venue timestamp doubles as the
/// snapshot nonce.
pub fn parse_order_book(operation: &'static str, value: &Value, symbol: &str) -> Result<OrderBook> {
    let f = Fields::new(operation, value)?;
    let mut bids = parse_levels(operation, &f, "buyQuote")?;
    let mut asks = parse_levels(operation, &f, "sellQuote")?;
    sort_levels(&mut bids, true);
    sort_levels(&mut asks, false);
    let timestamp = f.integer("timestamp")?;

    Ok(OrderBook {
        symbol: symbol.to_string(),
        timestamp,
        bids,
        asks,
        nonce: timestamp,
    })
}

fn positive(
    operation: &'static str,
    field: &str,
    value: Option<Decimal>,
) -> Result<Option<Decimal>> {
    match value {
        Some(v) if v <= Decimal::ZERO => Err(BtseError::malformed(operation, field, v)),
        other => Ok(other),
    }
}

/// Parses a public or own trade.
pub fn parse_trade(
    operation: &'static str,
    value: &Value,
    registry: &MarketRegistry,
    market: Option<&Market>,
) -> Result<Trade> {
    let f = Fields::new(operation, value)?;
    let symbol = payload_symbol(&f, registry, market)?
        .ok_or_else(|| BtseError::malformed(operation, "symbol", "missing"))?;

    Ok(Trade {
        id: f.string("serialId")?,
        order: f.string("orderID")?,
        symbol,
        side: f.string("side")?.map(|s| s.to_ascii_lowercase()),
        price: positive(operation, "price", f.decimal("price")?)?,
        amount: positive(operation, "size", f.decimal("size")?)?,
        fee: f.decimal("feeAmount")?,
        timestamp: f.integer("timestamp")?,
        info: value.clone(),
    })
}

/// Parses an order, applying the status and type code tables.
///
/// `remaining` is `amount - filled` when both are reported; `cost` is
/// `filled * price` only for a non-zero fill with a known price.
pub fn parse_order(
    operation: &'static str,
    value: &Value,
    registry: &MarketRegistry,
    market: Option<&Market>,
) -> Result<Order> {
    let f = Fields::new(operation, value)?;
    let id = f.string("orderID")?;

    let status = f.string("status")?.map(|code| OrderStatus::from_code(&code));
    if let Some(status @ OrderStatus::Unrecognized(_)) = &status {
        warn!(operation, order_id = ?id, status = %status, "Unrecognized order status code");
    }
    let order_type = f.string("orderType")?.map(|code| OrderType::from_code(&code));
    if let Some(order_type @ OrderType::Unrecognized(_)) = &order_type {
        warn!(operation, order_id = ?id, order_type = %order_type, "Unrecognized order type code");
    }

    let amount = f.decimal("size")?;
    let filled = f.decimal("fillSize")?;
    let average = f.decimal("averageFillPrice")?;
    let price = match f.decimal("price")? {
        Some(price) => Some(price),
        None => f.decimal("triggerPrice")?.or(average),
    };
    let remaining = amount
        .zip(filled)
        .map(|(amount, filled)| {
            amount
                .checked_sub(filled)
                .ok_or_else(|| BtseError::malformed(operation, "remaining", value))
        })
        .transpose()?;
    let cost = match (filled, price) {
        (Some(filled), Some(price)) if !filled.is_zero() => Some(
            filled
                .checked_mul(price)
                .ok_or_else(|| BtseError::malformed(operation, "cost", value))?,
        ),
        _ => None,
    };

    Ok(Order {
        id,
        timestamp: f.integer("timestamp")?,
        symbol: payload_symbol(&f, registry, market)?,
        order_type,
        side: f.string("side")?.map(|s| s.to_ascii_lowercase()),
        price,
        amount,
        filled,
        remaining,
        average,
        cost,
        status,
        info: value.clone(),
    })
}

/// Parses a `user/wallet` response into per-currency balances.
pub fn parse_balance(operation: &'static str, value: &Value) -> Result<Balances> {
    let mut currencies = BTreeMap::new();
    for entry in fields::array(operation, value)? {
        let f = Fields::new(operation, entry)?;
        let code = f.required_string("currency")?.to_ascii_uppercase();
        let total = f.decimal("total")?;
        let free = f.decimal("available")?;
        let used = total
            .zip(free)
            .map(|(total, free)| {
                total
                    .checked_sub(free)
                    .ok_or_else(|| BtseError::malformed(operation, "used", entry))
            })
            .transpose()?;
        currencies.insert(code, Balance { total, free, used });
    }
    Ok(Balances {
        currencies,
        info: value.clone(),
    })
}

/// Parses one `[time, open, high, low, close, volume]` row.
pub fn parse_candle(operation: &'static str, value: &Value) -> Result<Candle> {
    let row = fields::array(operation, value)?;
    let column = |index: usize, name: &str| -> Result<Option<Decimal>> {
        match row.get(index) {
            Some(v) => fields::parse_decimal(operation, name, v),
            None => Ok(None),
        }
    };
    let timestamp = row
        .first()
        .map(|v| fields::parse_integer(operation, "time", v))
        .transpose()?
        .flatten()
        .ok_or_else(|| BtseError::malformed(operation, "time", value))?;

    Ok(Candle {
        timestamp,
        open: column(1, "open")?,
        high: column(2, "high")?,
        low: column(3, "low")?,
        close: column(4, "close")?,
        volume: column(5, "volume")?,
    })
}

/// Sorts trades by timestamp, drops those before `since` and keeps at most
/// `limit` from the start.
pub fn filter_by_since_limit(
    mut trades: Vec<Trade>,
    since: Option<u64>,
    limit: Option<usize>,
) -> Vec<Trade> {
    trades.sort_by_key(|t| t.timestamp);
    if let Some(since) = since {
        trades.retain(|t| t.timestamp.is_some_and(|ts| ts >= since));
    }
    if let Some(limit) = limit {
        trades.truncate(limit);
    }
    trades
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    fn registry() -> MarketRegistry {
        let spot = parse_market(
            "load_markets",
            &json!({ "symbol": "BTC-USD", "base": "BTC", "quote": "USD", "active": true }),
            MarketType::Spot,
        )
        .unwrap();
        MarketRegistry::from_markets([spot]).unwrap()
    }

    #[test]
    fn spot_and_futures_market_symbols() {
        let raw = json!({
            "symbol": "BTCPFC",
            "base": "btc",
            "quote": "usd",
            "active": true,
            "minPriceIncrement": 0.5,
            "minSizeIncrement": "1",
            "minOrderSize": 1,
            "maxOrderSize": 1000000,
            "minValidPrice": 0.5
        });
        let futures = parse_market("fetch_markets", &raw, MarketType::Futures).unwrap();
        assert_eq!(futures.id, "BTCPFC");
        assert_eq!(futures.symbol, "BTC/USD:BTCPFC");
        assert_eq!(futures.base, "BTC");
        assert_eq!(futures.base_id, "btc");
        assert_eq!(futures.precision.price, Some(dec!(0.5)));
        assert_eq!(futures.limits.amount.max, Some(dec!(1000000)));
        assert_eq!(futures.limits.price.min, Some(dec!(0.5)));
        assert_eq!(futures.limits.price.max, None);

        let spot = parse_market("fetch_markets", &raw, MarketType::Spot).unwrap();
        assert_eq!(spot.symbol, "BTC/USD");
    }

    #[test]
    fn market_without_id_is_malformed() {
        let err = parse_market("fetch_markets", &json!({ "base": "BTC" }), MarketType::Spot)
            .unwrap_err();
        assert!(err.to_string().contains("\"symbol\""));
    }

    #[test]
    fn ticker_maps_fields_and_leaves_unreported_unset() {
        let raw = json!({
            "symbol": "BTC-USD",
            "last": 7568.0,
            "lowestAsk": "7568.5",
            "highestBid": "7567.5",
            "percentageChange": -1.2,
            "volume": 1336.35,
            "high24Hr": 7700,
            "low24Hr": 7400.25
        });
        let ticker =
            parse_ticker("fetch_ticker", &raw, &registry(), None, 1_700_000_000_000).unwrap();
        assert_eq!(ticker.symbol, "BTC/USD");
        assert_eq!(ticker.timestamp, 1_700_000_000_000);
        assert_eq!(ticker.bid, Some(dec!(7567.5)));
        assert_eq!(ticker.ask, Some(dec!(7568.5)));
        assert_eq!(ticker.high, Some(dec!(7700)));
        assert_eq!(ticker.quote_volume, Some(dec!(1336.35)));
        assert_eq!(ticker.percentage, Some(dec!(-1.2)));
        assert_eq!(ticker.vwap, None);
        assert_eq!(ticker.base_volume, None);
        assert_eq!(ticker.info, raw);
    }

    #[test]
    fn ticker_with_unknown_id_passes_through() {
        let raw = json!({ "symbol": "LUNA-USD", "last": "1" });
        let ticker = parse_ticker("fetch_tickers", &raw, &registry(), None, 0).unwrap();
        assert_eq!(ticker.symbol, "LUNA-USD");
    }

    #[test]
    fn order_book_sorted_deduplicated_and_stamped() {
        let raw = json!({
            "buyQuote": [
                { "price": "100", "size": "1" },
                { "price": "102", "size": "2" },
                { "price": "101", "size": "3" },
                { "price": "102", "size": "9" }
            ],
            "sellQuote": [
                { "price": "105", "size": "1" },
                { "price": "103", "size": "2" },
                { "price": "104", "size": "3" },
                { "price": "103", "size": "8" }
            ],
            "timestamp": 1587685195324u64,
            "symbol": "BTC-USD"
        });
        let book = parse_order_book("fetch_order_book", &raw, "BTC/USD").unwrap();

        let bids: Vec<_> = book.bids.iter().map(|l| l.price).collect();
        let asks: Vec<_> = book.asks.iter().map(|l| l.price).collect();
        assert_eq!(bids, vec![dec!(102), dec!(101), dec!(100)]);
        assert_eq!(asks, vec![dec!(103), dec!(104), dec!(105)]);
        // first occurrence wins
        assert_eq!(book.bids[0].size, dec!(2));
        assert_eq!(book.asks[0].size, dec!(2));
        assert_eq!(book.timestamp, Some(1_587_685_195_324));
        assert_eq!(book.nonce, book.timestamp);
    }

    #[test]
    fn order_book_missing_sides_are_empty() {
        let book = parse_order_book("fetch_order_book", &json!({}), "BTC/USD").unwrap();
        assert!(book.bids.is_empty());
        assert!(book.asks.is_empty());
        assert_eq!(book.nonce, None);
    }

    #[test]
    fn trade_fields_and_positive_check() {
        let raw = json!({
            "price": "7568.5",
            "size": 0.25,
            "side": "SELL",
            "symbol": "BTC-USD",
            "serialId": 131840942,
            "timestamp": 1587685195324u64
        });
        let trade = parse_trade("fetch_trades", &raw, &registry(), None).unwrap();
        assert_eq!(trade.id.as_deref(), Some("131840942"));
        assert_eq!(trade.symbol, "BTC/USD");
        assert_eq!(trade.side.as_deref(), Some("sell"));
        assert_eq!(trade.amount, Some(dec!(0.25)));
        assert_eq!(trade.order, None);

        let zero = json!({ "price": "0", "size": 1, "symbol": "BTC-USD" });
        let err = parse_trade("fetch_trades", &zero, &registry(), None).unwrap_err();
        assert!(matches!(err, BtseError::MalformedResponse { .. }));
    }

    #[test]
    fn order_arithmetic_and_tables() {
        let raw = json!({
            "orderID": "abc-123",
            "symbol": "BTC-USD",
            "orderType": 76,
            "side": "BUY",
            "price": "7500",
            "size": "2",
            "fillSize": "0.5",
            "averageFillPrice": "7499",
            "status": 5,
            "timestamp": 1587685195324u64
        });
        let order = parse_order("fetch_open_orders", &raw, &registry(), None).unwrap();
        assert_eq!(order.symbol.as_deref(), Some("BTC/USD"));
        assert_eq!(order.status, Some(OrderStatus::Open));
        assert_eq!(order.order_type, Some(OrderType::Limit));
        assert_eq!(order.side.as_deref(), Some("buy"));
        assert_eq!(order.remaining, Some(dec!(1.5)));
        assert_eq!(order.cost, Some(dec!(3750)));
    }

    #[test]
    fn order_cost_unset_without_fill() {
        let raw = json!({ "orderID": "1", "price": 10, "size": 1, "fillSize": 0, "status": 2 });
        let order = parse_order("create_order", &raw, &registry(), None).unwrap();
        assert_eq!(order.remaining, Some(dec!(1)));
        assert_eq!(order.cost, None);
        assert_eq!(order.status, Some(OrderStatus::Created));
        assert_eq!(order.symbol, None);
    }

    #[test]
    fn order_price_falls_back_to_trigger_then_average() {
        let trigger = json!({ "triggerPrice": "6000", "averageFillPrice": "5990" });
        let order = parse_order("fetch_order", &trigger, &registry(), None).unwrap();
        assert_eq!(order.price, Some(dec!(6000)));

        let average = json!({ "averageFillPrice": "5990", "fillSize": "1" });
        let order = parse_order("fetch_order", &average, &registry(), None).unwrap();
        assert_eq!(order.price, Some(dec!(5990)));
        assert_eq!(order.cost, Some(dec!(5990)));
        assert_eq!(order.remaining, None);
    }

    #[test]
    fn order_unknown_codes_pass_through() {
        let raw = json!({ "orderID": "1", "status": 99, "orderType": 81, "symbol": "ETH-BTC" });
        let order = parse_order("fetch_order", &raw, &registry(), None).unwrap();
        assert_eq!(order.status, Some(OrderStatus::Unrecognized("99".into())));
        assert_eq!(order.order_type, Some(OrderType::Unrecognized("81".into())));
        assert_eq!(order.symbol.as_deref(), Some("ETH-BTC"));
    }

    #[test]
    fn order_malformed_number_names_field() {
        let raw = json!({ "orderID": "1", "size": "two" });
        let err = parse_order("create_order", &raw, &registry(), None).unwrap_err();
        assert!(err.to_string().contains("create_order"));
        assert!(err.to_string().contains("two"));
    }

    #[test]
    fn order_arithmetic_overflow_is_malformed() {
        let raw = json!({
            "orderID": "1",
            "price": "100000000000000",
            "size": "1000000000000000",
            "fillSize": "1000000000000000"
        });
        let err = parse_order("fetch_open_orders", &raw, &registry(), None).unwrap_err();
        assert!(matches!(
            err,
            BtseError::MalformedResponse { ref field, .. } if field == "cost"
        ));

        let raw = json!({
            "orderID": "2",
            "size": "-79228162514264337593543950335",
            "fillSize": "79228162514264337593543950335"
        });
        let err = parse_order("fetch_open_orders", &raw, &registry(), None).unwrap_err();
        assert!(matches!(
            err,
            BtseError::MalformedResponse { ref field, .. } if field == "remaining"
        ));
    }

    #[test]
    fn balance_used_is_total_minus_free() {
        let raw = json!([
            { "currency": "btc", "total": "1.5", "available": "1.25" },
            { "currency": "USD", "total": 100, "available": null }
        ]);
        let balances = parse_balance("fetch_balance", &raw).unwrap();
        let btc = balances.get("BTC").unwrap();
        assert_eq!(btc.used, Some(dec!(0.25)));
        let usd = balances.get("USD").unwrap();
        assert_eq!(usd.free, None);
        assert_eq!(usd.used, None);
        assert_eq!(balances.info, raw);
    }

    #[test]
    fn balance_overflow_is_malformed() {
        let raw = json!([{
            "currency": "USD",
            "total": "-79228162514264337593543950335",
            "available": "79228162514264337593543950335"
        }]);
        let err = parse_balance("fetch_balance", &raw).unwrap_err();
        assert!(matches!(
            err,
            BtseError::MalformedResponse { ref field, .. } if field == "used"
        ));
    }

    #[test]
    fn candle_rows() {
        let row = json!([1587682800, "7500", 7600, 7400, "7550", 12.5]);
        let candle = parse_candle("fetch_ohlcv", &row).unwrap();
        assert_eq!(candle.timestamp, 1_587_682_800);
        assert_eq!(candle.close, Some(dec!(7550)));
        assert_eq!(candle.volume, Some(dec!(12.5)));
        assert!(parse_candle("fetch_ohlcv", &json!([])).is_err());
    }

    #[test]
    fn since_and_limit_filtering() {
        let registry = registry();
        let trades: Vec<Trade> = [30u64, 10, 20, 40]
            .iter()
            .map(|ts| {
                parse_trade(
                    "fetch_trades",
                    &json!({ "symbol": "BTC-USD", "price": 1, "size": 1, "timestamp": ts }),
                    &registry,
                    None,
                )
                .unwrap()
            })
            .collect();
        let filtered = filter_by_since_limit(trades, Some(20), Some(2));
        let stamps: Vec<_> = filtered.iter().map(|t| t.timestamp.unwrap()).collect();
        assert_eq!(stamps, vec![20, 30]);
    }
}
