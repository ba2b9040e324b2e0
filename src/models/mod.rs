//! Canonical entities returned by the adapter.
//!
//! Every entity is an immutable value built fresh per call. Attributes the
//! venue did not report are `None`; nothing is defaulted or guessed. Each
//! entity that comes from a single venue object keeps that object in
//! `info`.

pub mod balance;
pub mod book;
pub mod candle;
pub mod create_order;
pub mod market;
pub mod order;
pub mod ticker;
pub mod trade;

pub use balance::{Balance, Balances};
pub use book::{OrderBook, PriceLevel};
pub use candle::{Candle, Timeframe};
pub use create_order::{OrderKind, OrderRequest, OrderRequestBuilder, OrderSide};
pub use market::{Limits, Market, MinMax, Precision};
pub use order::{CancelOutcome, Order, OrderStatus, OrderType};
pub use ticker::Ticker;
pub use trade::Trade;
