//! BTSE venue adapter.
//!
//! One canonical trading interface (markets, tickers, order books, trades,
//! balances, orders) over BTSE's spot v3 and futures v2 REST surfaces.
//! Operations are routed per call, private requests are HMAC-SHA384 signed
//! and every response is normalized into the types in [`models`].

pub mod auth;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod markets;
pub mod models;
pub mod normalize;
pub mod router;

pub use client::{Btse, OrderOptions};
pub use error::{BtseError, Result};
