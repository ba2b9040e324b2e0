//! Market registry: canonical symbols ↔ venue market ids.
//!
//! Built from the spot and futures `market_summary` listings and replaced
//! wholesale on reload. Symbols are unique and every venue id maps to
//! exactly one symbol.

use std::collections::HashMap;

use crate::models::Market;
use crate::{BtseError, Result};

/// Result of looking up a venue market id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IdLookup<'a> {
    Known(&'a Market),
    /// The id is not registered (e.g. a delisted market); carried unchanged.
    Unknown(&'a str),
}

impl<'a> IdLookup<'a> {
    /// Canonical symbol for a known market, otherwise the raw id.
    pub fn symbol(&self) -> &'a str {
        match self {
            Self::Known(market) => &market.symbol,
            Self::Unknown(id) => id,
        }
    }

    pub fn market(&self) -> Option<&'a Market> {
        match self {
            Self::Known(market) => Some(market),
            Self::Unknown(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarketRegistry {
    by_symbol: HashMap<String, Market>,
    symbol_by_id: HashMap<String, String>,
}

impl MarketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from markets gathered across surfaces.
    ///
    /// # Errors
    ///
    /// Returns [`BtseError::Config`] if two markets share a venue id or a
    /// canonical symbol.
    pub fn from_markets(markets: impl IntoIterator<Item = Market>) -> Result<Self> {
        let mut registry = Self::new();
        for market in markets {
            registry.insert(market)?;
        }
        Ok(registry)
    }

    fn insert(&mut self, market: Market) -> Result<()> {
        if let Some(existing) = self.symbol_by_id.get(&market.id) {
            return Err(BtseError::Config(format!(
                "duplicate venue market id {:?} ({} and {} {})",
                market.id, existing, market.market_type, market.symbol
            )));
        }
        if self.by_symbol.contains_key(&market.symbol) {
            return Err(BtseError::Config(format!(
                "duplicate market symbol {:?} (venue id {:?})",
                market.symbol, market.id
            )));
        }
        self.symbol_by_id
            .insert(market.id.clone(), market.symbol.clone());
        self.by_symbol.insert(market.symbol.clone(), market);
        Ok(())
    }

    /// Resolves a canonical symbol.
    ///
    /// # Errors
    ///
    /// Returns [`BtseError::UnknownMarket`] naming `operation` if the symbol
    /// was never loaded.
    pub fn resolve(&self, operation: &'static str, symbol: &str) -> Result<&Market> {
        self.by_symbol
            .get(symbol)
            .ok_or_else(|| BtseError::UnknownMarket {
                operation,
                symbol: symbol.to_string(),
            })
    }

    /// Looks up a venue market id. Never fails.
    pub fn lookup_by_id<'a>(&'a self, id: &'a str) -> IdLookup<'a> {
        match self
            .symbol_by_id
            .get(id)
            .and_then(|symbol| self.by_symbol.get(symbol))
        {
            Some(market) => IdLookup::Known(market),
            None => IdLookup::Unknown(id),
        }
    }

    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.by_symbol.values()
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}
