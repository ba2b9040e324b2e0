//! Account balance models.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

/// Balance of a single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Balance {
    pub total: Option<Decimal>,
    pub free: Option<Decimal>,
    /// `total - free` when both are known.
    pub used: Option<Decimal>,
}

/// Account snapshot keyed by currency code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Balances {
    pub currencies: BTreeMap<String, Balance>,
    /// Raw venue response, kept for audit.
    pub info: serde_json::Value,
}

impl Balances {
    pub fn get(&self, code: &str) -> Option<&Balance> {
        self.currencies.get(code)
    }
}
