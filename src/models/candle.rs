//! OHLCV candle models.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::BtseError;

/// OHLCV data for a single interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Candle {
    /// Interval start as reported by the venue.
    pub timestamp: u64,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<Decimal>,
}

/// Candle resolutions supported by the `ohlcv` endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    M1,
    M3,
    M5,
    M15,
    M30,
    H1,
    H2,
    H4,
    H6,
    H9,
    D1,
    W1,
    Month1,
    Y1,
}

impl Timeframe {
    /// Resolution parameter in minutes, as the venue expects it.
    ///
    /// `9h` maps to 720 minutes on the venue side.
    pub fn resolution(self) -> &'static str {
        match self {
            Self::M1 => "1",
            Self::M3 => "3",
            Self::M5 => "5",
            Self::M15 => "15",
            Self::M30 => "30",
            Self::H1 => "60",
            Self::H2 => "120",
            Self::H4 => "240",
            Self::H6 => "360",
            Self::H9 => "720",
            Self::D1 => "1440",
            Self::W1 => "10080",
            Self::Month1 => "43800",
            Self::Y1 => "525600",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M3 => "3m",
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::M30 => "30m",
            Self::H1 => "1h",
            Self::H2 => "2h",
            Self::H4 => "4h",
            Self::H6 => "6h",
            Self::H9 => "9h",
            Self::D1 => "1d",
            Self::W1 => "1w",
            Self::Month1 => "1M",
            Self::Y1 => "1Y",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = BtseError;

    fn from_str(s: &str) -> crate::Result<Self> {
        let timeframe = match s {
            "1m" => Self::M1,
            "3m" => Self::M3,
            "5m" => Self::M5,
            "15m" => Self::M15,
            "30m" => Self::M30,
            "1h" => Self::H1,
            "2h" => Self::H2,
            "4h" => Self::H4,
            "6h" => Self::H6,
            "9h" => Self::H9,
            "1d" => Self::D1,
            "1w" => Self::W1,
            "1M" => Self::Month1,
            "1Y" => Self::Y1,
            other => {
                return Err(BtseError::UnsupportedOperation {
                    operation: "fetch_ohlcv",
                    reason: format!("timeframe {other:?}"),
                });
            }
        };
        Ok(timeframe)
    }
}
