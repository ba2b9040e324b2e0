//! Crate-level error types.
//!
//! [`BtseError`] unifies every failure the adapter can surface (routing,
//! signing, order validation, response decoding, transport) behind a single
//! enum. Each variant carries the operation that failed and the value that
//! was rejected so a failure is readable without re-running under tracing.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BtseError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum BtseError {
    /// The canonical symbol was never loaded into the market registry.
    #[error("{operation}: unknown market {symbol:?}")]
    UnknownMarket {
        operation: &'static str,
        symbol: String,
    },

    /// The router has no endpoint for this operation and market type.
    #[error("{operation} is not supported: {reason}")]
    UnsupportedOperation {
        operation: &'static str,
        reason: String,
    },

    /// A private call was attempted without usable credentials.
    #[error("{operation}: authentication error: {reason}")]
    Authentication {
        operation: &'static str,
        reason: String,
    },

    /// The order type is unsupported or a field it requires is missing.
    #[error("{operation}: invalid order: {reason}")]
    InvalidOrder {
        operation: &'static str,
        reason: String,
    },

    /// A venue payload did not have the shape or value the normalizer expects.
    #[error("{operation}: malformed response field {field:?}: {value}")]
    MalformedResponse {
        operation: &'static str,
        field: String,
        value: String,
    },

    /// The HTTP transport failed; passed through unchanged.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Configuration could not be loaded, or the loaded markets are inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BtseError {
    pub(crate) fn malformed(
        operation: &'static str,
        field: impl Into<String>,
        value: impl std::fmt::Display,
    ) -> Self {
        Self::MalformedResponse {
            operation,
            field: field.into(),
            value: value.to_string(),
        }
    }
}
