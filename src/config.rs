//! Application configuration loaded from environment variables.
//!
//! Credentials are optional and read from:
//! - `BTSE_API_KEY`: API key sent in the `btse-api` header
//! - `BTSE_API_SECRET`: secret used to key the request signature
//!
//! `BTSE_BASE_URL` overrides the venue host (e.g. the testnet),
//! `BTSE_DEFAULT_TYPE` sets the global market type and `BTSE_ROUTES_FILE`
//! points at a JSON file with per-operation market type defaults.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::credentials::Credentials;
use crate::router::{MarketType, Operation};

/// Default production REST host.
pub const DEFAULT_BASE_URL: &str = "https://api.btse.com";

/// Testnet REST host.
pub const TESTNET_BASE_URL: &str = "https://testapi.btse.io";

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub btse: BtseConfig,
}

/// BTSE-specific configuration values.
#[derive(Debug)]
pub struct BtseConfig {
    pub base_url: String,
    pub credentials: Option<Credentials>,
    pub routes: RouteOptions,
}

/// Market type defaults consulted by the endpoint router.
///
/// Loaded once and never mutated; the adapter owns its snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteOptions {
    /// Global default used when neither the call nor `operations` names a type.
    #[serde(default)]
    pub default_type: MarketType,
    /// Per-operation overrides of `default_type`.
    #[serde(default)]
    pub operations: HashMap<Operation, MarketType>,
}

impl RouteOptions {
    /// Loads routing options from a JSON file.
    ///
    /// ```json
    /// { "default_type": "spot", "operations": { "fetch_ticker": "futures" } }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::BtseError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let options: Self = serde_json::from_str(&contents)?;
        Ok(options)
    }

    /// Sets the per-operation default for `operation`.
    #[must_use]
    pub fn with_operation(mut self, operation: Operation, market_type: MarketType) -> Self {
        self.operations.insert(operation, market_type);
        self
    }
}

/// Loads the application configuration from environment variables.
///
/// The host defaults to `https://api.btse.com`. API credentials are
/// optional (public data only) but when one is set both must be present.
/// `BTSE_DEFAULT_TYPE`, when set, overrides the routes file's default.
///
/// # Errors
///
/// Returns [`BtseError::Config`](crate::BtseError::Config) if only one of
/// the two credential variables is set, the default type is not `spot` or
/// `futures`, or the routes file cannot be loaded.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let base_url = non_empty_var("BTSE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let api_key = non_empty_var("BTSE_API_KEY");
    let api_secret = non_empty_var("BTSE_API_SECRET");

    let credentials = match (api_key, api_secret) {
        (Some(key), Some(secret)) => Some(Credentials::new(key, secret)),
        (Some(_), None) => {
            return Err(crate::BtseError::Config(
                "BTSE_API_KEY is set but BTSE_API_SECRET is missing".to_string(),
            ));
        }
        (None, Some(_)) => {
            return Err(crate::BtseError::Config(
                "BTSE_API_SECRET is set but BTSE_API_KEY is missing".to_string(),
            ));
        }
        (None, None) => None,
    };

    let mut routes = match non_empty_var("BTSE_ROUTES_FILE") {
        Some(path) => RouteOptions::load(Path::new(&path))?,
        None => RouteOptions::default(),
    };
    if let Some(default_type) = non_empty_var("BTSE_DEFAULT_TYPE") {
        routes.default_type = default_type.parse()?;
    }

    Ok(AppConfig {
        btse: BtseConfig {
            base_url,
            credentials,
            routes,
        },
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
