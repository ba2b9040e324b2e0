//! Shared test utilities: a recording mock transport and JSON fixtures.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

use btse_venue::config::{BtseConfig, DEFAULT_BASE_URL, RouteOptions};
use btse_venue::credentials::Credentials;
use btse_venue::http::{HttpRequest, Transport};
use btse_venue::{Btse, BtseError, Result};
use serde_json::Value;

/// Transport that records every request and replays queued responses.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Value>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn push(&self, response: Value) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<Value> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| BtseError::Config("mock transport has no queued response".into()))
    }
}

/// Reads `tests/fixtures/<name>`.
pub fn fixture(name: &str) -> Value {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "fixtures", name]
        .iter()
        .collect();
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
    serde_json::from_str(&text).expect("fixture is not valid JSON")
}

pub fn config(credentials: Option<Credentials>, routes: RouteOptions) -> BtseConfig {
    BtseConfig {
        base_url: DEFAULT_BASE_URL.to_string(),
        credentials,
        routes,
    }
}

pub fn test_credentials() -> Credentials {
    Credentials::new("test-key", "test-secret")
}

/// Adapter with credentials and markets loaded from the summary fixtures.
pub async fn loaded_adapter(routes: RouteOptions) -> Btse<MockTransport> {
    loaded_adapter_with(Some(test_credentials()), routes).await
}

pub async fn loaded_adapter_with(
    credentials: Option<Credentials>,
    routes: RouteOptions,
) -> Btse<MockTransport> {
    let mut btse = Btse::new(config(credentials, routes), MockTransport::default());
    btse.transport().push(fixture("spot_market_summary.json"));
    btse.transport().push(fixture("futures_market_summary.json"));
    btse.load_markets().await.expect("failed to load markets");
    btse
}
