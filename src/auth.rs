//! BTSE request authentication.
//!
//! Every private call carries three headers:
//! - `btse-nonce`: wall-clock milliseconds corrected by the cached server clock offset
//! - `btse-api`: the API key
//! - `btse-sign`: hex `HMAC-SHA384(secret, "/" + signature_path + nonce [+ body])`
//!
//! The signature path is the request path relative to its product line:
//! `https://api.btse.com/spot/api/v3.1/order` signs as `api/v3.1/order`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha384;

use crate::credentials::Credentials;
use crate::router::{Endpoint, Surface};
use crate::{BtseError, Result};

type HmacSha384 = Hmac<Sha384>;

pub const NONCE_HEADER: &str = "btse-nonce";
pub const API_KEY_HEADER: &str = "btse-api";
pub const SIGNATURE_HEADER: &str = "btse-sign";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Produces request nonces for one adapter instance.
///
/// The nonce is always derived from the wall clock minus the cached offset
/// between local and server time. Successive calls are forced strictly
/// increasing so concurrent in-flight requests never share a nonce, even
/// when the clock resolution is too coarse or the clock steps backwards.
#[derive(Debug, Default)]
pub struct NonceSource {
    /// Local time minus server time, in milliseconds.
    clock_offset_ms: i64,
    last: AtomicU64,
}

impl NonceSource {
    pub fn new(clock_offset_ms: i64) -> Self {
        Self {
            clock_offset_ms,
            last: AtomicU64::new(0),
        }
    }

    pub fn clock_offset_ms(&self) -> i64 {
        self.clock_offset_ms
    }

    /// Replaces the cached clock offset. Only called from an explicit reload.
    pub fn set_clock_offset_ms(&mut self, offset: i64) {
        self.clock_offset_ms = offset;
    }

    /// Returns the next nonce.
    pub fn next(&self) -> u64 {
        let now = (now_millis() as i64).saturating_sub(self.clock_offset_ms).max(0) as u64;

        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let nonce = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, nonce, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return nonce,
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Strips the product-line prefix (`{host}/spot/` or `{host}/futures/`)
/// from an absolute URL.
///
/// A URL outside the product line is returned unchanged.
pub fn signature_path<'a>(host: &str, surface: Surface, url: &'a str) -> &'a str {
    let prefix = format!(
        "{}{}",
        host.trim_end_matches('/'),
        surface.product_prefix()
    );
    url.strip_prefix(prefix.as_str()).unwrap_or(url)
}

/// Computes the hex-encoded HMAC-SHA384 signature.
///
/// Payload: `"/" + path + nonce` when there is no body,
/// `"/" + path + nonce + body` otherwise.
pub fn create_signature(
    secret: &str,
    nonce: u64,
    path: &str,
    body: Option<&str>,
) -> Result<String> {
    let payload = match body {
        Some(body) => format!("/{path}{nonce}{body}"),
        None => format!("/{path}{nonce}"),
    };
    let mut mac = HmacSha384::new_from_slice(secret.as_bytes()).map_err(|e| {
        BtseError::Authentication {
            operation: "sign",
            reason: format!("invalid HMAC key: {e}"),
        }
    })?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Builds the authentication headers for a private request to `endpoint`.
///
/// The signature path is derived from the endpoint URL without query
/// string. The body is part of the signed payload only for verbs that
/// carry one.
///
/// # Errors
///
/// Returns [`BtseError::Authentication`] if credentials are absent or
/// either half is empty.
pub fn sign(
    operation: &'static str,
    credentials: Option<&Credentials>,
    host: &str,
    endpoint: &Endpoint,
    nonce: u64,
    body: Option<&str>,
) -> Result<Vec<(&'static str, String)>> {
    let credentials = check_credentials(operation, credentials)?;

    let url = endpoint.url(host);
    let path = signature_path(host, endpoint.surface, &url);
    let signed_body = if endpoint.verb.has_body() {
        body
    } else {
        None
    };
    let signature = create_signature(credentials.api_secret(), nonce, path, signed_body)?;

    let mut headers = vec![
        (NONCE_HEADER, nonce.to_string()),
        (API_KEY_HEADER, credentials.api_key().to_string()),
        (SIGNATURE_HEADER, signature),
    ];
    if signed_body.is_some() {
        headers.push((CONTENT_TYPE_HEADER, "application/json".to_string()));
    }
    Ok(headers)
}

/// Fails unless both the API key and secret are present and non-empty.
pub fn check_credentials<'a>(
    operation: &'static str,
    credentials: Option<&'a Credentials>,
) -> Result<&'a Credentials> {
    let credentials = credentials.ok_or_else(|| BtseError::Authentication {
        operation,
        reason: "requires apiKey and secret, none configured".to_string(),
    })?;
    if credentials.api_key().is_empty() {
        return Err(BtseError::Authentication {
            operation,
            reason: "apiKey is empty".to_string(),
        });
    }
    if credentials.api_secret().is_empty() {
        return Err(BtseError::Authentication {
            operation,
            reason: "secret is empty".to_string(),
        });
    }
    Ok(credentials)
}
