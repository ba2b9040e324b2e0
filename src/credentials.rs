//! API credentials and optional keychain storage.
//!
//! [`Credentials`] holds the key pair used by the request signer; the secret
//! is zeroed on drop and never printed. At startup,
//! [`populate_env_from_keychain`] copies any credentials stored in the system
//! keychain into environment variables so the existing config flow picks
//! them up transparently.

use std::fmt;

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::BtseError;

/// Keychain service name used for all stored credentials.
const SERVICE: &str = "btse-venue";

/// An API key and its signing secret.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: Zeroizing<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: Zeroizing::new(api_secret.into()),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_secret(&self) -> &str {
        self.api_secret.as_str()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// Known API credential keys managed by this module.
#[derive(Clone, Copy, Debug)]
pub enum CredentialKey {
    BtseApiKey,
    BtseApiSecret,
}

impl CredentialKey {
    /// Returns the keychain entry identifier.
    pub fn keyring_id(self) -> &'static str {
        match self {
            Self::BtseApiKey => "btse_api_key",
            Self::BtseApiSecret => "btse_api_secret",
        }
    }

    /// Returns the environment variable name for this credential.
    pub fn env_var(self) -> &'static str {
        match self {
            Self::BtseApiKey => "BTSE_API_KEY",
            Self::BtseApiSecret => "BTSE_API_SECRET",
        }
    }

    /// All credential keys.
    pub const ALL: [CredentialKey; 2] = [Self::BtseApiKey, Self::BtseApiSecret];
}

fn keychain_entry(key: CredentialKey) -> crate::Result<keyring::Entry> {
    keyring::Entry::new(SERVICE, key.keyring_id()).map_err(|e| {
        BtseError::Config(format!("keychain entry {} unavailable: {e}", key.keyring_id()))
    })
}

/// Reads one half of the BTSE key pair from the `btse-venue` keychain
/// service. A missing or unreadable entry yields `None`.
pub fn load(key: CredentialKey) -> Option<Zeroizing<String>> {
    let entry = keychain_entry(key).ok()?;
    match entry.get_password() {
        Ok(value) if value.is_empty() => None,
        Ok(value) => Some(Zeroizing::new(value)),
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            warn!(key = key.keyring_id(), error = %e, "Failed to read keychain entry");
            None
        }
    }
}

/// Stores one half of the BTSE key pair in the keychain.
///
/// Empty values are refused, matching the signer's credential check.
pub fn save(key: CredentialKey, value: &str) -> crate::Result<()> {
    if value.is_empty() {
        return Err(BtseError::Config(format!(
            "refusing to store an empty {}",
            key.env_var()
        )));
    }
    keychain_entry(key)?
        .set_password(value)
        .map_err(|e| BtseError::Config(format!("failed to store {}: {e}", key.env_var())))
}

/// Fills `BTSE_API_KEY` / `BTSE_API_SECRET` from the keychain when the
/// environment leaves them unset, so [`crate::config::fetch_config`] sees
/// keychain credentials exactly like exported ones. Returns how many
/// variables were set.
///
/// Must run before the tokio runtime starts worker threads.
pub fn populate_env_from_keychain() -> usize {
    let mut populated = 0;
    for key in CredentialKey::ALL {
        if std::env::var_os(key.env_var()).is_some() {
            continue;
        }
        let Some(value) = load(key) else {
            continue;
        };
        // SAFETY: called from `main` before any other thread exists.
        unsafe {
            std::env::set_var(key.env_var(), value.as_str());
        }
        debug!(key = key.env_var(), "Loaded credential from keychain");
        populated += 1;
    }
    populated
}
