use btse_venue::config::fetch_config;
use btse_venue::credentials::{self, CredentialKey};
use btse_venue::http::ReqwestTransport;
use btse_venue::{Btse, BtseError};
use tracing::info;

fn main() -> Result<(), BtseError> {
    // Initialize tracing subscriber for logging output.
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("store-credentials") {
        return store_credentials();
    }

    // Must run before the runtime spawns worker threads.
    let from_keychain = credentials::populate_env_from_keychain();
    if from_keychain > 0 {
        info!(count = from_keychain, "Using credentials from keychain");
    }

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| BtseError::Config(format!("failed to start runtime: {e}")))?;
    let symbol = args.first().cloned().unwrap_or_else(|| "BTC/USD".to_string());
    runtime.block_on(run(&symbol))
}

async fn run(symbol: &str) -> Result<(), BtseError> {
    let app_config = fetch_config()?;
    let mut btse = Btse::new(app_config.btse, ReqwestTransport::new()?);

    btse.load_time_difference().await?;
    let markets = btse.load_markets().await?;
    info!(markets = markets.len(), "Markets ready");

    let ticker = btse.fetch_ticker(symbol, None).await?;
    info!(
        symbol = %ticker.symbol,
        bid = ?ticker.bid,
        ask = ?ticker.ask,
        last = ?ticker.last,
        "Ticker"
    );
    Ok(())
}

/// Copies `BTSE_API_KEY` and `BTSE_API_SECRET` from the environment into
/// the OS keychain.
fn store_credentials() -> Result<(), BtseError> {
    for key in CredentialKey::ALL {
        let value = std::env::var(key.env_var())
            .map_err(|_| BtseError::Config(format!("{} is not set", key.env_var())))?;
        credentials::save(key, &value)?;
        info!(key = key.env_var(), "Stored credential in keychain");
    }
    Ok(())
}
