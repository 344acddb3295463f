use std::time::Duration;

use anyhow::Result;
use keyval_core::{KeyValueDataStore, StoreConfig, StoreError};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_KEY: &str = "exampleKeyWithTTL";
const DEMO_TTL_SECONDS: i64 = 5;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keyval_demo=info,keyval_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Configuration from environment variables
    let config = StoreConfig::from_env();
    let cleanup_interval = config.cleanup_interval;
    tracing::info!("Storage file: {}", config.path().display());

    let store = KeyValueDataStore::open(config)?;

    let value = json!({"data": "example value with TTL"});
    match store.create(DEMO_KEY, value.clone(), DEMO_TTL_SECONDS) {
        Err(StoreError::KeyExists(_)) => {
            // Left over from an earlier run
            if let Err(err) = store.delete(DEMO_KEY) {
                if !err.is_missing() {
                    return Err(err.into());
                }
            }
            store.create(DEMO_KEY, value, DEMO_TTL_SECONDS)?;
        }
        other => other?,
    }

    println!("Value before TTL expires: {}", store.read(DEMO_KEY)?);

    tokio::time::sleep(Duration::from_secs(DEMO_TTL_SECONDS as u64 + 1)).await;

    match store.read(DEMO_KEY) {
        Ok(value) => println!("Value after TTL expires: {}", value),
        Err(err) => println!("{}", err),
    }

    store.start_auto_cleanup(cleanup_interval)?;
    tracing::info!("Auto cleanup running every {:?}, press Ctrl-C to exit", cleanup_interval);

    tokio::signal::ctrl_c().await?;
    store.stop_auto_cleanup();

    Ok(())
}
