use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::api::services::ApiSettings;
use crate::config::StaticConfig;
use crate::services::{KeyService, LinkShortener, MonetizzyGateway};
use crate::storage::KeyStore;

pub struct StartupContext {
    pub store: Arc<KeyStore>,
    pub key_service: Arc<KeyService>,
    pub api_settings: ApiSettings,
}

/// Upper bound for `keys.expiry_hours` (ten years).
pub const MAX_EXPIRY_HOURS: u64 = 24 * 365 * 10;

/// Upper bound for `keys.sweep_interval_secs` (thirty days).
pub const MAX_SWEEP_INTERVAL_SECS: u64 = 60 * 60 * 24 * 30;

/// Expiry window for unused keys, from `keys.expiry_hours`.
pub fn expiry_window(config: &StaticConfig) -> Result<chrono::Duration> {
    let hours = config.keys.expiry_hours;
    if !(1..=MAX_EXPIRY_HOURS).contains(&hours) {
        bail!(
            "keys.expiry_hours must be between 1 and {}, got {}",
            MAX_EXPIRY_HOURS,
            hours
        );
    }
    chrono::TimeDelta::try_hours(hours as i64)
        .with_context(|| format!("keys.expiry_hours {} is out of range", hours))
}

/// Period of the expiry sweeper, from `keys.sweep_interval_secs`.
pub fn sweep_period(config: &StaticConfig) -> Result<std::time::Duration> {
    let secs = config.keys.sweep_interval_secs;
    if !(1..=MAX_SWEEP_INTERVAL_SECS).contains(&secs) {
        bail!(
            "keys.sweep_interval_secs must be between 1 and {}, got {}",
            MAX_SWEEP_INTERVAL_SECS,
            secs
        );
    }
    Ok(std::time::Duration::from_secs(secs))
}

/// Open the key store read from `keys.file`.
pub fn open_store(config: &StaticConfig) -> Result<Arc<KeyStore>> {
    let store = KeyStore::open(&config.keys.file, config.keys.abort_on_corrupt)
        .with_context(|| format!("Failed to open keys file {}", config.keys.file))?;
    Ok(Arc::new(store))
}

/// 准备服务器启动的上下文
pub fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let expiry = expiry_window(config)?;
    let store = open_store(config)?;

    if config.auth.token.is_empty() {
        warn!("auth.token is not set; every issuance request will be rejected");
    }
    if config.gateway_token().is_empty() {
        warn!("No shortener credential configured; gateway calls will be unauthorized");
    }

    let shortener: Arc<dyn LinkShortener> = Arc::new(MonetizzyGateway::new(
        &config.gateway,
        config.gateway_token(),
    ));
    info!(
        "Using {} shortener at {} (timeout {}s)",
        shortener.name(),
        config.gateway.api_url,
        config.gateway.timeout_secs
    );

    let key_service = Arc::new(KeyService::new(
        store.clone(),
        shortener,
        expiry,
    ));

    let api_settings = ApiSettings {
        auth_token: config.auth.token.clone(),
        production: config.server.production,
    };

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        store,
        key_service,
        api_settings,
    })
}
