//! Shared setup for commands: configuration, providers and output.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use stockscope_config::{load_config, load_from_env, AppConfig};
use stockscope_core::traits::{MarketDataProvider, SystemClock};
use stockscope_data::{
    CacheTtls, FinMindClient, HttpClient, MarketDataService, TpexClient, TwseClient, YahooClient,
};
use stockscope_validation::{select_predictor, HttpModelBackend, ModelBackend, Predictor};
use tracing::{info, warn};

use super::OutputFormat;

/// Load the config file, or fall back to defaults plus environment overrides
/// when the file does not exist.
pub fn load_app_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        load_config(path).with_context(|| format!("Failed to load {}", path.display()))
    } else {
        load_from_env().context("Failed to load configuration from environment")
    }
}

/// Provider chain TWSE, TPEx, FinMind, Yahoo, each with its own rate limit.
pub fn build_market_data(config: &AppConfig) -> Result<MarketDataService> {
    let providers_cfg = &config.providers;
    let limits = &config.rate_limit;
    let timeout = Duration::from_secs(providers_cfg.timeout_secs);
    let agent = providers_cfg.user_agent.as_deref();
    let http = |interval_ms: u64| {
        HttpClient::new(timeout, Duration::from_millis(interval_ms), agent)
            .context("Failed to build HTTP client")
    };

    let mut providers: Vec<Arc<dyn MarketDataProvider>> = vec![
        Arc::new(TwseClient::new(
            http(limits.twse_ms)?,
            &providers_cfg.twse_url,
            &providers_cfg.twse_mis_url,
        )),
        Arc::new(TpexClient::new(http(limits.tpex_ms)?, &providers_cfg.tpex_url)),
    ];

    let token = providers_cfg.finmind_token();
    if token.is_none() {
        warn!(
            env = %providers_cfg.finmind_token_env,
            "FinMind token not set, skipping FinMind in the fallback chain"
        );
    } else {
        providers.push(Arc::new(FinMindClient::new(
            http(limits.finmind_ms)?,
            &providers_cfg.finmind_url,
            token,
            &providers_cfg.finmind_token_env,
        )));
    }
    providers.push(Arc::new(YahooClient::new(
        http(limits.yahoo_ms)?,
        &providers_cfg.yahoo_url,
    )));

    let cache = &config.cache;
    let ttls = CacheTtls {
        quote: Duration::from_secs(cache.quote_ttl_secs),
        history: Duration::from_secs(cache.history_ttl_secs),
        institutional: Duration::from_secs(cache.institutional_ttl_secs),
        fundamentals: Duration::from_secs(cache.fundamentals_ttl_secs),
    };
    Ok(MarketDataService::new(providers, ttls, Arc::new(SystemClock)))
}

/// Rule-based predictor, or the model service when configured and healthy.
pub async fn build_predictor(config: &AppConfig) -> Box<dyn Predictor> {
    let backend = match config.providers.model_backend_url.as_deref() {
        Some(url) => {
            let timeout = Duration::from_secs(config.providers.model_timeout_secs);
            match HttpModelBackend::new(url, timeout) {
                Ok(backend) => Some(Arc::new(backend) as Arc<dyn ModelBackend>),
                Err(e) => {
                    warn!(url, error = %e, "Could not create model backend client");
                    None
                }
            }
        }
        None => None,
    };
    let predictor = select_predictor(backend, config.technical.clone()).await;
    info!(predictor = predictor.name(), "Predictor selected");
    predictor
}

/// Print `value` as pretty JSON, or run `text` for human-readable output.
pub fn print_output<T: Serialize>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce(&T),
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(value),
    }
    Ok(())
}
