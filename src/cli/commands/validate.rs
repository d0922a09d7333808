//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use stockscope_config::AppConfig;

/// Configuration was already loaded and validated at startup; report it.
pub fn run(config_path: &Path, config: &AppConfig) -> Result<()> {
    if config_path.exists() {
        println!("Configuration is valid: {}", config_path.display());
    } else {
        println!(
            "{} not found; defaults with environment overrides are valid",
            config_path.display()
        );
    }
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {}", config.logging.level);
    println!(
        "FinMind token ({}): {}",
        config.providers.finmind_token_env,
        if config.providers.finmind_token().is_some() { "set" } else { "missing" }
    );
    println!(
        "Model backend: {}",
        config.providers.model_backend_url.as_deref().unwrap_or("none (rule-based)")
    );
    println!(
        "Stop-loss: ATR x{} or volatility x{}, clamped to {}-{}",
        config.risk.atr_multiplier,
        config.risk.volatility_multiplier,
        config.risk.min_stop_pct,
        config.risk.max_stop_pct
    );
    println!(
        "Max position: Kelly x{} capped at {}",
        config.risk.max_position_kelly_factor, config.risk.max_position_cap
    );
    println!("Validation: {:?}", config.validation.default_strategy());
    Ok(())
}
