//! Configuration management.
//!
//! Settings come from an optional TOML file, then `STOCKSCOPE__SECTION__KEY`
//! environment variables (e.g. `STOCKSCOPE__RISK__ATR_MULTIPLIER=2.5`).

mod settings;

pub use settings::{
    AppConfig, AppSettings, CacheConfig, LoggingConfig, ProvidersConfig, RateLimitConfig,
    StrategyKind, ValidationSettings,
};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use std::path::Path;

pub const ENV_PREFIX: &str = "STOCKSCOPE";

fn with_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    )
}

/// Load configuration from file and environment.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder().add_source(File::from(path).required(true));
    finish(with_environment(builder))
}

/// Defaults plus environment overrides, for running without a config file.
pub fn load_from_env() -> Result<AppConfig, ConfigError> {
    finish(with_environment(Config::builder()))
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = builder.build()?.try_deserialize()?;
    config.validate().map_err(ConfigError::Message)?;
    Ok(config)
}
