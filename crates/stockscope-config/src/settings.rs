//! Configuration structures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockscope_indicators::AnalyzerConfig;
use stockscope_risk::RiskConfig;
use stockscope_validation::SplitStrategy;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub technical: AnalyzerConfig,
    #[serde(default)]
    pub validation: ValidationSettings,
}

impl AppConfig {
    /// Reject settings the calculators cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        self.technical.validate().map_err(|e| format!("technical: {}", e))?;
        validate_risk(&self.risk).map_err(|e| format!("risk: {}", e))?;
        self.validation.validate().map_err(|e| format!("validation: {}", e))?;
        if self.providers.timeout_secs == 0 {
            return Err("providers: timeout_secs must be positive".to_string());
        }
        Ok(())
    }
}

fn validate_risk(risk: &RiskConfig) -> Result<(), String> {
    let unit = |name: &str, v: Decimal| {
        if v <= Decimal::ZERO || v > Decimal::ONE {
            Err(format!("{} must be in (0, 1], got {}", name, v))
        } else {
            Ok(())
        }
    };
    unit("default_stop_pct", risk.default_stop_pct)?;
    unit("min_stop_pct", risk.min_stop_pct)?;
    unit("max_stop_pct", risk.max_stop_pct)?;
    unit("conservative_fraction", risk.conservative_fraction)?;
    unit("moderate_fraction", risk.moderate_fraction)?;
    unit("aggressive_fraction", risk.aggressive_fraction)?;
    unit("recommended_position_cap", risk.recommended_position_cap)?;
    unit("max_position_cap", risk.max_position_cap)?;

    if risk.min_stop_pct > risk.max_stop_pct {
        return Err("min_stop_pct exceeds max_stop_pct".to_string());
    }
    if risk.atr_multiplier <= Decimal::ZERO || risk.volatility_multiplier <= Decimal::ZERO {
        return Err("stop multipliers must be positive".to_string());
    }
    if risk.reward_ratios.is_empty() || risk.reward_ratios.iter().any(|r| *r <= Decimal::ZERO) {
        return Err("reward_ratios must be a non-empty list of positive ratios".to_string());
    }
    if risk.atr_period == 0 || risk.volatility_period < 2 {
        return Err("atr_period must be positive and volatility_period at least 2".to_string());
    }
    if risk.max_position_kelly_factor < Decimal::ZERO {
        return Err(format!(
            "max_position_kelly_factor must not be negative, got {}",
            risk.max_position_kelly_factor
        ));
    }
    let percent = |name: &str, v: Decimal| {
        if v <= Decimal::ZERO || v > Decimal::ONE_HUNDRED {
            Err(format!("{} must be in (0, 100], got {}", name, v))
        } else {
            Ok(())
        }
    };
    percent("max_single_exposure_pct", risk.max_single_exposure_pct)?;
    percent("max_sector_exposure_pct", risk.max_sector_exposure_pct)?;
    if risk.min_holdings > risk.max_holdings {
        return Err("min_holdings exceeds max_holdings".to_string());
    }
    Ok(())
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "stockscope".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
    /// Daily-rotated log file in addition to stderr
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// Upstream endpoints and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub twse_url: String,
    pub twse_mis_url: String,
    pub tpex_url: String,
    pub finmind_url: String,
    /// Environment variable holding the FinMind bearer token
    pub finmind_token_env: String,
    pub yahoo_url: String,
    pub user_agent: Option<String>,
    pub timeout_secs: u64,
    /// Prediction service; the rule engine is used when unset or unreachable
    pub model_backend_url: Option<String>,
    pub model_timeout_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            twse_url: "https://www.twse.com.tw".to_string(),
            twse_mis_url: "https://mis.twse.com.tw".to_string(),
            tpex_url: "https://www.tpex.org.tw".to_string(),
            finmind_url: "https://api.finmindtrade.com/api/v4/data".to_string(),
            finmind_token_env: "FINMIND_TOKEN".to_string(),
            yahoo_url: "https://query2.finance.yahoo.com".to_string(),
            user_agent: None,
            timeout_secs: 15,
            model_backend_url: None,
            model_timeout_secs: 5,
        }
    }
}

impl ProvidersConfig {
    pub fn finmind_token(&self) -> Option<String> {
        std::env::var(&self.finmind_token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}

/// Cache lifetimes in seconds. Zero disables caching of that kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub quote_ttl_secs: u64,
    pub history_ttl_secs: u64,
    pub institutional_ttl_secs: u64,
    pub fundamentals_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            quote_ttl_secs: 60,
            history_ttl_secs: 3600,
            institutional_ttl_secs: 3600,
            fundamentals_ttl_secs: 86_400,
        }
    }
}

/// Minimum spacing between requests to one host, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub twse_ms: u64,
    pub tpex_ms: u64,
    pub finmind_ms: u64,
    pub yahoo_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            // TWSE blocks clients that exceed roughly three requests per five seconds
            twse_ms: 2000,
            tpex_ms: 1000,
            finmind_ms: 500,
            yahoo_ms: 500,
        }
    }
}

/// Splitter family selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Expanding,
    WalkForward,
    Purged,
}

/// Cross-validation defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    pub strategy: StrategyKind,
    pub n_splits: usize,
    pub test_size: Option<usize>,
    pub gap: usize,
    pub train_size: usize,
    pub walk_test_size: usize,
    pub step: Option<usize>,
    pub purge_gap: usize,
    /// Bars ahead the label looks
    pub horizon: usize,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Expanding,
            n_splits: 5,
            test_size: None,
            gap: 0,
            train_size: 250,
            walk_test_size: 20,
            step: None,
            purge_gap: 5,
            horizon: 5,
        }
    }
}

impl ValidationSettings {
    fn validate(&self) -> Result<(), String> {
        if self.n_splits < 2 {
            return Err("n_splits must be at least 2".to_string());
        }
        if self.train_size == 0 || self.walk_test_size == 0 || self.horizon == 0 {
            return Err("train_size, walk_test_size and horizon must be positive".to_string());
        }
        Ok(())
    }

    /// Concrete splitter for `kind` using these defaults.
    pub fn strategy(&self, kind: StrategyKind) -> SplitStrategy {
        match kind {
            StrategyKind::Expanding => SplitStrategy::ExpandingWindow {
                n_splits: self.n_splits,
                test_size: self.test_size,
                gap: self.gap,
            },
            StrategyKind::WalkForward => SplitStrategy::WalkForward {
                train_size: self.train_size,
                test_size: self.walk_test_size,
                step: self.step,
                gap: self.gap,
            },
            StrategyKind::Purged => SplitStrategy::PurgedKFold {
                n_splits: self.n_splits,
                purge_gap: self.purge_gap,
            },
        }
    }

    pub fn default_strategy(&self) -> SplitStrategy {
        self.strategy(self.strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [risk]
            atr_multiplier = "2.5"

            [technical]
            rsi_period = 9

            [validation]
            strategy = "purged"
            purge_gap = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.risk.atr_multiplier, dec!(2.5));
        assert_eq!(config.risk.max_position_cap, dec!(0.30));
        assert_eq!(config.technical.rsi_period, 9);
        assert_eq!(config.technical.macd_slow, 26);
        assert_eq!(
            config.validation.default_strategy(),
            SplitStrategy::PurgedKFold { n_splits: 5, purge_gap: 3 }
        );
        assert_eq!(config.cache.quote_ttl_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_stop_range() {
        let mut config = AppConfig::default();
        config.risk.min_stop_pct = dec!(0.2);
        config.risk.max_stop_pct = dec!(0.1);
        assert!(config.validate().unwrap_err().starts_with("risk:"));
    }

    #[test]
    fn test_rejects_bad_technical_periods() {
        let mut config = AppConfig::default();
        config.technical.macd_fast = 30;
        assert!(config.validate().unwrap_err().starts_with("technical:"));
    }

    #[test]
    fn test_rejects_bad_bollinger_width() {
        let mut config = AppConfig::default();
        config.technical.bollinger_std = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.starts_with("technical:"));
        assert!(err.contains("bollinger_std"));
    }

    #[test]
    fn test_rejects_out_of_range_exposure_limits() {
        let mut config = AppConfig::default();
        config.risk.max_position_kelly_factor = dec!(-0.5);
        assert!(config.validate().unwrap_err().contains("max_position_kelly_factor"));

        for pct in [dec!(0), dec!(-10), dec!(150)] {
            let mut config = AppConfig::default();
            config.risk.max_single_exposure_pct = pct;
            assert!(config.validate().unwrap_err().contains("max_single_exposure_pct"));

            let mut config = AppConfig::default();
            config.risk.max_sector_exposure_pct = pct;
            assert!(config.validate().unwrap_err().contains("max_sector_exposure_pct"));
        }

        let mut config = AppConfig::default();
        config.risk.max_position_kelly_factor = Decimal::ZERO;
        config.risk.max_single_exposure_pct = dec!(100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_reward_ratios() {
        let mut config = AppConfig::default();
        config.risk.reward_ratios.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_walk_forward_strategy() {
        let settings = ValidationSettings::default();
        assert_eq!(
            settings.strategy(StrategyKind::WalkForward),
            SplitStrategy::WalkForward {
                train_size: 250,
                test_size: 20,
                step: None,
                gap: 0
            }
        );
    }
}
