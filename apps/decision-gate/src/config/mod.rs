//! Configuration for the decision gate.
//!
//! Loads a YAML file with environment variable interpolation, applies
//! per-section defaults, and validates threshold ranges before any
//! component is constructed.
//!
//! # Usage
//!
//! ```rust,ignore
//! use decision_gate::config::{Config, load_config};
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("custom/config.yaml"))?;
//!
//! println!("regime window: {}", config.regime.window);
//! ```

mod enforcer;
mod factcheck;
mod gatekeeper;
mod orchestrator;
mod regime;
mod risk;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use enforcer::EnforcerConfig;
pub use factcheck::FactCheckConfig;
pub use gatekeeper::GatekeeperConfig;
pub use orchestrator::OrchestratorConfig;
pub use regime::RegimeConfig;
pub use risk::RiskConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Regime classifier thresholds.
    #[serde(default)]
    pub regime: RegimeConfig,
    /// Fact validation settings.
    #[serde(default)]
    pub factcheck: FactCheckConfig,
    /// Risk gate limits and sizing.
    #[serde(default)]
    pub risk: RiskConfig,
    /// Gatekeeper thresholds.
    #[serde(default)]
    pub gatekeeper: GatekeeperConfig,
    /// Enforcer retry settings.
    #[serde(default)]
    pub enforcer: EnforcerConfig,
    /// Orchestrator cycle settings.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    let interpolated = interpolate_env_vars(&contents);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;

    Ok(config)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let mut result = input.to_string();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        // This regex pattern is compile-time constant and always valid
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    for cap in re.captures_iter(input) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        let Some(var_match) = cap.get(1) else {
            continue;
        };
        let full_match = full_match.as_str();
        let var_name = var_match.as_str();
        let default_value = cap.get(2).map(|m| m.as_str());

        let value = match std::env::var(var_name) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        };

        result = result.replace(full_match, &value);
    }

    result
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    use rust_decimal::Decimal;

    if config.regime.window < 2 {
        return Err(ConfigError::ValidationError(
            "regime.window must be at least 2".to_string(),
        ));
    }

    if config.regime.dmi_period < 1 {
        return Err(ConfigError::ValidationError(
            "regime.dmi_period must be at least 1".to_string(),
        ));
    }

    if !(0.0..=100.0).contains(&config.regime.trend_threshold) {
        return Err(ConfigError::ValidationError(
            "regime.trend_threshold must be between 0.0 and 100.0".to_string(),
        ));
    }

    if !(0.0..1.0).contains(&config.regime.hurst_threshold) {
        return Err(ConfigError::ValidationError(
            "regime.hurst_threshold must be between 0.0 and 1.0".to_string(),
        ));
    }

    if config.factcheck.tolerance <= 0.0 || config.factcheck.tolerance > 1.0 {
        return Err(ConfigError::ValidationError(
            "factcheck.tolerance must be in (0.0, 1.0]".to_string(),
        ));
    }

    if config.factcheck.cache_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "factcheck.cache_capacity must be positive".to_string(),
        ));
    }

    if config.risk.max_drawdown <= Decimal::ZERO || config.risk.max_drawdown >= Decimal::ONE {
        return Err(ConfigError::ValidationError(
            "risk.max_drawdown must be between 0 and 1".to_string(),
        ));
    }

    if config.risk.atr_stop_multiple <= Decimal::ZERO {
        return Err(ConfigError::ValidationError(
            "risk.atr_stop_multiple must be positive".to_string(),
        ));
    }

    if config.risk.max_position_risk <= Decimal::ZERO
        || config.risk.max_position_risk >= Decimal::ONE
    {
        return Err(ConfigError::ValidationError(
            "risk.max_position_risk must be between 0 and 1".to_string(),
        ));
    }

    if config.risk.max_portfolio_heat < config.risk.max_position_risk {
        return Err(ConfigError::ValidationError(
            "risk.max_portfolio_heat must be at least risk.max_position_risk".to_string(),
        ));
    }

    if config.risk.kelly_cap <= Decimal::ZERO || config.risk.kelly_cap > Decimal::ONE {
        return Err(ConfigError::ValidationError(
            "risk.kelly_cap must be in (0, 1]".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&config.gatekeeper.confidence_floor) {
        return Err(ConfigError::ValidationError(
            "gatekeeper.confidence_floor must be between 0.0 and 1.0".to_string(),
        ));
    }

    if config.gatekeeper.max_divergence <= 0.0 {
        return Err(ConfigError::ValidationError(
            "gatekeeper.max_divergence must be positive".to_string(),
        ));
    }

    if config.gatekeeper.trend_ma_margin < Decimal::ZERO {
        return Err(ConfigError::ValidationError(
            "gatekeeper.trend_ma_margin must not be negative".to_string(),
        ));
    }

    if config.gatekeeper.max_data_age_secs <= 0 {
        return Err(ConfigError::ValidationError(
            "gatekeeper.max_data_age_secs must be positive".to_string(),
        ));
    }

    if config.enforcer.attempt_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "enforcer.attempt_timeout_ms must be positive".to_string(),
        ));
    }

    if config.enforcer.backoff_multiplier < 1.0 {
        return Err(ConfigError::ValidationError(
            "enforcer.backoff_multiplier must be at least 1.0".to_string(),
        ));
    }

    if !(0.0..1.0).contains(&config.enforcer.jitter_factor) {
        return Err(ConfigError::ValidationError(
            "enforcer.jitter_factor must be in [0.0, 1.0)".to_string(),
        ));
    }

    if config.orchestrator.analysis_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.analysis_timeout_ms must be positive".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.regime.window, 60);
        assert!((config.factcheck.tolerance - 0.10).abs() < f64::EPSILON);
        assert_eq!(config.risk.max_drawdown, dec!(0.15));
        assert!((config.gatekeeper.confidence_floor - 0.70).abs() < f64::EPSILON);
        assert_eq!(config.enforcer.max_retries, 2);
        assert_eq!(config.orchestrator.analysis_timeout_ms, 120_000);
    }

    #[test]
    fn test_load_empty_config_uses_defaults() {
        let config = match load_config_from_string("{}") {
            Ok(c) => c,
            Err(e) => panic!("should load empty config: {e}"),
        };
        assert_eq!(config.regime.window, 60);
        assert_eq!(config.enforcer.max_retries, 2);
    }

    #[test]
    fn test_load_partial_config_overrides_one_section() {
        let yaml = r"
risk:
  max_drawdown: 0.20
  max_position_risk: 0.01
";
        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("should load partial config: {e}"),
        };
        assert_eq!(config.risk.max_drawdown, dec!(0.20));
        assert_eq!(config.risk.max_position_risk, dec!(0.01));
        // Untouched fields keep defaults.
        assert_eq!(config.risk.atr_stop_multiple, dec!(2.0));
        assert_eq!(config.regime.window, 60);
    }

    #[test]
    fn test_env_var_interpolation_with_default() {
        let yaml = r"
regime:
  window: ${DECISION_GATE_TEST_UNSET_WINDOW:-90}
";
        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("should interpolate default: {e}"),
        };
        assert_eq!(config.regime.window, 90);
    }

    #[test]
    #[expect(clippy::literal_string_with_formatting_args)] // ${...} is env var syntax, not format args
    fn test_env_var_with_default_uses_existing() {
        // PATH should always exist
        let input = "path: ${PATH:-default}";
        let result = interpolate_env_vars(input);

        assert_ne!(result, "path: default");
        assert!(result.starts_with("path: "));
    }

    #[test]
    fn test_env_var_without_default_becomes_empty() {
        let input = "api_key: ${DECISION_GATE_TEST_UNLIKELY_TO_EXIST}";
        let result = interpolate_env_vars(input);

        assert_eq!(result, "api_key: ");
    }

    #[test]
    fn test_validation_rejects_zero_tolerance() {
        let yaml = r"
factcheck:
  tolerance: 0.0
";
        let result = load_config_from_string(yaml);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validation_rejects_heat_below_position_risk() {
        let yaml = r"
risk:
  max_position_risk: 0.05
  max_portfolio_heat: 0.04
";
        let result = load_config_from_string(yaml);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validation_rejects_short_window() {
        let yaml = r"
regime:
  window: 1
";
        let result = load_config_from_string(yaml);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_missing_config_file_is_read_error() {
        let result = load_config(Some("/nonexistent/config.yaml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "regime:\n  window: 45").expect("write yaml");

        let path = file.path().to_str().expect("utf8 path");
        let config = match load_config(Some(path)) {
            Ok(c) => c,
            Err(e) => panic!("should load from file: {e}"),
        };
        assert_eq!(config.regime.window, 45);
    }
}
