//! Execution gatekeeper thresholds.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Gatekeeper configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatekeeperConfig {
    /// Minimum proposal confidence for any non-Hold action.
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,
    /// Ceiling on researcher divergence weighted by proposal confidence.
    #[serde(default = "default_max_divergence")]
    pub max_divergence: f64,
    /// Margin above the long moving average that marks price as extended.
    #[serde(default = "default_trend_ma_margin")]
    pub trend_ma_margin: Decimal,
    /// Maximum source freshness age in seconds.
    #[serde(default = "default_max_data_age_secs")]
    pub max_data_age_secs: i64,
    /// Insider-activity substrings that abort the cycle on compliance
    /// grounds. Matched case-insensitively.
    #[serde(default = "default_restricted_patterns")]
    pub restricted_patterns: Vec<String>,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            confidence_floor: default_confidence_floor(),
            max_divergence: default_max_divergence(),
            trend_ma_margin: default_trend_ma_margin(),
            max_data_age_secs: default_max_data_age_secs(),
            restricted_patterns: default_restricted_patterns(),
        }
    }
}

const fn default_confidence_floor() -> f64 {
    0.70
}

const fn default_max_divergence() -> f64 {
    0.4
}

fn default_trend_ma_margin() -> Decimal {
    dec!(0.05)
}

const fn default_max_data_age_secs() -> i64 {
    86_400
}

fn default_restricted_patterns() -> Vec<String> {
    vec![
        "clustered insider selling".to_owned(),
        "trading halt pending".to_owned(),
        "sec investigation".to_owned(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gatekeeper_defaults() {
        let config = GatekeeperConfig::default();
        assert!((config.confidence_floor - 0.70).abs() < f64::EPSILON);
        assert!((config.max_divergence - 0.4).abs() < f64::EPSILON);
        assert_eq!(config.trend_ma_margin, dec!(0.05));
        assert_eq!(config.max_data_age_secs, 86_400);
        assert_eq!(config.restricted_patterns.len(), 3);
    }
}
