//! Regime classifier thresholds.

use serde::{Deserialize, Serialize};

/// Regime classification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeConfig {
    /// Minimum points required; also the window for window_return.
    #[serde(default = "default_window")]
    pub window: usize,
    /// Smoothing period for directional movement.
    #[serde(default = "default_dmi_period")]
    pub dmi_period: usize,
    /// Directional strength above which a market counts as trending.
    #[serde(default = "default_trend_threshold")]
    pub trend_threshold: f64,
    /// Overall return above which a trend is called up on weak window data.
    #[serde(default = "default_positive_return_threshold")]
    pub positive_return_threshold: f64,
    /// Overall return that forces TrendingUp regardless of trend strength.
    #[serde(default = "default_strong_return_threshold")]
    pub strong_return_threshold: f64,
    /// Annualized volatility above which a market is Volatile.
    #[serde(default = "default_volatility_threshold")]
    pub volatility_threshold: f64,
    /// Hurst exponent below which a market is MeanReverting.
    #[serde(default = "default_hurst_threshold")]
    pub hurst_threshold: f64,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            dmi_period: default_dmi_period(),
            trend_threshold: default_trend_threshold(),
            positive_return_threshold: default_positive_return_threshold(),
            strong_return_threshold: default_strong_return_threshold(),
            volatility_threshold: default_volatility_threshold(),
            hurst_threshold: default_hurst_threshold(),
        }
    }
}

const fn default_window() -> usize {
    60
}

const fn default_dmi_period() -> usize {
    14
}

const fn default_trend_threshold() -> f64 {
    25.0
}

const fn default_positive_return_threshold() -> f64 {
    0.10
}

const fn default_strong_return_threshold() -> f64 {
    0.30
}

const fn default_volatility_threshold() -> f64 {
    0.80
}

const fn default_hurst_threshold() -> f64 {
    0.45
}
