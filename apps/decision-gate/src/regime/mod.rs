//! Market regime classification.
//!
//! The classifier reduces a validated price series to one of five closed
//! regimes using fixed arithmetic only. The same series and configuration
//! always produce the same answer; there is no I/O, no randomness, and no
//! model call anywhere in this module.
//!
//! Classification priority (first match wins):
//!
//! | Order | Condition | Regime |
//! |-------|-----------|--------|
//! | 1 | trend strength > threshold, window or overall return positive | `TrendingUp` |
//! | 2 | trend strength > threshold otherwise | `TrendingDown` |
//! | 3 | overall return > strong-return threshold | `TrendingUp` |
//! | 4 | volatility > volatility threshold | `Volatile` |
//! | 5 | hurst < hurst threshold | `MeanReverting` |
//! | 6 | everything else | `Sideways` |

mod math;
pub mod signal;

use serde::{Deserialize, Serialize};

use crate::config::RegimeConfig;
use crate::error::RegimeError;
use crate::models::PriceSeries;

/// The closed set of market regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketRegime {
    /// Sustained directional movement upward.
    TrendingUp,
    /// Sustained directional movement downward.
    TrendingDown,
    /// Price oscillating around a mean.
    MeanReverting,
    /// Elevated volatility without direction.
    Volatile,
    /// No dominant structure.
    Sideways,
}

impl MarketRegime {
    /// Stable wire label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TrendingUp => "TRENDING_UP",
            Self::TrendingDown => "TRENDING_DOWN",
            Self::MeanReverting => "MEAN_REVERTING",
            Self::Volatile => "VOLATILE",
            Self::Sideways => "SIDEWAYS",
        }
    }

    /// Whether the regime supports long entries.
    #[must_use]
    pub const fn is_bullish(&self) -> bool {
        matches!(self, Self::TrendingUp)
    }
}

/// Derived metrics backing a classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeMetrics {
    /// Annualized volatility of simple returns.
    pub volatility: f64,
    /// Wilder directional-movement strength in `[0, 100]`.
    pub trend_strength: f64,
    /// Hurst exponent (0.5 = random walk).
    pub hurst_exponent: f64,
    /// Return over the classification window.
    pub window_return: f64,
    /// Return over the full series.
    pub overall_return: f64,
}

/// A classification plus the metrics that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeAssessment {
    /// The classified regime.
    pub regime: MarketRegime,
    /// Metrics the classification was derived from.
    pub metrics: RegimeMetrics,
}

/// Deterministic regime classifier.
#[derive(Debug, Clone)]
pub struct RegimeClassifier {
    config: RegimeConfig,
}

impl RegimeClassifier {
    /// Build a classifier with the given thresholds.
    #[must_use]
    pub const fn new(config: RegimeConfig) -> Self {
        Self { config }
    }

    /// Classify a price series.
    ///
    /// Fails only when the series is shorter than the configured window;
    /// every sufficiently long series classifies into exactly one regime.
    pub fn classify(&self, series: &PriceSeries) -> Result<RegimeAssessment, RegimeError> {
        let cfg = &self.config;
        if series.len() < cfg.window {
            return Err(RegimeError::InsufficientData {
                required: cfg.window,
                actual: series.len(),
            });
        }

        let closes: Vec<f64> = series.prices().collect();
        let metrics = RegimeMetrics {
            volatility: math::annualized_volatility(&closes),
            trend_strength: math::directional_strength(&closes, cfg.dmi_period),
            hurst_exponent: math::hurst_exponent(&closes),
            window_return: series.window_return(cfg.window),
            overall_return: series.overall_return(),
        };

        let regime = if metrics.trend_strength > cfg.trend_threshold {
            if metrics.window_return > 0.0 || metrics.overall_return > cfg.positive_return_threshold
            {
                MarketRegime::TrendingUp
            } else {
                MarketRegime::TrendingDown
            }
        } else if metrics.overall_return > cfg.strong_return_threshold {
            // Tuned override: a large cumulative gain is treated as an
            // uptrend even when directional movement has gone quiet.
            MarketRegime::TrendingUp
        } else if metrics.volatility > cfg.volatility_threshold {
            MarketRegime::Volatile
        } else if metrics.hurst_exponent < cfg.hurst_threshold {
            MarketRegime::MeanReverting
        } else {
            MarketRegime::Sideways
        };

        Ok(RegimeAssessment { regime, metrics })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::PricePoint;

    fn series_from(prices: Vec<f64>) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date");
        let points = prices
            .into_iter()
            .enumerate()
            .map(|(i, price)| PricePoint {
                date: base + chrono::Duration::days(i64::try_from(i).expect("small index")),
                price,
            })
            .collect();
        PriceSeries::new(points).expect("valid series")
    }

    fn classifier() -> RegimeClassifier {
        RegimeClassifier::new(RegimeConfig::default())
    }

    #[test]
    fn test_insufficient_data_below_window() {
        let series = series_from((0..30).map(|i| 100.0 + f64::from(i)).collect());
        let result = classifier().classify(&series);
        assert_eq!(
            result.expect_err("should require 60 points"),
            RegimeError::InsufficientData {
                required: 60,
                actual: 30
            }
        );
    }

    #[test]
    fn test_steady_rise_classifies_trending_up() {
        // +50% over 100 sessions in even steps.
        let series = series_from((0..100).map(|i| 100.0 + f64::from(i) * 0.5).collect());
        let assessment = classifier().classify(&series).expect("classifies");
        assert_eq!(assessment.regime, MarketRegime::TrendingUp);
        assert!(
            assessment.metrics.trend_strength > 25.0,
            "trend strength {} should exceed threshold",
            assessment.metrics.trend_strength
        );
        assert!(assessment.metrics.window_return > 0.0);
    }

    #[test]
    fn test_steady_fall_classifies_trending_down() {
        let series = series_from((0..100).map(|i| 200.0 - f64::from(i) * 0.8).collect());
        let assessment = classifier().classify(&series).expect("classifies");
        assert_eq!(assessment.regime, MarketRegime::TrendingDown);
        assert!(assessment.metrics.trend_strength > 25.0);
        assert!(assessment.metrics.window_return < 0.0);
    }

    #[test]
    fn test_oscillation_classifies_mean_reverting() {
        // Tight oscillation: weak trend, low volatility, anti-persistent.
        let series = series_from(
            (0..90)
                .map(|i| 100.0 + if i % 2 == 0 { 0.2 } else { -0.2 })
                .collect(),
        );
        let assessment = classifier().classify(&series).expect("classifies");
        assert_eq!(assessment.regime, MarketRegime::MeanReverting);
        assert!(assessment.metrics.hurst_exponent < 0.45);
    }

    #[test]
    fn test_large_swings_classify_volatile() {
        // Alternating +6%/-5.7% swings: no direction, annualized vol well
        // above the 0.80 threshold. Volatility outranks the hurst check.
        let mut price = 100.0;
        let mut prices = Vec::with_capacity(90);
        for i in 0..90 {
            prices.push(price);
            price = if i % 2 == 0 { price * 1.06 } else { price / 1.06 };
        }
        let assessment = classifier().classify(&series_from(prices)).expect("classifies");
        assert_eq!(assessment.regime, MarketRegime::Volatile);
        assert!(assessment.metrics.volatility > 0.80);
        assert!(assessment.metrics.hurst_exponent < 0.45);
    }

    #[test]
    fn test_strong_overall_return_overrides_weak_trend() {
        // +5% then -3.4% repeated: directional strength washes out near 17
        // but the cumulative return compounds past +30%.
        let mut price = 100.0;
        let mut prices = Vec::with_capacity(100);
        for i in 0..100 {
            prices.push(price);
            price = if i % 2 == 0 { price * 1.05 } else { price * 0.966 };
        }
        let assessment = classifier().classify(&series_from(prices)).expect("classifies");
        assert!(
            assessment.metrics.trend_strength <= 25.0,
            "trend strength {} should stay under threshold",
            assessment.metrics.trend_strength
        );
        assert!(assessment.metrics.overall_return > 0.30);
        assert_eq!(assessment.regime, MarketRegime::TrendingUp);
    }

    #[test]
    fn test_flat_series_classifies_sideways() {
        let series = series_from(vec![100.0; 80]);
        let assessment = classifier().classify(&series).expect("classifies");
        assert_eq!(assessment.regime, MarketRegime::Sideways);
        assert_eq!(assessment.metrics.trend_strength, 0.0);
        assert_eq!(assessment.metrics.volatility, 0.0);
        assert_eq!(assessment.metrics.hurst_exponent, 0.5);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let series = series_from((0..120).map(|i| 100.0 + (f64::from(i) * 0.7).sin() * 5.0).collect());
        let first = classifier().classify(&series).expect("classifies");
        let second = classifier().classify(&series).expect("classifies");
        assert_eq!(first, second);
    }

    #[test]
    fn test_regime_wire_labels() {
        assert_eq!(MarketRegime::TrendingUp.as_str(), "TRENDING_UP");
        let json = serde_json::to_string(&MarketRegime::MeanReverting).expect("serializes");
        assert_eq!(json, "\"MEAN_REVERTING\"");
    }
}
