//! Risk gate limits and sizing configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::risk::SizingMethod;

/// Risk gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Drawdown at or beyond which the circuit breaker halts trading.
    #[serde(default = "default_max_drawdown")]
    pub max_drawdown: Decimal,
    /// ATR multiple used to place the protective stop.
    #[serde(default = "default_atr_stop_multiple")]
    pub atr_stop_multiple: Decimal,
    /// Fraction of equity risked per trade under fixed-fractional sizing.
    #[serde(default = "default_max_position_risk")]
    pub max_position_risk: Decimal,
    /// Ceiling on committed plus proposed risk across the portfolio.
    #[serde(default = "default_max_portfolio_heat")]
    pub max_portfolio_heat: Decimal,
    /// Sizing method for new positions.
    #[serde(default = "default_sizing_method")]
    pub sizing_method: SizingMethod,
    /// Upper bound on the Kelly fraction.
    #[serde(default = "default_kelly_cap")]
    pub kelly_cap: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_drawdown: default_max_drawdown(),
            atr_stop_multiple: default_atr_stop_multiple(),
            max_position_risk: default_max_position_risk(),
            max_portfolio_heat: default_max_portfolio_heat(),
            sizing_method: default_sizing_method(),
            kelly_cap: default_kelly_cap(),
        }
    }
}

fn default_max_drawdown() -> Decimal {
    dec!(0.15)
}

fn default_atr_stop_multiple() -> Decimal {
    dec!(2.0)
}

fn default_max_position_risk() -> Decimal {
    dec!(0.02)
}

fn default_max_portfolio_heat() -> Decimal {
    dec!(0.10)
}

const fn default_sizing_method() -> SizingMethod {
    SizingMethod::FixedFractional
}

fn default_kelly_cap() -> Decimal {
    dec!(0.25)
}
