//! Regime-conditional interpretation of indicator readings.
//!
//! The same RSI value means different things in different regimes: 28 in
//! a mean-reverting market is a dip to buy, 28 in a confirmed downtrend
//! is a falling knife. This module is a pure lookup table over the closed
//! regime set; given the same reading and regime it always returns the
//! same verdict.

use serde::{Deserialize, Serialize};

use crate::models::TradeAction;
use crate::regime::MarketRegime;

/// Standard oversold boundary.
const OVERSOLD: f64 = 30.0;
/// Standard overbought boundary.
const OVERBOUGHT: f64 = 70.0;
/// Reading treated as trend exhaustion even inside an uptrend.
const EXHAUSTION: f64 = 80.0;
/// Reading treated as capitulation in a volatile tape.
const CAPITULATION: f64 = 20.0;

/// A mapped signal with its conviction and rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalVerdict {
    /// Suggested action.
    pub action: TradeAction,
    /// Conviction in `[0, 1]`.
    pub confidence: f64,
    /// Why the reading maps to this action in this regime.
    pub rationale: String,
}

impl SignalVerdict {
    fn new(action: TradeAction, confidence: f64, rationale: &str) -> Self {
        Self {
            action,
            confidence,
            rationale: rationale.to_string(),
        }
    }
}

/// Map an RSI reading to an action under the prevailing regime.
///
/// The match is exhaustive over [`MarketRegime`]; adding a regime without
/// deciding its signal rows is a compile error.
#[must_use]
pub fn map_rsi(rsi: f64, regime: MarketRegime) -> SignalVerdict {
    match regime {
        MarketRegime::TrendingUp => {
            if rsi < OVERSOLD {
                SignalVerdict::new(TradeAction::Buy, 0.8, "oversold pullback within an uptrend")
            } else if rsi >= EXHAUSTION {
                SignalVerdict::new(TradeAction::Sell, 0.7, "exhaustion reading in an uptrend")
            } else if rsi > OVERBOUGHT {
                // Overbought alone is not a reason to fight the trend.
                SignalVerdict::new(
                    TradeAction::Hold,
                    0.6,
                    "overbought but trend intact, no countertrend sell",
                )
            } else {
                SignalVerdict::new(TradeAction::Hold, 0.5, "no edge from RSI in this range")
            }
        }
        MarketRegime::TrendingDown => {
            if rsi > OVERBOUGHT {
                SignalVerdict::new(TradeAction::Sell, 0.8, "overbought rally within a downtrend")
            } else if rsi < OVERSOLD {
                // Oversold stays oversold in a confirmed downtrend.
                SignalVerdict::new(
                    TradeAction::Hold,
                    0.6,
                    "oversold in a downtrend, no countertrend buy",
                )
            } else {
                SignalVerdict::new(TradeAction::Hold, 0.5, "no edge from RSI in this range")
            }
        }
        MarketRegime::MeanReverting => {
            if rsi < OVERSOLD {
                SignalVerdict::new(TradeAction::Buy, 0.75, "oversold in a mean-reverting market")
            } else if rsi > OVERBOUGHT {
                SignalVerdict::new(TradeAction::Sell, 0.75, "overbought in a mean-reverting market")
            } else {
                SignalVerdict::new(TradeAction::Hold, 0.5, "inside the reversion band")
            }
        }
        MarketRegime::Volatile => {
            if rsi < CAPITULATION {
                SignalVerdict::new(TradeAction::Buy, 0.5, "capitulation reading in a volatile tape")
            } else if rsi > EXHAUSTION {
                SignalVerdict::new(TradeAction::Sell, 0.5, "blow-off reading in a volatile tape")
            } else {
                SignalVerdict::new(TradeAction::Hold, 0.4, "standing aside in elevated volatility")
            }
        }
        MarketRegime::Sideways => {
            if rsi < OVERSOLD {
                SignalVerdict::new(TradeAction::Buy, 0.6, "oversold at the bottom of the range")
            } else if rsi > OVERBOUGHT {
                SignalVerdict::new(TradeAction::Sell, 0.6, "overbought at the top of the range")
            } else {
                SignalVerdict::new(TradeAction::Hold, 0.5, "mid-range, no signal")
            }
        }
    }
}
