//! Trade proposal and final decision types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Trading action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    /// Enter or add to a position.
    Buy,
    /// Exit a position.
    Sell,
    /// Do nothing this cycle.
    Hold,
}

impl TradeAction {
    /// Stable wire label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

/// The trader agent's proposed action for one cycle.
///
/// Advisory only: quantity and confidence are inputs to the risk gate and
/// gatekeeper, never commitments. The gate recomputes size from scratch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeProposal {
    /// Instrument ticker.
    pub ticker: String,
    /// Proposed action.
    pub action: TradeAction,
    /// Proposed share quantity, if the agent offered one.
    #[serde(default)]
    pub quantity: Option<u64>,
    /// Agent confidence in `[0, 1]`.
    pub confidence: f64,
    /// Natural-language rationale.
    pub reasoning: String,
}

impl TradeProposal {
    /// Validate boundary invariants: non-empty ticker, bounded confidence.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.ticker.trim().is_empty() {
            return Err(InputError::EmptyTicker);
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(InputError::ConfidenceOutOfRange {
                value: self.confidence,
            });
        }
        Ok(())
    }
}

/// The final, always-present decision a cycle produces.
///
/// Every field is populated on every path. When any gate fails, the
/// pipeline materializes the dead state instead of returning nothing, so
/// callers never have to distinguish "no decision" from "decided not to
/// trade".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDecision {
    /// Final action after all gates.
    pub action: TradeAction,
    /// Final share quantity (0 unless an approved Buy/Sell).
    pub quantity: u64,
    /// Confidence carried from the proposal, 0.0 on dead states.
    pub confidence: f64,
    /// Reasoning, naming the deciding gate when one blocked the trade.
    pub reasoning: String,
    /// Whether claim validation passed.
    pub fact_check_passed: bool,
    /// Whether the risk gate approved.
    pub risk_gate_passed: bool,
    /// Notional value of the position at entry.
    pub position_size: Decimal,
    /// Stop-loss price, when one was computed.
    pub stop_loss: Option<Decimal>,
    /// Fraction of equity at risk, when computed.
    pub risk_pct: Option<Decimal>,
}

impl TradeDecision {
    /// The safe do-nothing decision, naming the gate that forced it.
    #[must_use]
    pub fn dead_state(reason: impl Into<String>) -> Self {
        Self {
            action: TradeAction::Hold,
            quantity: 0,
            confidence: 0.0,
            reasoning: reason.into(),
            fact_check_passed: false,
            risk_gate_passed: false,
            position_size: Decimal::ZERO,
            stop_loss: None,
            risk_pct: None,
        }
    }

    /// Whether this decision results in an order being placed.
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        matches!(self.action, TradeAction::Buy | TradeAction::Sell) && self.quantity > 0
    }
}
