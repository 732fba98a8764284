//! Deterministic risk gate.
//!
//! Final quantity authority between an agent's trade proposal and
//! execution. The gate never passes an upstream quantity through
//! verbatim: approved Buys carry the gate's own computed size and stop,
//! and every rejection names the specific limit that was breached.
//!
//! Checks run in a fixed order so the same inputs always produce the
//! same rejection:
//!
//! | Order | Check | Rejection code |
//! |-------|-------|----------------|
//! | a | circuit breaker (drawdown) | `CIRCUIT_BREAKER_ACTIVE` |
//! | b | market data quality | `BAD_MARKET_DATA` |
//! | c | Buy sizing | `ZERO_RISK_PER_SHARE`, `NON_POSITIVE_EQUITY` |
//! | d | portfolio heat | `PORTFOLIO_HEAT_EXCEEDED` |
//! | e | Sell position check | `NO_OPEN_POSITION` |
//! | f | Hold | always passes |

mod sizing;

pub use sizing::{PositionSizer, SizedPosition, SizingError, SizingMethod, kelly_fraction};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::RiskConfig;
use crate::models::{MarketSnapshot, PortfolioState, TradeAction, TradeProposal};

/// Trading is halted account-wide by the drawdown circuit breaker.
pub const CIRCUIT_BREAKER_ACTIVE: &str = "CIRCUIT_BREAKER_ACTIVE";
/// Market data is missing or unusable for risk computation.
pub const BAD_MARKET_DATA: &str = "BAD_MARKET_DATA";
/// Account equity is zero or negative.
pub const NON_POSITIVE_EQUITY: &str = "NON_POSITIVE_EQUITY";
/// The stop distance collapsed to zero.
pub const ZERO_RISK_PER_SHARE: &str = "ZERO_RISK_PER_SHARE";
/// Committed plus proposed risk breaches the portfolio heat ceiling.
pub const PORTFOLIO_HEAT_EXCEEDED: &str = "PORTFOLIO_HEAT_EXCEEDED";
/// A Sell was proposed for a ticker with no open position.
pub const NO_OPEN_POSITION: &str = "NO_OPEN_POSITION";

/// A machine-readable rejection with its human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskRejection {
    /// Stable code naming the breached limit.
    pub code: String,
    /// Sentence describing the breach with the numbers involved.
    pub reason: String,
}

/// Risk quantities observed while evaluating a proposal.
///
/// Populated as far as evaluation got; a rejection at the data-quality
/// check still reports committed heat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Open-position risk as a fraction of equity.
    pub committed_heat: Decimal,
    /// Risk the proposed trade would add, as a fraction of equity.
    pub proposed_risk_pct: Option<Decimal>,
    /// Committed plus proposed heat.
    pub total_heat: Option<Decimal>,
    /// Dollars at risk per share between entry and stop.
    pub risk_per_share: Option<Decimal>,
    /// Protective stop for an approved or sized Buy.
    pub stop_loss: Option<Decimal>,
    /// Kelly fraction applied, when Kelly sizing was in effect.
    pub kelly_fraction: Option<Decimal>,
}

/// Result of running a proposal through the gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskGateOutcome {
    /// Whether the proposal may proceed to the gatekeeper.
    pub approved: bool,
    /// The proposal with the gate's own quantity, when approved.
    pub adjusted_proposal: Option<TradeProposal>,
    /// The first breached limit, when rejected.
    pub rejection: Option<RiskRejection>,
    /// Risk quantities observed during evaluation.
    pub metrics: RiskMetrics,
    /// Note emitted when the gate's quantity differs from the proposal's.
    pub override_message: Option<String>,
}

impl RiskGateOutcome {
    /// Rejection code, when rejected.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.rejection.as_ref().map(|r| r.code.as_str())
    }

    fn approved(
        proposal: TradeProposal,
        metrics: RiskMetrics,
        override_message: Option<String>,
    ) -> Self {
        Self {
            approved: true,
            adjusted_proposal: Some(proposal),
            rejection: None,
            metrics,
            override_message,
        }
    }

    fn rejected(code: &str, reason: String, metrics: RiskMetrics) -> Self {
        tracing::debug!(code, %reason, "risk gate rejection");
        Self {
            approved: false,
            adjusted_proposal: None,
            rejection: Some(RiskRejection {
                code: code.to_owned(),
                reason,
            }),
            metrics,
            override_message: None,
        }
    }
}

/// The deterministic risk gate.
#[derive(Debug, Clone)]
pub struct RiskGate {
    max_drawdown: Decimal,
    max_portfolio_heat: Decimal,
    sizer: PositionSizer,
}

impl RiskGate {
    /// Build a gate from configuration.
    #[must_use]
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            max_drawdown: config.max_drawdown,
            max_portfolio_heat: config.max_portfolio_heat,
            sizer: PositionSizer::new(
                config.sizing_method,
                config.atr_stop_multiple,
                config.max_position_risk,
                config.kelly_cap,
            ),
        }
    }

    /// Evaluate a proposal against the portfolio and current market data.
    #[must_use]
    pub fn evaluate(
        &self,
        proposal: &TradeProposal,
        portfolio: &PortfolioState,
        snapshot: &MarketSnapshot,
    ) -> RiskGateOutcome {
        let mut metrics = RiskMetrics {
            committed_heat: portfolio.committed_risk(),
            ..RiskMetrics::default()
        };

        if proposal.action != TradeAction::Hold && portfolio.current_drawdown >= self.max_drawdown
        {
            return RiskGateOutcome::rejected(
                CIRCUIT_BREAKER_ACTIVE,
                format!(
                    "circuit breaker active: drawdown {} at or beyond the {} halt threshold",
                    percent(portfolio.current_drawdown),
                    percent(self.max_drawdown)
                ),
                metrics,
            );
        }

        if proposal.action == TradeAction::Hold {
            let mut adjusted = proposal.clone();
            adjusted.quantity = Some(0);
            return RiskGateOutcome::approved(adjusted, metrics, None);
        }

        let close = match snapshot.close {
            Some(close) if close > Decimal::ZERO => close,
            _ => {
                return RiskGateOutcome::rejected(
                    BAD_MARKET_DATA,
                    "close price is missing or non-positive".to_owned(),
                    metrics,
                );
            }
        };
        match snapshot.volume {
            Some(volume) if volume > 0 => {}
            _ => {
                return RiskGateOutcome::rejected(
                    BAD_MARKET_DATA,
                    "volume is missing or zero".to_owned(),
                    metrics,
                );
            }
        }

        if proposal.action == TradeAction::Buy {
            self.evaluate_buy(proposal, portfolio, snapshot, close, metrics)
        } else {
            Self::evaluate_sell(proposal, portfolio, metrics)
        }
    }

    fn evaluate_buy(
        &self,
        proposal: &TradeProposal,
        portfolio: &PortfolioState,
        snapshot: &MarketSnapshot,
        close: Decimal,
        mut metrics: RiskMetrics,
    ) -> RiskGateOutcome {
        let Some(atr) = snapshot.atr else {
            return RiskGateOutcome::rejected(
                BAD_MARKET_DATA,
                "ATR is unavailable; a stop cannot be placed".to_owned(),
                metrics,
            );
        };

        let sized = match self.sizer.size_buy(portfolio, close, atr) {
            Ok(sized) => sized,
            Err(SizingError::ZeroRiskPerShare) => {
                return RiskGateOutcome::rejected(
                    ZERO_RISK_PER_SHARE,
                    format!("stop distance is zero for ATR {atr}; size would be unbounded"),
                    metrics,
                );
            }
            Err(SizingError::NonPositiveEquity) => {
                return RiskGateOutcome::rejected(
                    NON_POSITIVE_EQUITY,
                    format!("equity {} cannot fund a new position", portfolio.equity),
                    metrics,
                );
            }
        };

        metrics.proposed_risk_pct = Some(sized.risk_pct);
        metrics.risk_per_share = Some(sized.risk_per_share);
        metrics.stop_loss = Some(sized.stop_loss);
        metrics.kelly_fraction = sized.kelly_fraction;
        let total_heat = metrics.committed_heat + sized.risk_pct;
        metrics.total_heat = Some(total_heat);

        if total_heat > self.max_portfolio_heat {
            return RiskGateOutcome::rejected(
                PORTFOLIO_HEAT_EXCEEDED,
                format!(
                    "PORTFOLIO HEAT EXCEEDED: committed {} plus new {} breaches the {} ceiling",
                    percent(metrics.committed_heat),
                    percent(sized.risk_pct),
                    percent(self.max_portfolio_heat)
                ),
                metrics,
            );
        }

        let override_message = match proposal.quantity {
            Some(upstream) if upstream != sized.quantity => Some(format!(
                "proposed quantity {upstream} overridden to risk-based quantity {}",
                sized.quantity
            )),
            _ if sized.quantity == 0 => {
                Some("risk budget supports zero shares at this stop distance".to_owned())
            }
            _ => None,
        };

        let mut adjusted = proposal.clone();
        adjusted.quantity = Some(sized.quantity);
        RiskGateOutcome::approved(adjusted, metrics, override_message)
    }

    fn evaluate_sell(
        proposal: &TradeProposal,
        portfolio: &PortfolioState,
        metrics: RiskMetrics,
    ) -> RiskGateOutcome {
        let Some(position) = portfolio.position(&proposal.ticker) else {
            return RiskGateOutcome::rejected(
                NO_OPEN_POSITION,
                format!("no open position in {} to sell", proposal.ticker),
                metrics,
            );
        };

        let override_message = match proposal.quantity {
            Some(upstream) if upstream != position.quantity => Some(format!(
                "proposed quantity {upstream} overridden to full position size {}",
                position.quantity
            )),
            _ => None,
        };

        let mut adjusted = proposal.clone();
        adjusted.quantity = Some(position.quantity);
        RiskGateOutcome::approved(adjusted, metrics, override_message)
    }
}

/// Render a fractional value as a rounded percentage for messages.
fn percent(fraction: Decimal) -> String {
    format!("{}%", (fraction * dec!(100)).round_dp(2).normalize())
}
