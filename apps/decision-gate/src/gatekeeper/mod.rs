//! Execution gatekeeper.
//!
//! The last authority before an order leaves the system. Gates run in a
//! fixed order and each one short-circuits, so the outcome always names
//! the first failing condition; approval is only reachable after every
//! gate has explicitly passed.
//!
//! 1. ledger integrity — nil identifier aborts the cycle
//! 2. compliance — restricted patterns in the insider payload
//! 3. staleness — any source older than the configured maximum
//! 4. confidence floor for non-Hold actions
//! 5. researcher divergence weighted by proposal confidence
//! 6. trend override — a Sell against a bullish tape is downgraded to
//!    Hold, keeping the original intent on record
//! 7. approval, carrying the risk-adjusted action and size unchanged

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::GatekeeperConfig;
use crate::ledger::FactLedger;
use crate::models::{DebateSummary, TradeAction, TradeProposal};

/// An intent the gatekeeper refused to execute as proposed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockedIntent {
    /// Action the upstream pipeline wanted.
    pub action: TradeAction,
    /// Risk-adjusted quantity that would have been sent.
    pub quantity: u64,
    /// Proposal confidence at the time of the block.
    pub confidence: f64,
}

/// The single authoritative outcome of a gatekeeper review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionOutcome {
    /// Every gate passed; execute as risk-adjusted.
    Approved {
        /// Finalized action.
        action: TradeAction,
        /// Finalized share quantity.
        quantity: u64,
        /// Proposal confidence carried through unchanged.
        confidence: f64,
        /// Why the review passed.
        reason: String,
    },
    /// The ledger cannot be trusted as a data snapshot.
    AbortDataGap {
        /// What was missing.
        reason: String,
    },
    /// The insider payload matched a restricted pattern.
    AbortCompliance {
        /// Pattern and where it matched.
        reason: String,
    },
    /// A data source exceeded the freshness ceiling.
    AbortStaleData {
        /// Stalest source and its age.
        reason: String,
    },
    /// Proposal confidence fell below the execution floor.
    AbortLowConfidence {
        /// Observed and required confidence.
        reason: String,
    },
    /// Bull and bear researchers disagree too strongly to act.
    AbortDivergence {
        /// Divergence score and ceiling.
        reason: String,
    },
    /// A countertrend Sell was downgraded to Hold.
    BlockedTrend {
        /// Why the tape overrode the proposal.
        reason: String,
        /// The intent that was blocked.
        original: BlockedIntent,
    },
}

impl ExecutionOutcome {
    /// Stable code for audit logs and routing.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Approved { .. } => "APPROVED",
            Self::AbortDataGap { .. } => "ABORT_DATA_GAP",
            Self::AbortCompliance { .. } => "ABORT_COMPLIANCE",
            Self::AbortStaleData { .. } => "ABORT_STALE_DATA",
            Self::AbortLowConfidence { .. } => "ABORT_LOW_CONFIDENCE",
            Self::AbortDivergence { .. } => "ABORT_DIVERGENCE",
            Self::BlockedTrend { .. } => "BLOCKED_TREND",
        }
    }

    /// Human-readable reason attached to the outcome.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::Approved { reason, .. }
            | Self::AbortDataGap { reason }
            | Self::AbortCompliance { reason }
            | Self::AbortStaleData { reason }
            | Self::AbortLowConfidence { reason }
            | Self::AbortDivergence { reason }
            | Self::BlockedTrend { reason, .. } => reason,
        }
    }

    /// Whether the outcome authorizes execution.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }

    /// Action that should actually be taken.
    ///
    /// Everything other than approval resolves to Hold.
    #[must_use]
    pub const fn final_action(&self) -> TradeAction {
        match self {
            Self::Approved { action, .. } => *action,
            _ => TradeAction::Hold,
        }
    }

    /// Share quantity that should actually be sent.
    #[must_use]
    pub const fn final_quantity(&self) -> u64 {
        match self {
            Self::Approved { quantity, .. } => *quantity,
            _ => 0,
        }
    }
}

/// Fail-closed final review of a risk-approved proposal.
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    confidence_floor: f64,
    max_divergence: f64,
    trend_ma_margin: Decimal,
    max_data_age_secs: i64,
    restricted_patterns: Vec<String>,
}

impl Gatekeeper {
    /// Build a gatekeeper from configuration.
    ///
    /// Restricted patterns are lowercased once here so the compliance
    /// scan is case-insensitive.
    #[must_use]
    pub fn new(config: &GatekeeperConfig) -> Self {
        Self {
            confidence_floor: config.confidence_floor,
            max_divergence: config.max_divergence,
            trend_ma_margin: config.trend_ma_margin,
            max_data_age_secs: config.max_data_age_secs,
            restricted_patterns: config
                .restricted_patterns
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
        }
    }

    /// Review a risk-adjusted proposal against the sealed ledger.
    #[must_use]
    pub fn review(
        &self,
        ledger: &FactLedger,
        proposal: &TradeProposal,
        debate: Option<&DebateSummary>,
    ) -> ExecutionOutcome {
        let outcome = self.run_gates(ledger, proposal, debate);
        tracing::debug!(code = outcome.code(), reason = outcome.reason(), "gatekeeper review");
        outcome
    }

    fn run_gates(
        &self,
        ledger: &FactLedger,
        proposal: &TradeProposal,
        debate: Option<&DebateSummary>,
    ) -> ExecutionOutcome {
        if !ledger.has_valid_id() {
            return ExecutionOutcome::AbortDataGap {
                reason: "ledger identifier is nil; data snapshot cannot be trusted".to_owned(),
            };
        }

        if let Some(reason) = self.compliance_violation(ledger) {
            return ExecutionOutcome::AbortCompliance { reason };
        }

        if ledger.is_stale(self.max_data_age_secs) {
            let reason = match ledger.stalest() {
                Some((source, age)) => format!(
                    "{} data is {age}s old, beyond the {}s freshness ceiling",
                    source.as_str(),
                    self.max_data_age_secs
                ),
                None => "source freshness could not be established".to_owned(),
            };
            return ExecutionOutcome::AbortStaleData { reason };
        }

        if proposal.action != TradeAction::Hold && proposal.confidence < self.confidence_floor {
            return ExecutionOutcome::AbortLowConfidence {
                reason: format!(
                    "confidence {:.2} is below the {:.2} execution floor",
                    proposal.confidence, self.confidence_floor
                ),
            };
        }

        if let Some(debate) = debate {
            let score = debate.divergence() * proposal.confidence;
            if score > self.max_divergence {
                return ExecutionOutcome::AbortDivergence {
                    reason: format!(
                        "researcher divergence score {score:.2} exceeds the {:.2} ceiling \
                         (bull {:.2}, bear {:.2})",
                        self.max_divergence, debate.bull_confidence, debate.bear_confidence
                    ),
                };
            }
        }

        if let Some(outcome) = self.trend_override(ledger, proposal) {
            return outcome;
        }

        ExecutionOutcome::Approved {
            action: proposal.action,
            quantity: proposal.quantity.unwrap_or(0),
            confidence: proposal.confidence,
            reason: "all execution gates passed".to_owned(),
        }
    }

    fn compliance_violation(&self, ledger: &FactLedger) -> Option<String> {
        for line in ledger.insider() {
            let lowered = line.to_lowercase();
            for pattern in &self.restricted_patterns {
                if lowered.contains(pattern) {
                    return Some(format!(
                        "insider activity matched restricted pattern \"{pattern}\": {line}"
                    ));
                }
            }
        }
        None
    }

    /// "Don't fight the tape": a Sell while the regime is bullish and
    /// price is extended above the long moving average gets downgraded,
    /// with the refused intent kept on record.
    fn trend_override(
        &self,
        ledger: &FactLedger,
        proposal: &TradeProposal,
    ) -> Option<ExecutionOutcome> {
        if proposal.action != TradeAction::Sell || !ledger.regime().regime.is_bullish() {
            return None;
        }
        let close = ledger.snapshot().close?;
        let ma_long = ledger.snapshot().ma_long?;
        if ma_long <= Decimal::ZERO {
            return None;
        }
        let ceiling = ma_long * (Decimal::ONE + self.trend_ma_margin);
        if close <= ceiling {
            return None;
        }

        Some(ExecutionOutcome::BlockedTrend {
            reason: format!(
                "sell blocked: regime {} with close {close} more than {}% above the long \
                 moving average {ma_long}",
                ledger.regime().regime.as_str(),
                self.trend_ma_margin * Decimal::ONE_HUNDRED
            ),
            original: BlockedIntent {
                action: proposal.action,
                quantity: proposal.quantity.unwrap_or(0),
                confidence: proposal.confidence,
            },
        })
    }
}
