//! Layer 2: semantic entailment.
//!
//! Builds a one-sentence ground-truth premise for the claim's domain and
//! asks an entailment model whether the premise supports the claim. When
//! no model is configured, or the call fails, a directional-keyword
//! comparison stands in: crude, but deterministic and fail-safe.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ReasoningError;
use crate::factcheck::numeric::infer_direction;
use crate::factcheck::types::{ClaimDomain, FactLabel};
use crate::models::GroundTruthFacts;

/// Fallback confidence when keyword directions agree.
const KEYWORD_ENTAILMENT_CONFIDENCE: f64 = 0.8;
/// Fallback confidence when keyword directions conflict.
const KEYWORD_CONTRADICTION_CONFIDENCE: f64 = 0.9;
/// Confidence when neither side carries direction.
const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// An entailment model's judgment of premise vs hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntailmentJudgment {
    /// The relation the model assigns.
    pub label: FactLabel,
    /// Model confidence in `[0, 1]`.
    pub confidence: f64,
}

/// External natural-language-inference model.
///
/// Implemented by the host against whatever NLI backend it runs. The
/// engine treats a failed call as "no model": it falls back to keywords
/// rather than failing the claim.
#[async_trait]
pub trait EntailmentPort: Send + Sync {
    /// Judge whether `premise` entails `hypothesis`.
    async fn judge(
        &self,
        premise: &str,
        hypothesis: &str,
    ) -> Result<EntailmentJudgment, ReasoningError>;
}

/// Fixed-judgment port for tests and offline runs.
#[derive(Debug, Clone, Copy)]
pub struct StaticEntailment {
    judgment: EntailmentJudgment,
}

impl StaticEntailment {
    /// A port that always returns the given judgment.
    #[must_use]
    pub const fn new(judgment: EntailmentJudgment) -> Self {
        Self { judgment }
    }
}

#[async_trait]
impl EntailmentPort for StaticEntailment {
    async fn judge(
        &self,
        _premise: &str,
        _hypothesis: &str,
    ) -> Result<EntailmentJudgment, ReasoningError> {
        Ok(self.judgment)
    }
}

/// Render the ground-truth premise for a claim domain.
///
/// `None` when the domain is qualitative or the facts carry no value for
/// it; such claims validate as neutral.
#[must_use]
pub(crate) fn build_premise(domain: ClaimDomain, facts: &GroundTruthFacts) -> Option<String> {
    match domain {
        ClaimDomain::Revenue => facts.revenue_growth_yoy.map(|growth| {
            let pct = growth * 100.0;
            if growth >= 0.0 {
                format!("Revenue grew {pct:.2}% year over year.")
            } else {
                format!("Revenue fell {:.2}% year over year.", pct.abs())
            }
        }),
        ClaimDomain::Price => facts.price_change_pct.map(|change| {
            let pct = change * 100.0;
            if change >= 0.0 {
                format!("The stock price rose {pct:.2}% over the lookback window.")
            } else {
                format!("The stock price fell {:.2}% over the lookback window.", pct.abs())
            }
        }),
        // The period stays out of the sentence so the numeric layer
        // extracts the reading itself, not the window length.
        ClaimDomain::Technical => facts
            .rsi
            .map(|rsi| format!("The RSI reading is {rsi:.1}.")),
        ClaimDomain::Qualitative => None,
    }
}

/// Deterministic keyword fallback for when no model is available.
pub(crate) fn keyword_judgment(premise: &str, hypothesis: &str) -> EntailmentJudgment {
    match (infer_direction(premise), infer_direction(hypothesis)) {
        (Some(premise_dir), Some(claim_dir)) => {
            if premise_dir == claim_dir {
                EntailmentJudgment {
                    label: FactLabel::Entailment,
                    confidence: KEYWORD_ENTAILMENT_CONFIDENCE,
                }
            } else {
                EntailmentJudgment {
                    label: FactLabel::Contradiction,
                    confidence: KEYWORD_CONTRADICTION_CONFIDENCE,
                }
            }
        }
        _ => EntailmentJudgment {
            label: FactLabel::Neutral,
            confidence: NEUTRAL_CONFIDENCE,
        },
    }
}
