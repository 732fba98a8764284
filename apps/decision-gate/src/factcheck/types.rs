//! Claim and verdict types for fact validation.

use serde::{Deserialize, Serialize};

/// The domain a claim asserts something about.
///
/// Classification drives which ground-truth field the claim is checked
/// against. Claims that match no numeric domain are qualitative and can
/// only ever validate as neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimDomain {
    /// Revenue, sales, or earnings figures.
    Revenue,
    /// Price action over a lookback window.
    Price,
    /// Indicator readings (RSI, moving averages, volume).
    Technical,
    /// Narrative assertions with no numeric ground truth.
    Qualitative,
}

impl ClaimDomain {
    /// Stable wire label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Revenue => "REVENUE",
            Self::Price => "PRICE",
            Self::Technical => "TECHNICAL",
            Self::Qualitative => "QUALITATIVE",
        }
    }
}

/// An atomic assertion extracted from an agent payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// The claim text as the agent produced it.
    pub text: String,
    /// Classified domain.
    pub domain: ClaimDomain,
}

impl Claim {
    /// Classify a raw claim string into its domain.
    ///
    /// Keyword classification, most specific domain first: technical
    /// indicator vocabulary beats price vocabulary because claims like
    /// "RSI shows the price is stretched" are about the indicator.
    #[must_use]
    pub fn classify(text: impl Into<String>) -> Self {
        const TECHNICAL: &[&str] = &[
            "rsi",
            "macd",
            "moving average",
            "golden cross",
            "death cross",
            "momentum",
            "oversold",
            "overbought",
            "support",
            "resistance",
            "volume",
        ];
        const REVENUE: &[&str] = &["revenue", "sales", "earnings", "eps", "profit", "margin"];
        const PRICE: &[&str] = &["price", "stock", "share", "rallied", "sold off", "traded"];

        let text = text.into();
        let lowered = text.to_lowercase();
        let domain = if TECHNICAL.iter().any(|kw| lowered.contains(kw)) {
            ClaimDomain::Technical
        } else if REVENUE.iter().any(|kw| lowered.contains(kw)) {
            ClaimDomain::Revenue
        } else if PRICE.iter().any(|kw| lowered.contains(kw)) {
            ClaimDomain::Price
        } else {
            ClaimDomain::Qualitative
        };
        Self { text, domain }
    }
}

/// Entailment label for a checked claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactLabel {
    /// Ground truth supports the claim.
    Entailment,
    /// Ground truth contradicts the claim.
    Contradiction,
    /// Ground truth neither supports nor contradicts the claim.
    Neutral,
}

impl FactLabel {
    /// Stable wire label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Entailment => "ENTAILMENT",
            Self::Contradiction => "CONTRADICTION",
            Self::Neutral => "NEUTRAL",
        }
    }
}

/// Outcome of validating one claim against ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCheckResult {
    /// Whether the claim may be relied on (false only on contradiction).
    pub valid: bool,
    /// Entailment label.
    pub label: FactLabel,
    /// Confidence in the label, in `[0, 1]`.
    pub confidence: f64,
    /// The ground-truth statement or comparison the label rests on.
    pub evidence: String,
    /// Whether this result was served from the validation cache.
    pub cached: bool,
}

impl FactCheckResult {
    /// A fresh (uncached) result. `valid` is derived from the label.
    #[must_use]
    pub fn fresh(label: FactLabel, confidence: f64, evidence: impl Into<String>) -> Self {
        Self {
            valid: label != FactLabel::Contradiction,
            label,
            confidence,
            evidence: evidence.into(),
            cached: false,
        }
    }
}
