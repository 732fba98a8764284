//! Structured payloads produced by the reasoning agents.
//!
//! Each agent's free-form model output is forced through these serde
//! schemas exactly once, at the enforcer boundary. Downstream stages only
//! ever see the typed forms.

use serde::{Deserialize, Serialize};

use crate::models::TradeProposal;

/// Which side of the research debate a stance argues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StanceSide {
    /// Argues for entering or holding the position.
    Bull,
    /// Argues against the position.
    Bear,
}

/// An analyst agent's report for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystReport {
    /// Which analyst produced the report (e.g. `fundamentals`, `news`).
    pub analyst: String,
    /// Atomic factual claims to be validated against ground truth.
    pub claims: Vec<String>,
    /// One-paragraph summary of the report.
    pub summary: String,
}

/// One side of the researcher debate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearcherStance {
    /// Bull or bear.
    pub side: StanceSide,
    /// Conviction in `[0, 1]`.
    pub confidence: f64,
    /// The thesis being argued.
    pub thesis: String,
    /// Claims supporting the thesis, validated like analyst claims.
    #[serde(default)]
    pub claims: Vec<String>,
}

/// Bull and bear conviction after the debate round.
///
/// Consumed by the gatekeeper's divergence gate. Absent when the host ran
/// no debate this cycle, in which case the divergence gate passes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebateSummary {
    /// Bull researcher's final confidence.
    pub bull_confidence: f64,
    /// Bear researcher's final confidence.
    pub bear_confidence: f64,
}

impl DebateSummary {
    /// Absolute conviction gap between the two sides.
    #[must_use]
    pub fn divergence(&self) -> f64 {
        (self.bull_confidence - self.bear_confidence).abs()
    }
}

/// A validated payload from any agent, tagged by role.
///
/// The closed set means an unknown agent role fails at parse time instead
/// of flowing through the pipeline unchecked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "agent", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentPayload {
    /// Analyst report.
    Analyst(AnalystReport),
    /// Researcher debate stance.
    Researcher(ResearcherStance),
    /// Trader proposal.
    Trader(TradeProposal),
}

impl AgentPayload {
    /// All factual claims this payload asserts.
    #[must_use]
    pub fn claims(&self) -> Vec<&str> {
        match self {
            Self::Analyst(report) => report.claims.iter().map(String::as_str).collect(),
            Self::Researcher(stance) => stance.claims.iter().map(String::as_str).collect(),
            Self::Trader(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TradeAction;

    #[test]
    fn test_tagged_payload_round_trip() {
        let payload = AgentPayload::Analyst(AnalystReport {
            analyst: "fundamentals".to_string(),
            claims: vec!["Revenue grew 12% year over year".to_string()],
            summary: "Strong quarter".to_string(),
        });
        let json = serde_json::to_string(&payload).expect("serializes");
        assert!(json.contains("\"agent\":\"ANALYST\""));
        let back: AgentPayload = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, payload);
    }

    #[test]
    fn test_unknown_agent_tag_rejected() {
        let json = r#"{"agent":"ORACLE","claims":[],"summary":""}"#;
        assert!(serde_json::from_str::<AgentPayload>(json).is_err());
    }

    #[test]
    fn test_trader_payload_carries_proposal() {
        let json = r#"{
            "agent": "TRADER",
            "ticker": "NVDA",
            "action": "BUY",
            "quantity": 50,
            "confidence": 0.9,
            "reasoning": "Breakout with volume"
        }"#;
        let payload: AgentPayload = serde_json::from_str(json).expect("deserializes");
        match payload {
            AgentPayload::Trader(proposal) => {
                assert_eq!(proposal.action, TradeAction::Buy);
                assert_eq!(proposal.quantity, Some(50));
            }
            other => panic!("expected trader payload, got {other:?}"),
        }
    }

    #[test]
    fn test_divergence() {
        let debate = DebateSummary {
            bull_confidence: 0.9,
            bear_confidence: 0.3,
        };
        assert!((debate.divergence() - 0.6).abs() < 1e-12);
    }
}
