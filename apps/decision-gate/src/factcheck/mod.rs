//! Two-layer fact validation engine.
//!
//! Every natural-language claim an agent makes is checked against the
//! cycle's ground truth before it can influence a trade:
//!
//! 1. **Numeric hard-check**: extract the figure from claim and ground
//!    truth and compare. Divergence beyond tolerance is a contradiction
//!    at confidence 1.0 and short-circuits everything else.
//! 2. **Semantic check**: an entailment model (when configured) or a
//!    deterministic directional-keyword fallback judges the claim
//!    against a rendered ground-truth premise.
//!
//! Results are cached per claim per trading date, so repeated claims
//! inside a session cost one lookup.

mod cache;
mod numeric;
mod semantic;
mod types;

use std::sync::Arc;

use crate::config::FactCheckConfig;
use crate::models::GroundTruthFacts;
use crate::observability::metrics::record_fact_check;

pub use cache::{CacheKey, ValidationCache, cache_key};
pub use semantic::{EntailmentJudgment, EntailmentPort, StaticEntailment};
pub use types::{Claim, ClaimDomain, FactCheckResult, FactLabel};

/// One claim together with its validation result.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimCheck {
    /// The classified claim.
    pub claim: Claim,
    /// Its validation result.
    pub result: FactCheckResult,
}

/// All claim checks for one cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationSummary {
    /// Per-claim outcomes in input order.
    pub checks: Vec<ClaimCheck>,
}

impl ValidationSummary {
    /// True when no claim was contradicted.
    #[must_use]
    pub fn all_valid(&self) -> bool {
        self.checks.iter().all(|check| check.result.valid)
    }

    /// The contradicted claims, if any.
    pub fn contradictions(&self) -> impl Iterator<Item = &ClaimCheck> {
        self.checks
            .iter()
            .filter(|check| check.result.label == FactLabel::Contradiction)
    }

    /// How many checks were served from cache.
    #[must_use]
    pub fn cache_hits(&self) -> usize {
        self.checks.iter().filter(|check| check.result.cached).count()
    }
}

/// The validation engine. One instance is shared across cycles.
pub struct FactChecker {
    tolerance: f64,
    cache: ValidationCache,
    entailment: Option<Arc<dyn EntailmentPort>>,
}

impl std::fmt::Debug for FactChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactChecker")
            .field("tolerance", &self.tolerance)
            .field("cache_len", &self.cache.len())
            .field("has_entailment", &self.entailment.is_some())
            .finish()
    }
}

impl FactChecker {
    /// Build an engine with the keyword fallback only.
    #[must_use]
    pub fn new(config: &FactCheckConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            cache: ValidationCache::new(config.cache_capacity),
            entailment: None,
        }
    }

    /// Attach an entailment model for the semantic layer.
    #[must_use]
    pub fn with_entailment(mut self, port: Arc<dyn EntailmentPort>) -> Self {
        self.entailment = Some(port);
        self
    }

    /// The engine's cache, for day-boundary clears and inspection.
    #[must_use]
    pub const fn cache(&self) -> &ValidationCache {
        &self.cache
    }

    /// Validate one claim against the cycle's ground truth.
    pub async fn check_claim(&self, text: &str, facts: &GroundTruthFacts) -> FactCheckResult {
        let key = cache_key(text, facts.trading_date);
        if let Some(hit) = self.cache.get(&key) {
            record_fact_check(hit.label.as_str(), true);
            return hit;
        }

        let claim = Claim::classify(text);
        let result = match semantic::build_premise(claim.domain, facts) {
            None => FactCheckResult::fresh(
                FactLabel::Neutral,
                0.5,
                format!(
                    "no ground truth available for {} claim",
                    claim.domain.as_str().to_lowercase()
                ),
            ),
            Some(premise) => {
                if let Some(hard_fail) = numeric::contradiction(&claim.text, &premise, self.tolerance)
                {
                    hard_fail
                } else {
                    let judgment = match &self.entailment {
                        Some(port) => match port.judge(&premise, &claim.text).await {
                            Ok(judgment) => judgment,
                            Err(err) => {
                                tracing::warn!(
                                    error = %err,
                                    "entailment call failed, falling back to keywords"
                                );
                                semantic::keyword_judgment(&premise, &claim.text)
                            }
                        },
                        None => semantic::keyword_judgment(&premise, &claim.text),
                    };
                    FactCheckResult::fresh(judgment.label, judgment.confidence, premise)
                }
            }
        };

        self.cache.insert(key, result.clone());
        record_fact_check(result.label.as_str(), false);
        result
    }

    /// Validate a batch of claims in input order.
    pub async fn check_all(
        &self,
        claims: &[String],
        facts: &GroundTruthFacts,
    ) -> ValidationSummary {
        let mut checks = Vec::with_capacity(claims.len());
        for text in claims {
            let result = self.check_claim(text, facts).await;
            checks.push(ClaimCheck {
                claim: Claim::classify(text.clone()),
                result,
            });
        }
        ValidationSummary { checks }
    }
}
