//! Decision cycle orchestrator.
//!
//! Sequences every stage of one decision cycle against one ledger and
//! guarantees a well-formed outcome: business failures at any gate
//! materialize a dead-state decision instead of an error, so callers
//! always receive a complete [`CycleReport`].
//!
//! | Order | Stage | On failure |
//! |-------|-------|------------|
//! | 1 | normalize inputs | `CycleError::Input` |
//! | 2 | regime classification | `CycleError::Regime` |
//! | 3 | enforced reasoning calls | dead state (timeout / exhaustion) |
//! | 4 | claim validation | dead state naming the contradiction |
//! | 5 | ledger seal | `CycleError::Ledger` |
//! | 6 | risk gate | dead state with the rejection code |
//! | 7 | gatekeeper review | dead state for aborts, Hold for blocks |
//!
//! Only the integrity classes (input, short history, ledger) surface as
//! `Err`; everything downstream of a valid snapshot is a business
//! outcome.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::enforcer::{EnforcerStats, ReasoningPort, SchemaEnforcer};
use crate::error::{CycleError, InputError};
use crate::factcheck::{FactChecker, ValidationSummary};
use crate::gatekeeper::{ExecutionOutcome, Gatekeeper};
use crate::ledger::{DataSource, FactLedger, LedgerBuilder, SourceRecord};
use crate::models::{
    AgentPayload, AnalystReport, DebateSummary, GroundTruthFacts, MarketSnapshot, PortfolioState,
    PriceSeries, ResearcherStance, StanceSide, TradeAction, TradeDecision, TradeProposal,
};
use crate::observability::metrics::{
    record_cycle_outcome, record_regime, record_risk_rejection, record_stage_latency,
};
use crate::regime::signal::{SignalVerdict, map_rsi};
use crate::regime::{RegimeAssessment, RegimeClassifier};
use crate::risk::{RiskGate, RiskGateOutcome};

/// Outcome label when the analysis phase exceeded its hard deadline.
pub const ANALYSIS_TIMEOUT: &str = "ANALYSIS_TIMEOUT";
/// Outcome label when a reasoning call exhausted schema enforcement.
pub const SCHEMA_EXHAUSTED: &str = "SCHEMA_EXHAUSTED";
/// Outcome label when the trader proposal failed boundary validation.
pub const INVALID_PROPOSAL: &str = "INVALID_PROPOSAL";
/// Outcome label when claim validation found a contradiction.
pub const FACT_CONTRADICTION: &str = "FACT_CONTRADICTION";

/// One pipeline stage, for timing and metric labels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CycleStage {
    /// Input normalization and validation.
    Normalize,
    /// Regime classification.
    Regime,
    /// Enforced reasoning calls.
    Analysis,
    /// Claim validation against ground truth.
    FactCheck,
    /// Ledger sealing.
    Ledger,
    /// Risk gate evaluation.
    RiskGate,
    /// Gatekeeper review.
    Gatekeeper,
}

impl CycleStage {
    /// Stable wire label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normalize => "NORMALIZE",
            Self::Regime => "REGIME",
            Self::Analysis => "ANALYSIS",
            Self::FactCheck => "FACT_CHECK",
            Self::Ledger => "LEDGER",
            Self::RiskGate => "RISK_GATE",
            Self::Gatekeeper => "GATEKEEPER",
        }
    }
}

/// Per-cycle timing and retry accounting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkflowMetrics {
    /// Wall-clock duration of each stage that completed.
    pub stages: BTreeMap<CycleStage, Duration>,
    /// Reasoning-call attempts consumed across all enforced calls.
    pub enforcement_attempts: u32,
    /// Attempts beyond the first, summed over all enforced calls.
    pub enforcement_retries: u32,
    /// Claim checks served from the validation cache.
    pub cache_hits: usize,
    /// End-to-end cycle duration.
    pub total: Duration,
}

impl WorkflowMetrics {
    /// Duration of one stage, when it ran.
    #[must_use]
    pub fn latency(&self, stage: CycleStage) -> Option<Duration> {
        self.stages.get(&stage).copied()
    }

    fn record(&mut self, stage: CycleStage, elapsed: Duration) {
        record_stage_latency(stage.as_str(), elapsed.as_secs_f64());
        self.stages.insert(stage, elapsed);
    }
}

/// Prompts the host prepared for this cycle's reasoning calls.
///
/// Prompt construction belongs to the host; the gate only sequences and
/// schema-enforces the calls. Empty lists skip the corresponding calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentPrompts {
    /// One prompt per analyst report.
    #[serde(default)]
    pub analysts: Vec<String>,
    /// One prompt per researcher stance.
    #[serde(default)]
    pub researchers: Vec<String>,
    /// The trader proposal prompt.
    pub trader: String,
}

/// Everything the host supplies for one decision cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleInputs {
    /// Instrument ticker under decision.
    pub ticker: String,
    /// Trading date under decision.
    pub trading_date: NaiveDate,
    /// Validated closing-price history.
    pub prices: PriceSeries,
    /// Point-in-time technical snapshot.
    #[serde(default)]
    pub snapshot: MarketSnapshot,
    /// Ground truth claims are validated against.
    pub facts: GroundTruthFacts,
    /// News headlines for the ledger.
    #[serde(default)]
    pub news: Vec<String>,
    /// Insider transaction notes for the compliance scan.
    #[serde(default)]
    pub insider: Vec<String>,
    /// Account snapshot for the risk gate.
    pub portfolio: PortfolioState,
    /// Provenance stamps per data source.
    #[serde(default)]
    pub sources: BTreeMap<DataSource, SourceRecord>,
    /// Prompts for the reasoning calls.
    pub prompts: AgentPrompts,
}

/// The complete product of one decision cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// The always-present final decision.
    pub decision: TradeDecision,
    /// Regime assessment the cycle ran under.
    pub regime: RegimeAssessment,
    /// RSI signal verdict, when the snapshot carried a reading.
    pub signal: Option<SignalVerdict>,
    /// Per-claim validation results; empty when validation never ran.
    pub validation: ValidationSummary,
    /// The sealed ledger, once one existed.
    pub ledger: Option<FactLedger>,
    /// Risk gate outcome, once the gate ran.
    pub risk: Option<RiskGateOutcome>,
    /// Gatekeeper outcome, once the review ran.
    pub outcome: Option<ExecutionOutcome>,
    /// Timing and retry accounting.
    pub metrics: WorkflowMetrics,
}

/// Everything the analysis phase produced.
struct AnalysisOutput {
    payloads: Vec<AgentPayload>,
    proposal: TradeProposal,
    debate: Option<DebateSummary>,
}

/// Sequences the full validation pipeline for one cycle at a time.
///
/// One instance is shared across cycles; the validation cache inside the
/// fact checker is the only shared state.
#[derive(Debug)]
pub struct Orchestrator {
    classifier: RegimeClassifier,
    fact_checker: FactChecker,
    enforcer: SchemaEnforcer,
    risk_gate: RiskGate,
    gatekeeper: Gatekeeper,
    analysis_timeout: Duration,
}

impl Orchestrator {
    /// Build the full pipeline from configuration and a reasoning port.
    #[must_use]
    pub fn new(config: &Config, port: Arc<dyn ReasoningPort>) -> Self {
        Self {
            classifier: RegimeClassifier::new(config.regime.clone()),
            fact_checker: FactChecker::new(&config.factcheck),
            enforcer: SchemaEnforcer::new(port, config.enforcer.clone()),
            risk_gate: RiskGate::new(&config.risk),
            gatekeeper: Gatekeeper::new(&config.gatekeeper),
            analysis_timeout: Duration::from_millis(config.orchestrator.analysis_timeout_ms),
        }
    }

    /// Attach an entailment model to the fact checker's semantic layer.
    #[must_use]
    pub fn with_entailment(mut self, port: Arc<dyn crate::factcheck::EntailmentPort>) -> Self {
        self.fact_checker = self.fact_checker.with_entailment(port);
        self
    }

    /// Lifetime schema-enforcement counters.
    #[must_use]
    pub fn enforcer_stats(&self) -> EnforcerStats {
        self.enforcer.stats()
    }

    /// Drop all cached claim verdicts, for day boundaries.
    pub fn clear_validation_cache(&self) {
        self.fact_checker.cache().clear();
    }

    /// Run one full decision cycle.
    ///
    /// Returns `Err` only for the integrity classes: malformed inputs,
    /// a price history too short to classify, or a ledger that cannot
    /// seal. Every business rejection comes back as `Ok` with a
    /// dead-state decision naming the failing gate.
    pub async fn run_cycle(&self, inputs: CycleInputs) -> Result<CycleReport, CycleError> {
        let started = Instant::now();
        let mut metrics = WorkflowMetrics::default();

        // 1. Normalize inputs
        let stage_started = Instant::now();
        let CycleInputs {
            ticker,
            trading_date,
            prices,
            snapshot,
            facts,
            news,
            insider,
            portfolio,
            sources,
            prompts,
        } = normalize(inputs)?;
        metrics.record(CycleStage::Normalize, stage_started.elapsed());

        // 2. Classify the regime
        let stage_started = Instant::now();
        let assessment = self.classifier.classify(&prices)?;
        metrics.record(CycleStage::Regime, stage_started.elapsed());
        record_regime(assessment.regime.as_str());
        tracing::info!(
            ticker = %ticker,
            regime = assessment.regime.as_str(),
            trend_strength = assessment.metrics.trend_strength,
            "regime classified"
        );
        let signal = snapshot.rsi.map(|rsi| map_rsi(rsi, assessment.regime));

        // 3. Enforced reasoning calls under the analysis deadline
        let stage_started = Instant::now();
        let analysis = tokio::time::timeout(
            self.analysis_timeout,
            self.run_analysis(&prompts, &mut metrics),
        )
        .await;
        metrics.record(CycleStage::Analysis, stage_started.elapsed());

        let AnalysisOutput {
            payloads,
            proposal,
            debate,
        } = match analysis {
            Ok(Ok(output)) => output,
            Ok(Err(reason)) => {
                return Ok(dead_report(
                    SCHEMA_EXHAUSTED,
                    reason,
                    assessment,
                    signal,
                    metrics,
                    started,
                ));
            }
            Err(_) => {
                return Ok(dead_report(
                    ANALYSIS_TIMEOUT,
                    format!(
                        "analysis phase timed out after {}ms",
                        self.analysis_timeout.as_millis()
                    ),
                    assessment,
                    signal,
                    metrics,
                    started,
                ));
            }
        };

        if let Err(error) = proposal.validate() {
            return Ok(dead_report(
                INVALID_PROPOSAL,
                format!("trader proposal rejected: {error}"),
                assessment,
                signal,
                metrics,
                started,
            ));
        }
        if proposal.ticker != ticker {
            return Ok(dead_report(
                INVALID_PROPOSAL,
                format!(
                    "trader proposal names {}, cycle is for {ticker}",
                    proposal.ticker
                ),
                assessment,
                signal,
                metrics,
                started,
            ));
        }

        // 4. Validate claims against ground truth
        let stage_started = Instant::now();
        let claims: Vec<String> = payloads
            .iter()
            .flat_map(AgentPayload::claims)
            .map(str::to_owned)
            .collect();
        let validation = self.fact_checker.check_all(&claims, &facts).await;
        metrics.cache_hits += validation.cache_hits();
        metrics.record(CycleStage::FactCheck, stage_started.elapsed());

        if !validation.all_valid() {
            let detail = validation.contradictions().next().map_or_else(
                || "a claim failed validation".to_owned(),
                |check| {
                    format!(
                        "\"{}\" contradicted by ground truth: {}",
                        check.claim.text, check.result.evidence
                    )
                },
            );
            let mut report = dead_report(
                FACT_CONTRADICTION,
                format!("fact check failed: {detail}"),
                assessment,
                signal,
                metrics,
                started,
            );
            report.validation = validation;
            return Ok(report);
        }

        // 5. Seal the ledger
        let stage_started = Instant::now();
        let mut builder = LedgerBuilder::new(ticker, trading_date)
            .prices(prices)
            .snapshot(snapshot)
            .facts(facts)
            .news(news)
            .insider(insider)
            .agents(payloads)
            .regime(assessment);
        for (source, record) in sources {
            builder = builder.source(source, record.version, record.as_of);
        }
        let ledger = builder.seal()?;
        metrics.record(CycleStage::Ledger, stage_started.elapsed());

        // 6. Risk gate
        let stage_started = Instant::now();
        let risk = self.risk_gate.evaluate(&proposal, &portfolio, ledger.snapshot());
        metrics.record(CycleStage::RiskGate, stage_started.elapsed());

        if !risk.approved {
            let (code, reason) = match &risk.rejection {
                Some(rejection) => (rejection.code.clone(), rejection.reason.clone()),
                None => (
                    "RISK_REJECTED".to_owned(),
                    "risk gate rejected the proposal".to_owned(),
                ),
            };
            record_risk_rejection(&code);
            let mut report = dead_report(
                &code,
                format!("risk gate: {reason}"),
                assessment,
                signal,
                metrics,
                started,
            );
            report.decision.fact_check_passed = true;
            report.validation = validation;
            report.ledger = Some(ledger);
            report.risk = Some(risk);
            return Ok(report);
        }

        // 7. Gatekeeper review of the risk-adjusted proposal
        let adjusted = risk.adjusted_proposal.clone().unwrap_or(proposal);
        let stage_started = Instant::now();
        let outcome = self.gatekeeper.review(&ledger, &adjusted, debate.as_ref());
        metrics.record(CycleStage::Gatekeeper, stage_started.elapsed());

        // 8. Final decision assembly
        let decision = assemble_decision(&outcome, &risk, &ledger);
        metrics.total = started.elapsed();
        record_cycle_outcome(outcome.code());
        tracing::info!(
            ticker = ledger.ticker(),
            code = outcome.code(),
            action = decision.action.as_str(),
            quantity = decision.quantity,
            "cycle complete"
        );

        Ok(CycleReport {
            decision,
            regime: assessment,
            signal,
            validation,
            ledger: Some(ledger),
            risk: Some(risk),
            outcome: Some(outcome),
            metrics,
        })
    }

    /// Run every reasoning call for one cycle, in a fixed order.
    ///
    /// Fails with a dead-state reason as soon as any call exhausts its
    /// enforcement attempts; there is no partial analysis.
    async fn run_analysis(
        &self,
        prompts: &AgentPrompts,
        metrics: &mut WorkflowMetrics,
    ) -> Result<AnalysisOutput, String> {
        let mut payloads = Vec::new();

        for prompt in &prompts.analysts {
            let report = self
                .enforced::<AnalystReport>(prompt, "analyst", metrics)
                .await?;
            payloads.push(AgentPayload::Analyst(report));
        }

        let mut bull = None;
        let mut bear = None;
        for prompt in &prompts.researchers {
            let stance = self
                .enforced::<ResearcherStance>(prompt, "researcher", metrics)
                .await?;
            // The last stance per side is the post-debate position.
            match stance.side {
                StanceSide::Bull => bull = Some(stance.confidence),
                StanceSide::Bear => bear = Some(stance.confidence),
            }
            payloads.push(AgentPayload::Researcher(stance));
        }
        let debate = match (bull, bear) {
            (Some(bull_confidence), Some(bear_confidence)) => Some(DebateSummary {
                bull_confidence,
                bear_confidence,
            }),
            _ => None,
        };

        let proposal = self
            .enforced::<TradeProposal>(&prompts.trader, "trader", metrics)
            .await?;
        payloads.push(AgentPayload::Trader(proposal.clone()));

        Ok(AnalysisOutput {
            payloads,
            proposal,
            debate,
        })
    }

    async fn enforced<T: DeserializeOwned>(
        &self,
        prompt: &str,
        role: &str,
        metrics: &mut WorkflowMetrics,
    ) -> Result<T, String> {
        let outcome = self.enforcer.enforce::<T>(prompt).await;
        metrics.enforcement_attempts += outcome.attempts;
        metrics.enforcement_retries += outcome.attempts.saturating_sub(1);
        outcome.value.ok_or_else(|| {
            format!(
                "{role} output failed schema enforcement after {} attempts: {}",
                outcome.attempts,
                outcome
                    .errors
                    .last()
                    .map_or("no error recorded", String::as_str)
            )
        })
    }
}

/// Validate and canonicalize host inputs before any stage runs.
fn normalize(mut inputs: CycleInputs) -> Result<CycleInputs, InputError> {
    let trimmed = inputs.ticker.trim().to_owned();
    if trimmed.is_empty() {
        return Err(InputError::EmptyTicker);
    }
    inputs.ticker = trimmed;
    Ok(inputs)
}

/// A report for a cycle that died before the gatekeeper ran.
fn dead_report(
    code: &str,
    reason: String,
    regime: RegimeAssessment,
    signal: Option<SignalVerdict>,
    mut metrics: WorkflowMetrics,
    started: Instant,
) -> CycleReport {
    metrics.total = started.elapsed();
    record_cycle_outcome(code);
    tracing::info!(code, reason = %reason, "cycle ended without approval");
    CycleReport {
        decision: TradeDecision::dead_state(reason),
        regime,
        signal,
        validation: ValidationSummary::default(),
        ledger: None,
        risk: None,
        outcome: None,
        metrics,
    }
}

/// Translate the gatekeeper outcome into the final decision contract.
fn assemble_decision(
    outcome: &ExecutionOutcome,
    risk: &RiskGateOutcome,
    ledger: &FactLedger,
) -> TradeDecision {
    match outcome {
        ExecutionOutcome::Approved {
            action,
            quantity,
            confidence,
            ..
        } => {
            let reasoning = risk
                .adjusted_proposal
                .as_ref()
                .map_or_else(|| "approved".to_owned(), |p| p.reasoning.clone());
            let reasoning = match &risk.override_message {
                Some(note) => format!("{reasoning} [{note}]"),
                None => reasoning,
            };
            let position_size = ledger
                .snapshot()
                .close
                .map_or(Decimal::ZERO, |close| close * Decimal::from(*quantity));
            TradeDecision {
                action: *action,
                quantity: *quantity,
                confidence: *confidence,
                reasoning,
                fact_check_passed: true,
                risk_gate_passed: true,
                position_size,
                stop_loss: risk.metrics.stop_loss,
                risk_pct: risk.metrics.proposed_risk_pct,
            }
        }
        ExecutionOutcome::BlockedTrend { reason, original } => TradeDecision {
            action: TradeAction::Hold,
            quantity: 0,
            confidence: original.confidence,
            reasoning: reason.clone(),
            fact_check_passed: true,
            risk_gate_passed: true,
            position_size: Decimal::ZERO,
            stop_loss: None,
            risk_pct: None,
        },
        aborted => {
            let mut decision = TradeDecision::dead_state(format!(
                "gatekeeper {}: {}",
                aborted.code(),
                aborted.reason()
            ));
            decision.fact_check_passed = true;
            decision.risk_gate_passed = true;
            decision
        }
    }
}
