// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Decision Gate - Rust Core Library
//!
//! Deterministic decision validation and risk gate for the Sentinel
//! trading system.
//!
//! # Architecture
//!
//! The gate sits between the probabilistic agent host and trade
//! execution. Agents reason and persuade; the gate verifies and decides.
//! Every stage is deterministic: the same sealed inputs always produce
//! the same decision, so any cycle can be replayed from its ledger.
//!
//! ## Pipeline modules (in cycle order)
//!
//! - `regime`: price-history classification and RSI signal mapping
//! - `enforcer`: schema enforcement for free-text reasoning output
//! - `factcheck`: claim validation against ground-truth data
//! - `ledger`: the immutable, content-hashed fact ledger
//! - `risk`: position sizing and portfolio heat enforcement
//! - `gatekeeper`: final pre-execution review
//! - `orchestrator`: sequences one full decision cycle
//!
//! ## Support modules
//!
//! - `models`: validated types crossing the host boundary
//! - `config`: YAML file plus environment-override configuration
//! - `error`: integrity errors, kept apart from business rejections

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Modules
// =============================================================================

/// Runtime configuration from YAML and environment overrides.
pub mod config;

/// Schema enforcement wrapper around the reasoning port.
pub mod enforcer;

/// Error taxonomy for the decision pipeline.
pub mod error;

/// Claim validation against the ground-truth record.
pub mod factcheck;

/// Final pre-execution review.
pub mod gatekeeper;

/// Immutable fact ledger with content-hash integrity.
pub mod ledger;

/// Boundary types shared by every stage.
pub mod models;

/// Tracing setup and metric recorders.
pub mod observability;

/// The full decision cycle, stage by stage.
pub mod orchestrator;

/// Market regime classification and signal mapping.
pub mod regime;

/// Deterministic position sizing and the risk gate.
pub mod risk;

// =============================================================================
// Re-exports
// =============================================================================

// Configuration re-exports
pub use config::{Config, ConfigError, load_config, load_config_from_string};

// Pipeline re-exports
pub use enforcer::{EnforcementOutcome, EnforcerStats, ReasoningPort, SchemaEnforcer};
pub use factcheck::{
    Claim, ClaimCheck, ClaimDomain, EntailmentPort, FactCheckResult, FactChecker, FactLabel,
    ValidationSummary,
};
pub use gatekeeper::{ExecutionOutcome, Gatekeeper};
pub use ledger::{DataSource, FactLedger, LedgerBuilder, SourceRecord};
pub use orchestrator::{
    AgentPrompts, CycleInputs, CycleReport, CycleStage, Orchestrator, WorkflowMetrics,
};
pub use regime::{MarketRegime, RegimeAssessment, RegimeClassifier, RegimeMetrics};
pub use risk::{RiskGate, RiskGateOutcome, RiskMetrics, RiskRejection};

// Boundary model re-exports
pub use models::{
    AgentPayload, AnalystReport, DebateSummary, GroundTruthFacts, MarketSnapshot, OpenPosition,
    PortfolioState, PricePoint, PriceSeries, ResearcherStance, StanceSide, TradeAction,
    TradeDecision, TradeProposal,
};

// Error re-exports
pub use error::{CycleError, InputError, LedgerError, ReasoningError, RegimeError};

// Observability re-exports
pub use observability::init_tracing;
