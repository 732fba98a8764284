//! Core domain models for the decision gate.
//!
//! These types define the boundary between the probabilistic agent host
//! and the deterministic core: everything crossing that boundary is
//! validated here once, then trusted downstream.

mod agent;
mod decision;
mod market;
mod portfolio;

pub use agent::{AgentPayload, AnalystReport, DebateSummary, ResearcherStance, StanceSide};
pub use decision::{TradeAction, TradeDecision, TradeProposal};
pub use market::{GroundTruthFacts, MarketSnapshot, PricePoint, PriceSeries};
pub use portfolio::{OpenPosition, PortfolioState};
