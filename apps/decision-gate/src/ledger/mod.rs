//! Immutable per-cycle fact ledger.
//!
//! Every gate in a decision cycle reads the same frozen snapshot of
//! market data, agent output, and derived state. [`LedgerBuilder`]
//! accumulates that state while the cycle's analysis phase runs and is
//! consumed by [`LedgerBuilder::seal`], which stamps an identifier,
//! freezes per-source freshness ages, and computes a content hash over
//! the canonical serialization. The sealed [`FactLedger`] exposes
//! getters only; there is no way to write to it afterwards.
//!
//! The content hash covers the payload content but not the ledger id
//! or seal timestamp, so two cycles fed identical data hash
//! identically.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::{AgentPayload, GroundTruthFacts, MarketSnapshot, PriceSeries};
use crate::regime::RegimeAssessment;

/// Upstream data source tracked for freshness.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSource {
    /// Price history and technicals.
    Price,
    /// Fundamental ground truth (revenue, growth rates).
    Fundamentals,
    /// News headlines.
    News,
    /// Insider transaction filings.
    Insider,
}

impl DataSource {
    /// Stable name for logs and rejection reasons.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Price => "PRICE",
            Self::Fundamentals => "FUNDAMENTALS",
            Self::News => "NEWS",
            Self::Insider => "INSIDER",
        }
    }
}

/// Provenance for one data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Upstream dataset or feed version.
    pub version: String,
    /// When the source data was produced.
    pub as_of: DateTime<Utc>,
}

/// Accumulates cycle state and seals it into a [`FactLedger`].
#[derive(Debug, Clone)]
pub struct LedgerBuilder {
    ticker: String,
    trading_date: NaiveDate,
    prices: Option<PriceSeries>,
    snapshot: Option<MarketSnapshot>,
    facts: GroundTruthFacts,
    news: Vec<String>,
    insider: Vec<String>,
    agents: Vec<AgentPayload>,
    regime: Option<RegimeAssessment>,
    sources: BTreeMap<DataSource, SourceRecord>,
}

impl LedgerBuilder {
    /// Start a ledger for one ticker and trading date.
    #[must_use]
    pub fn new(ticker: impl Into<String>, trading_date: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            trading_date,
            prices: None,
            snapshot: None,
            facts: GroundTruthFacts::empty(trading_date),
            news: Vec::new(),
            insider: Vec::new(),
            agents: Vec::new(),
            regime: None,
            sources: BTreeMap::new(),
        }
    }

    /// Attach the raw price history the cycle was classified from.
    #[must_use]
    pub fn prices(mut self, prices: PriceSeries) -> Self {
        self.prices = Some(prices);
        self
    }

    /// Attach the frozen technical snapshot. Required to seal.
    #[must_use]
    pub fn snapshot(mut self, snapshot: MarketSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Attach fundamental ground truth.
    #[must_use]
    pub fn facts(mut self, facts: GroundTruthFacts) -> Self {
        self.facts = facts;
        self
    }

    /// Attach news headlines.
    #[must_use]
    pub fn news(mut self, news: Vec<String>) -> Self {
        self.news = news;
        self
    }

    /// Attach insider transaction notes.
    #[must_use]
    pub fn insider(mut self, insider: Vec<String>) -> Self {
        self.insider = insider;
        self
    }

    /// Attach the agent payloads produced this cycle.
    #[must_use]
    pub fn agents(mut self, agents: Vec<AgentPayload>) -> Self {
        self.agents = agents;
        self
    }

    /// Attach the frozen regime assessment. Required to seal.
    #[must_use]
    pub fn regime(mut self, regime: RegimeAssessment) -> Self {
        self.regime = Some(regime);
        self
    }

    /// Record provenance for one source.
    #[must_use]
    pub fn source(
        mut self,
        source: DataSource,
        version: impl Into<String>,
        as_of: DateTime<Utc>,
    ) -> Self {
        self.sources.insert(
            source,
            SourceRecord {
                version: version.into(),
                as_of,
            },
        );
        self
    }

    /// Seal the ledger at the current wall clock.
    pub fn seal(self) -> Result<FactLedger, LedgerError> {
        self.seal_at(Utc::now())
    }

    /// Seal the ledger at an explicit instant.
    ///
    /// Freshness ages are frozen as whole seconds between each source's
    /// `as_of` and `sealed_at`, clamped at zero for sources stamped in
    /// the future.
    pub fn seal_at(self, sealed_at: DateTime<Utc>) -> Result<FactLedger, LedgerError> {
        let snapshot = self
            .snapshot
            .ok_or(LedgerError::MissingPayload {
                field: "market snapshot",
            })?;
        let regime = self.regime.ok_or(LedgerError::MissingPayload {
            field: "regime assessment",
        })?;

        let ages = self
            .sources
            .iter()
            .map(|(source, record)| {
                let age = (sealed_at - record.as_of).num_seconds().max(0);
                (*source, age)
            })
            .collect();

        let content = LedgerContent {
            ticker: self.ticker,
            trading_date: self.trading_date,
            prices: self.prices,
            snapshot,
            facts: self.facts,
            news: self.news,
            insider: self.insider,
            agents: self.agents,
            regime,
            sources: self.sources,
        };
        let content_hash = content.hash()?;

        Ok(FactLedger {
            ledger_id: Uuid::new_v4(),
            sealed_at,
            ages,
            content,
            content_hash,
        })
    }
}

/// The hashed portion of a ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LedgerContent {
    ticker: String,
    trading_date: NaiveDate,
    prices: Option<PriceSeries>,
    snapshot: MarketSnapshot,
    facts: GroundTruthFacts,
    news: Vec<String>,
    insider: Vec<String>,
    agents: Vec<AgentPayload>,
    regime: RegimeAssessment,
    sources: BTreeMap<DataSource, SourceRecord>,
}

impl LedgerContent {
    fn hash(&self) -> Result<String, LedgerError> {
        let canonical = serde_json::to_vec(self)?;
        Ok(blake3::hash(&canonical).to_hex().to_string())
    }
}

/// The frozen single source of truth for one decision cycle.
///
/// Constructed only through [`LedgerBuilder::seal`]; all access is
/// read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactLedger {
    ledger_id: Uuid,
    sealed_at: DateTime<Utc>,
    ages: BTreeMap<DataSource, i64>,
    content: LedgerContent,
    content_hash: String,
}

impl FactLedger {
    /// Unique identifier stamped at seal time.
    #[must_use]
    pub const fn ledger_id(&self) -> Uuid {
        self.ledger_id
    }

    /// Whether the identifier is present and non-nil.
    #[must_use]
    pub fn has_valid_id(&self) -> bool {
        !self.ledger_id.is_nil()
    }

    /// Instant the ledger was sealed.
    #[must_use]
    pub const fn sealed_at(&self) -> DateTime<Utc> {
        self.sealed_at
    }

    /// Ticker under decision.
    #[must_use]
    pub fn ticker(&self) -> &str {
        &self.content.ticker
    }

    /// Trading date under decision.
    #[must_use]
    pub const fn trading_date(&self) -> NaiveDate {
        self.content.trading_date
    }

    /// Raw price history, when attached.
    #[must_use]
    pub const fn prices(&self) -> Option<&PriceSeries> {
        self.content.prices.as_ref()
    }

    /// Frozen technical snapshot.
    #[must_use]
    pub const fn snapshot(&self) -> &MarketSnapshot {
        &self.content.snapshot
    }

    /// Fundamental ground truth.
    #[must_use]
    pub const fn facts(&self) -> &GroundTruthFacts {
        &self.content.facts
    }

    /// News headlines.
    #[must_use]
    pub fn news(&self) -> &[String] {
        &self.content.news
    }

    /// Insider transaction notes.
    #[must_use]
    pub fn insider(&self) -> &[String] {
        &self.content.insider
    }

    /// Agent payloads recorded this cycle.
    #[must_use]
    pub fn agents(&self) -> &[AgentPayload] {
        &self.content.agents
    }

    /// Frozen regime assessment.
    #[must_use]
    pub const fn regime(&self) -> &RegimeAssessment {
        &self.content.regime
    }

    /// Source provenance records.
    #[must_use]
    pub const fn sources(&self) -> &BTreeMap<DataSource, SourceRecord> {
        &self.content.sources
    }

    /// Frozen freshness age in seconds for one source.
    #[must_use]
    pub fn age_of(&self, source: DataSource) -> Option<i64> {
        self.ages.get(&source).copied()
    }

    /// The source with the largest freshness age.
    #[must_use]
    pub fn stalest(&self) -> Option<(DataSource, i64)> {
        self.ages
            .iter()
            .max_by_key(|(_, age)| **age)
            .map(|(source, age)| (*source, *age))
    }

    /// Whether any source is older than `max_age_secs`.
    #[must_use]
    pub fn is_stale(&self, max_age_secs: i64) -> bool {
        self.ages.values().any(|age| *age > max_age_secs)
    }

    /// Content hash computed at seal time, hex-encoded.
    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Recompute the content hash and compare with the sealed value.
    ///
    /// A mismatch on a deserialized ledger means the record was altered
    /// after sealing.
    pub fn verify_hash(&self) -> Result<bool, LedgerError> {
        Ok(self.content.hash()? == self.content_hash)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    use crate::regime::{MarketRegime, RegimeMetrics};

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date")
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).single().expect("valid instant")
    }

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot {
            close: Some(dec!(187.32)),
            volume: Some(52_000_000),
            atr: Some(dec!(4.1)),
            rsi: Some(61.0),
            ma_long: Some(dec!(172.50)),
        }
    }

    fn regime() -> RegimeAssessment {
        RegimeAssessment {
            regime: MarketRegime::TrendingUp,
            metrics: RegimeMetrics {
                volatility: 0.31,
                trend_strength: 34.2,
                hurst_exponent: 0.58,
                window_return: 0.12,
                overall_return: 0.45,
            },
        }
    }

    fn builder() -> LedgerBuilder {
        LedgerBuilder::new("AAPL", date())
            .snapshot(snapshot())
            .regime(regime())
            .news(vec!["Supplier raises full-year guidance".to_owned()])
            .source(DataSource::Price, "eod-2024-03-15", now() - Duration::seconds(120))
            .source(DataSource::News, "wire-v2", now() - Duration::seconds(900))
    }

    #[test]
    fn test_seal_stamps_identity_and_hash() {
        let ledger = builder().seal_at(now()).expect("should seal");
        assert!(ledger.has_valid_id());
        assert_eq!(ledger.sealed_at(), now());
        assert_eq!(ledger.content_hash().len(), 64);
        assert_eq!(ledger.ticker(), "AAPL");
    }

    #[test]
    fn test_seal_requires_snapshot() {
        let result = LedgerBuilder::new("AAPL", date()).regime(regime()).seal_at(now());
        assert!(matches!(
            result,
            Err(LedgerError::MissingPayload {
                field: "market snapshot"
            })
        ));
    }

    #[test]
    fn test_seal_requires_regime() {
        let result = LedgerBuilder::new("AAPL", date())
            .snapshot(snapshot())
            .seal_at(now());
        assert!(matches!(
            result,
            Err(LedgerError::MissingPayload {
                field: "regime assessment"
            })
        ));
    }

    #[test]
    fn test_identical_content_hashes_identically() {
        let first = builder().seal_at(now()).expect("should seal");
        let second = builder().seal_at(now()).expect("should seal");
        assert_ne!(first.ledger_id(), second.ledger_id());
        assert_eq!(first.content_hash(), second.content_hash());
    }

    #[test]
    fn test_content_change_changes_hash() {
        let first = builder().seal_at(now()).expect("should seal");
        let second = builder()
            .insider(vec!["Form 4: CFO sale 10,000 shares".to_owned()])
            .seal_at(now())
            .expect("should seal");
        assert_ne!(first.content_hash(), second.content_hash());
    }

    #[test]
    fn test_freshness_ages_frozen_at_seal() {
        let ledger = builder().seal_at(now()).expect("should seal");
        assert_eq!(ledger.age_of(DataSource::Price), Some(120));
        assert_eq!(ledger.age_of(DataSource::News), Some(900));
        assert_eq!(ledger.age_of(DataSource::Insider), None);
    }

    #[test]
    fn test_future_stamped_source_clamps_to_zero() {
        let ledger = LedgerBuilder::new("AAPL", date())
            .snapshot(snapshot())
            .regime(regime())
            .source(DataSource::Price, "eod", now() + Duration::seconds(30))
            .seal_at(now())
            .expect("should seal");
        assert_eq!(ledger.age_of(DataSource::Price), Some(0));
    }

    #[test]
    fn test_staleness_is_strictly_beyond_max() {
        let ledger = builder().seal_at(now()).expect("should seal");
        assert!(!ledger.is_stale(900));
        assert!(ledger.is_stale(899));
        assert_eq!(ledger.stalest(), Some((DataSource::News, 900)));
    }

    #[test]
    fn test_roundtrip_preserves_hash_integrity() {
        let ledger = builder().seal_at(now()).expect("should seal");
        let json = serde_json::to_string(&ledger).expect("serialize");
        let restored: FactLedger = serde_json::from_str(&json).expect("deserialize");
        assert!(restored.verify_hash().expect("verify"));
        assert_eq!(restored, ledger);

        let tampered = json.replace("Supplier raises", "Supplier cuts");
        let altered: FactLedger = serde_json::from_str(&tampered).expect("deserialize");
        assert!(!altered.verify_hash().expect("verify"));
    }
}
