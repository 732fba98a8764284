//! Metrics facade for the decision gate.
//!
//! Records counters and histograms through the [`metrics`] crate facade.
//! The host process installs the actual exporter; when no recorder is
//! installed these calls are no-ops, so library code can record
//! unconditionally.
//!
//! # Example
//!
//! ```ignore
//! use decision_gate::observability::metrics::record_cycle_outcome;
//!
//! record_cycle_outcome("APPROVED");
//! ```

use metrics::{counter, histogram};

// ============================================================================
// Decision Cycle Metrics
// ============================================================================

/// Record the terminal outcome of a decision cycle.
///
/// # Arguments
///
/// * `outcome` - Outcome code (e.g., "APPROVED", "FACT_CONTRADICTION", "BLOCKED_TREND")
pub fn record_cycle_outcome(outcome: &str) {
    counter!(
        "decision_cycles_total",
        "outcome" => outcome.to_string(),
    )
    .increment(1);
}

/// Record the wall-clock duration of a single pipeline stage.
///
/// # Arguments
///
/// * `stage` - Stage name (e.g., "REGIME", "ANALYSIS", "FACT_CHECK", "RISK_GATE")
/// * `latency_seconds` - Stage duration in seconds
pub fn record_stage_latency(stage: &str, latency_seconds: f64) {
    histogram!(
        "cycle_stage_duration_seconds",
        "stage" => stage.to_string(),
    )
    .record(latency_seconds);
}

/// Record a regime classification result.
///
/// # Arguments
///
/// * `regime` - Classified regime label (e.g., "TRENDING_UP", "CHOPPY")
pub fn record_regime(regime: &str) {
    counter!(
        "regime_classifications_total",
        "regime" => regime.to_string(),
    )
    .increment(1);
}

// ============================================================================
// Fact Check Metrics
// ============================================================================

/// Record a single claim verification result.
///
/// # Arguments
///
/// * `label` - Verdict label (e.g., "ENTAILMENT", "CONTRADICTION", "NEUTRAL")
/// * `cached` - Whether the verdict came from the verification cache
pub fn record_fact_check(label: &str, cached: bool) {
    counter!(
        "fact_check_claims_total",
        "label" => label.to_string(),
        "cached" => cached.to_string(),
    )
    .increment(1);
}

// ============================================================================
// Schema Enforcement Metrics
// ============================================================================

/// Record the result of a schema enforcement call.
///
/// # Arguments
///
/// * `result` - Enforcement result ("first_try", "after_retry", or "failure")
pub fn record_enforcement(result: &str) {
    counter!(
        "schema_enforcement_total",
        "result" => result.to_string(),
    )
    .increment(1);
}

// ============================================================================
// Risk Gate Metrics
// ============================================================================

/// Record a risk gate rejection.
///
/// # Arguments
///
/// * `code` - Rejection code (e.g., "PORTFOLIO_HEAT_EXCEEDED", "BAD_MARKET_DATA")
pub fn record_risk_rejection(code: &str) {
    counter!(
        "risk_rejections_total",
        "code" => code.to_string(),
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Without an installed recorder these are no-ops; the tests verify the
    // macro invocations are well-formed and never panic.

    #[test]
    fn test_record_cycle_outcome() {
        record_cycle_outcome("APPROVED");
        record_cycle_outcome("ABORT_LOW_CONFIDENCE");
    }

    #[test]
    fn test_record_stage_latency() {
        record_stage_latency("REGIME", 0.012);
        record_stage_latency("ANALYSIS", 4.2);
    }

    #[test]
    fn test_record_regime() {
        record_regime("TRENDING_UP");
        record_regime("CHOPPY");
    }

    #[test]
    fn test_record_fact_check() {
        record_fact_check("ENTAILMENT", false);
        record_fact_check("CONTRADICTION", true);
    }

    #[test]
    fn test_record_enforcement() {
        record_enforcement("first_try");
        record_enforcement("after_retry");
        record_enforcement("failure");
    }

    #[test]
    fn test_record_risk_rejection() {
        record_risk_rejection("PORTFOLIO_HEAT_EXCEEDED");
    }
}
