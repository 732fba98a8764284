//! Error taxonomy for the decision gate.
//!
//! Failure classes are kept deliberately separate so callers can tell a
//! malformed input apart from a fatal integrity bug:
//!
//! | Class | Type | Handling |
//! |-------|------|----------|
//! | Input validation | [`InputError`] | Fail fast, before any gate runs |
//! | Insufficient history | [`RegimeError`] | Typed, recoverable by waiting for data |
//! | Reasoning transport | [`ReasoningError`] | Retried by the enforcer, never escapes it |
//! | Ledger integrity | [`LedgerError`] | Fatal for the cycle, never swallowed |
//!
//! Business rejections (risk limits, fact contradictions, gatekeeper aborts)
//! are **not** errors. They are ordinary return values carrying a
//! `SCREAMING_SNAKE` reason code, because a rejected trade is the system
//! working as intended.

use thiserror::Error;

/// Validation failure on data handed to the gate by the host.
///
/// Raised before any pipeline stage runs. A cycle that trips one of these
/// never produced a decision and must be fixed at the call site.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    /// Price series contained no points.
    #[error("price series is empty")]
    EmptySeries,

    /// A price was NaN, infinite, or non-positive.
    #[error("invalid price {price} at index {index}")]
    InvalidPrice {
        /// Offending index in the series.
        index: usize,
        /// The rejected value.
        price: f64,
    },

    /// Timestamps were not strictly ascending.
    #[error("timestamps out of order at index {index}")]
    OutOfOrder {
        /// Index of the first point that is not after its predecessor.
        index: usize,
    },

    /// Proposal confidence outside `[0, 1]`.
    #[error("confidence {value} outside [0, 1]")]
    ConfidenceOutOfRange {
        /// The rejected value.
        value: f64,
    },

    /// Ticker symbol was empty or whitespace.
    #[error("ticker symbol is empty")]
    EmptyTicker,
}

/// The regime classifier could not produce metrics.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegimeError {
    /// Fewer points than the configured window.
    #[error("insufficient data: need {required} points, have {actual}")]
    InsufficientData {
        /// Configured minimum window.
        required: usize,
        /// Points actually available.
        actual: usize,
    },
}

/// Transport or model failure reported by a [`ReasoningPort`] call.
///
/// The enforcer absorbs these into its retry loop; they never propagate
/// out of a cycle.
///
/// [`ReasoningPort`]: crate::enforcer::ReasoningPort
#[derive(Debug, Error)]
pub enum ReasoningError {
    /// The backing model or service refused or failed the call.
    #[error("reasoning call failed: {0}")]
    CallFailed(String),

    /// The call exceeded its per-attempt deadline.
    #[error("reasoning call timed out after {timeout_ms}ms")]
    Timeout {
        /// The deadline that was exceeded.
        timeout_ms: u64,
    },
}

/// Integrity violation while sealing or reading a fact ledger.
///
/// These indicate a programming or data-plumbing bug, not a market
/// condition. They abort the cycle and must surface to the operator.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A payload the ledger requires was never supplied to the builder.
    #[error("ledger missing required payload: {field}")]
    MissingPayload {
        /// Name of the absent payload.
        field: &'static str,
    },

    /// Canonical serialization for the content hash failed.
    #[error("ledger serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Fatal cycle failure returned by the orchestrator.
///
/// Only the integrity class reaches here. Every business rejection is
/// materialized as a dead-state decision instead.
#[derive(Debug, Error)]
pub enum CycleError {
    /// Input validation failed during normalization.
    #[error(transparent)]
    Input(#[from] InputError),

    /// Price history too short for regime classification.
    #[error(transparent)]
    Regime(#[from] RegimeError),

    /// Ledger integrity violation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_display() {
        let err = InputError::InvalidPrice {
            index: 3,
            price: f64::NAN,
        };
        assert!(err.to_string().contains("index 3"));

        let err = InputError::ConfidenceOutOfRange { value: 1.5 };
        assert_eq!(err.to_string(), "confidence 1.5 outside [0, 1]");
    }

    #[test]
    fn test_regime_error_display() {
        let err = RegimeError::InsufficientData {
            required: 60,
            actual: 12,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data: need 60 points, have 12"
        );
    }

    #[test]
    fn test_cycle_error_wraps_ledger() {
        let err: CycleError = LedgerError::MissingPayload { field: "prices" }.into();
        assert!(err.to_string().contains("prices"));
    }
}
