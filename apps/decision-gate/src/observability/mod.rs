//! Observability for the decision gate.
//!
//! Structured logging via `tracing` and a metrics facade via the
//! `metrics` crate. The embedding process installs the subscriber and
//! metrics exporter; [`init_tracing`] covers the common console case.

pub mod metrics;

pub use metrics::{
    record_cycle_outcome, record_enforcement, record_fact_check, record_regime,
    record_risk_rejection, record_stage_latency,
};

use tracing_subscriber::EnvFilter;

/// Initialize console tracing.
///
/// Reads the filter from `RUST_LOG`, defaulting to `info`. ANSI colors
/// and target suppression follow `SENTINEL_ENV=development`. Call once
/// at process startup; subsequent calls are ignored.
pub fn init_tracing() {
    let is_development = std::env::var("SENTINEL_ENV")
        .map(|v| v == "development")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(!is_development)
        .with_ansi(is_development)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
