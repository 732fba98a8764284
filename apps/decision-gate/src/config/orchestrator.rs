//! Orchestrator cycle configuration.

use serde::{Deserialize, Serialize};

/// Orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Hard deadline for the analysis phase (agent calls plus claim
    /// validation). Exceeding it dead-states the cycle.
    #[serde(default = "default_analysis_timeout_ms")]
    pub analysis_timeout_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            analysis_timeout_ms: default_analysis_timeout_ms(),
        }
    }
}

const fn default_analysis_timeout_ms() -> u64 {
    120_000
}
