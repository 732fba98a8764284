//! Fact validation configuration.

use serde::{Deserialize, Serialize};

/// Fact validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactCheckConfig {
    /// Relative divergence beyond which a numeric claim is a contradiction.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Maximum cached validation results before oldest-first eviction.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for FactCheckConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

const fn default_tolerance() -> f64 {
    0.10
}

const fn default_cache_capacity() -> usize {
    10_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factcheck_defaults() {
        let config = FactCheckConfig::default();
        assert!((config.tolerance - 0.10).abs() < f64::EPSILON);
        assert_eq!(config.cache_capacity, 10_000);
    }
}
