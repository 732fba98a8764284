//! Exponential backoff with jitter for reasoning-call retries.

use std::time::Duration;

use rand::Rng;

use crate::config::EnforcerConfig;

/// Backoff schedule between sequential retry attempts.
///
/// Delays grow geometrically from the initial value, are capped at the
/// maximum, and carry proportional jitter so concurrent cycles do not
/// retry in lockstep.
#[derive(Debug)]
pub struct Backoff {
    attempt: u32,
    initial_ms: u64,
    max_ms: u64,
    multiplier: f64,
    jitter_factor: f64,
}

impl Backoff {
    /// Build a schedule from enforcer configuration.
    #[must_use]
    pub const fn new(config: &EnforcerConfig) -> Self {
        Self {
            attempt: 0,
            initial_ms: config.initial_backoff_ms,
            max_ms: config.max_backoff_ms,
            multiplier: config.backoff_multiplier,
            jitter_factor: config.jitter_factor,
        }
    }

    /// Next delay in the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let base_ms = self.base_ms();
        let jittered_ms = self.apply_jitter(base_ms);
        self.attempt += 1;
        Duration::from_millis(jittered_ms.min(self.max_ms))
    }

    fn base_ms(&self) -> u64 {
        #[allow(clippy::cast_possible_wrap)]
        let multiplier = self.multiplier.powi(self.attempt as i32);
        let base = (self.initial_ms as f64 * multiplier) as u64;
        base.min(self.max_ms)
    }

    /// Random value in `[base * (1 - jitter), base * (1 + jitter)]`.
    fn apply_jitter(&self, base_ms: u64) -> u64 {
        if self.jitter_factor <= 0.0 {
            return base_ms;
        }
        let mut rng = rand::rng();
        let jitter_range = base_ms as f64 * self.jitter_factor;
        let min = (base_ms as f64 - jitter_range).max(0.0);
        let max = base_ms as f64 + jitter_range;
        rng.random_range(min..=max) as u64
    }
}
