//! Structured-output enforcement for external reasoning calls.
//!
//! Agent responses arrive as free text that must parse into a target
//! schema. [`SchemaEnforcer`] wraps one reasoning call per attempt:
//! extract the JSON payload, deserialize it, and on failure retry with
//! the parse error appended to the prompt so the model can correct
//! itself. Retries are strictly sequential, each attempt runs under its
//! own timeout, and exhaustion is an outcome, not an error.

mod backoff;
mod extract;

pub use extract::extract_payload;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::EnforcerConfig;
use crate::error::ReasoningError;
use crate::observability::metrics;
use backoff::Backoff;

/// One external reasoning call.
///
/// Implementations wrap whatever model endpoint produces agent output;
/// the enforcer only needs prompt in, raw text out.
#[async_trait]
pub trait ReasoningPort: Send + Sync {
    /// Complete a prompt, returning the raw response text.
    async fn complete(&self, prompt: &str) -> Result<String, ReasoningError>;
}

/// Result of enforcing a schema over a reasoning call.
#[derive(Debug, Clone)]
pub struct EnforcementOutcome<T> {
    /// Parsed value, absent when every attempt failed.
    pub value: Option<T>,
    /// Attempts consumed, including the successful one.
    pub attempts: u32,
    /// One entry per failed attempt, in order.
    pub errors: Vec<String>,
    /// Wall-clock time across all attempts.
    pub latency: Duration,
}

impl<T> EnforcementOutcome<T> {
    /// Whether a value was obtained.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.value.is_some()
    }
}

/// Counters over the lifetime of one enforcer.
#[derive(Debug, Default)]
struct Counters {
    first_try: AtomicU64,
    after_retry: AtomicU64,
    failures: AtomicU64,
}

/// Snapshot of enforcement counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnforcerStats {
    /// Calls parsed on the first attempt.
    pub first_try: u64,
    /// Calls that needed at least one retry.
    pub after_retry: u64,
    /// Calls that exhausted every attempt.
    pub failures: u64,
}

/// Wraps a [`ReasoningPort`] with schema validation and bounded retry.
pub struct SchemaEnforcer {
    port: Arc<dyn ReasoningPort>,
    config: EnforcerConfig,
    counters: Counters,
}

impl std::fmt::Debug for SchemaEnforcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaEnforcer")
            .field("config", &self.config)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

impl SchemaEnforcer {
    /// Build an enforcer over a reasoning port.
    #[must_use]
    pub fn new(port: Arc<dyn ReasoningPort>, config: EnforcerConfig) -> Self {
        Self {
            port,
            config,
            counters: Counters::default(),
        }
    }

    /// Run one enforced call, parsing the response as `T`.
    ///
    /// Makes up to `max_retries + 1` sequential attempts. Never returns
    /// an error: exhaustion yields an outcome with no value and the
    /// full error history.
    pub async fn enforce<T: DeserializeOwned>(&self, prompt: &str) -> EnforcementOutcome<T> {
        let started = Instant::now();
        let timeout = Duration::from_millis(self.config.attempt_timeout_ms);
        let mut backoff = Backoff::new(&self.config);
        let mut errors: Vec<String> = Vec::new();

        for attempt in 0..=self.config.max_retries {
            let attempt_prompt = match errors.last() {
                None => prompt.to_owned(),
                Some(last_error) => retry_prompt(prompt, last_error),
            };

            match self.attempt(&attempt_prompt, timeout).await {
                Ok(value) => {
                    let attempts = attempt + 1;
                    if attempt == 0 {
                        self.counters.first_try.fetch_add(1, Ordering::Relaxed);
                        metrics::record_enforcement("first_try");
                    } else {
                        self.counters.after_retry.fetch_add(1, Ordering::Relaxed);
                        metrics::record_enforcement("after_retry");
                    }
                    return EnforcementOutcome {
                        value: Some(value),
                        attempts,
                        errors,
                        latency: started.elapsed(),
                    };
                }
                Err(error) => {
                    tracing::warn!(attempt = attempt + 1, %error, "schema enforcement attempt failed");
                    errors.push(error);
                    if attempt < self.config.max_retries {
                        tokio::time::sleep(backoff.next_delay()).await;
                    }
                }
            }
        }

        self.counters.failures.fetch_add(1, Ordering::Relaxed);
        metrics::record_enforcement("failure");
        EnforcementOutcome {
            value: None,
            attempts: self.config.max_retries + 1,
            errors,
            latency: started.elapsed(),
        }
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        prompt: &str,
        timeout: Duration,
    ) -> Result<T, String> {
        let raw = match tokio::time::timeout(timeout, self.port.complete(prompt)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(error)) => return Err(error.to_string()),
            Err(_) => {
                return Err(
                    ReasoningError::Timeout {
                        timeout_ms: self.config.attempt_timeout_ms,
                    }
                    .to_string(),
                );
            }
        };

        let payload =
            extract_payload(&raw).ok_or_else(|| "no JSON payload found in response".to_owned())?;
        serde_json::from_str(payload).map_err(|e| format!("schema violation: {e}"))
    }

    /// Current counter values.
    #[must_use]
    pub fn stats(&self) -> EnforcerStats {
        EnforcerStats {
            first_try: self.counters.first_try.load(Ordering::Relaxed),
            after_retry: self.counters.after_retry.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }
}

/// Prompt for a retry attempt, carrying the prior failure forward.
fn retry_prompt(base: &str, last_error: &str) -> String {
    format!(
        "{base}\n\nYour previous response could not be parsed: {last_error}\n\
         Respond again with only a valid JSON object matching the required schema."
    )
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Verdict {
        action: String,
        confidence: f64,
    }

    /// Replays scripted responses and records the prompts it saw.
    struct ScriptedPort {
        responses: Mutex<VecDeque<Result<String, ReasoningError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedPort {
        fn new(responses: Vec<Result<String, ReasoningError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn seen_prompts(&self) -> Vec<String> {
            self.prompts.lock().expect("prompts lock").clone()
        }
    }

    #[async_trait]
    impl ReasoningPort for ScriptedPort {
        async fn complete(&self, prompt: &str) -> Result<String, ReasoningError> {
            self.prompts
                .lock()
                .expect("prompts lock")
                .push(prompt.to_owned());
            self.responses
                .lock()
                .expect("responses lock")
                .pop_front()
                .unwrap_or_else(|| Err(ReasoningError::CallFailed("script exhausted".to_owned())))
        }
    }

    /// Never resolves; used to exercise the per-attempt timeout.
    struct HangingPort;

    #[async_trait]
    impl ReasoningPort for HangingPort {
        async fn complete(&self, _prompt: &str) -> Result<String, ReasoningError> {
            std::future::pending().await
        }
    }

    fn fast_config() -> EnforcerConfig {
        EnforcerConfig {
            max_retries: 2,
            attempt_timeout_ms: 1_000,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
            backoff_multiplier: 1.0,
            jitter_factor: 0.0,
        }
    }

    fn enforcer(port: Arc<dyn ReasoningPort>) -> SchemaEnforcer {
        SchemaEnforcer::new(port, fast_config())
    }

    #[tokio::test]
    async fn test_clean_response_parses_first_try() {
        let port = Arc::new(ScriptedPort::new(vec![Ok(
            "{\"action\": \"BUY\", \"confidence\": 0.8}".to_owned(),
        )]));
        let enforcer = enforcer(port);

        let outcome: EnforcementOutcome<Verdict> = enforcer.enforce("decide").await;
        assert_eq!(
            outcome.value,
            Some(Verdict {
                action: "BUY".to_owned(),
                confidence: 0.8
            })
        );
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.errors.is_empty());
        assert_eq!(enforcer.stats().first_try, 1);
    }

    #[tokio::test]
    async fn test_fenced_response_is_extracted() {
        let port = Arc::new(ScriptedPort::new(vec![Ok(
            "Analysis done.\n```json\n{\"action\": \"SELL\", \"confidence\": 0.7}\n```".to_owned(),
        )]));
        let outcome: EnforcementOutcome<Verdict> = enforcer(port).enforce("decide").await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_two_bad_responses_then_valid_takes_three_attempts() {
        let port = Arc::new(ScriptedPort::new(vec![
            Ok("I think we should buy.".to_owned()),
            Ok("{\"action\": \"BUY\"".to_owned()),
            Ok("{\"action\": \"BUY\", \"confidence\": 0.9}".to_owned()),
        ]));
        let enforcer = enforcer(port);

        let outcome: EnforcementOutcome<Verdict> = enforcer.enforce("decide").await;
        assert!(outcome.is_success());
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.errors.len(), 2);
        assert_eq!(enforcer.stats().after_retry, 1);
        assert_eq!(enforcer.stats().failures, 0);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_outcome_not_error() {
        let port = Arc::new(ScriptedPort::new(vec![
            Ok("nope".to_owned()),
            Ok("still nope".to_owned()),
            Ok("no json here".to_owned()),
        ]));
        let enforcer = enforcer(port);

        let outcome: EnforcementOutcome<Verdict> = enforcer.enforce("decide").await;
        assert!(outcome.value.is_none());
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.errors.len(), 3);
        assert_eq!(enforcer.stats().failures, 1);
    }

    #[tokio::test]
    async fn test_retry_prompt_carries_prior_error() {
        let port = Arc::new(ScriptedPort::new(vec![
            Ok("not json".to_owned()),
            Ok("{\"action\": \"HOLD\", \"confidence\": 0.5}".to_owned()),
        ]));
        let script = Arc::clone(&port);
        let outcome: EnforcementOutcome<Verdict> = enforcer(port).enforce("decide").await;
        assert!(outcome.is_success());

        let prompts = script.seen_prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0], "decide");
        assert!(prompts[1].contains("could not be parsed"));
        assert!(prompts[1].contains("no JSON payload"));
    }

    #[tokio::test]
    async fn test_port_failure_is_recorded_and_retried() {
        let port = Arc::new(ScriptedPort::new(vec![
            Err(ReasoningError::CallFailed("upstream 503".to_owned())),
            Ok("{\"action\": \"HOLD\", \"confidence\": 0.5}".to_owned()),
        ]));
        let outcome: EnforcementOutcome<Verdict> = enforcer(port).enforce("decide").await;
        assert!(outcome.is_success());
        assert_eq!(outcome.attempts, 2);
        assert!(outcome.errors[0].contains("upstream 503"));
    }

    #[tokio::test]
    async fn test_hanging_call_times_out_per_attempt() {
        let config = EnforcerConfig {
            max_retries: 1,
            attempt_timeout_ms: 5,
            ..fast_config()
        };
        let enforcer = SchemaEnforcer::new(Arc::new(HangingPort), config);

        let outcome: EnforcementOutcome<Verdict> = enforcer.enforce("decide").await;
        assert!(outcome.value.is_none());
        assert_eq!(outcome.attempts, 2);
        assert!(outcome.errors.iter().all(|e| e.contains("timed out")));
    }
}
