//! Bounded retry with exponential backoff.
//!
//! Each attempt reports an [`AttemptOutcome`]; [`run_with_retry`] decides
//! whether to stop or wait and try again. A run makes at most
//! `1 + max_retries` attempts. The delay before retry `n` (1-based) is
//! `min(initial * multiplier^(n-1), max)` plus up to `jitter * delay` of
//! random extra wait.
//!
//! A success slower than `slow_after` is retried while attempts remain.
//! The slow result is kept and returned if every later attempt fails.

use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info};

use crate::config::RetryConfig;
use crate::metrics;

/// What a single attempt produced.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome<T, E> {
    Success(T),
    RetryableFailure(E),
    TerminalFailure(E),
}

/// Label recorded for each attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptLabel {
    Success,
    /// Succeeded, but slower than the slow threshold; will retry.
    Slow,
    Retryable,
    Terminal,
}

impl AttemptLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptLabel::Success => "success",
            AttemptLabel::Slow => "slow",
            AttemptLabel::Retryable => "retryable",
            AttemptLabel::Terminal => "terminal",
        }
    }
}

/// What an observer sees after each attempt.
#[derive(Debug, Clone)]
pub struct AttemptRecord<'a> {
    pub query: &'a str,
    /// 1-based attempt number.
    pub attempt: u32,
    pub elapsed: Duration,
    pub outcome: AttemptLabel,
    pub retries_left: u32,
    pub error: Option<String>,
}

/// Hook for logging and metrics; the retry loop itself stays silent.
pub trait AttemptObserver: Send + Sync {
    fn on_attempt(&self, record: &AttemptRecord<'_>);

    /// Called before sleeping ahead of retry `retry` (1-based).
    fn on_backoff(&self, _query: &str, _retry: u32, _delay: Duration) {}
}

/// Observer that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl AttemptObserver for NoopObserver {
    fn on_attempt(&self, _record: &AttemptRecord<'_>) {}
}

/// Logs each attempt and updates the lookup metrics.
///
/// Attempts are logged at INFO when verbose, DEBUG otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver {
    verbose: bool,
}

impl TracingObserver {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl AttemptObserver for TracingObserver {
    fn on_attempt(&self, record: &AttemptRecord<'_>) {
        let label = record.outcome.as_str();
        metrics::LOOKUP_ATTEMPTS.with_label_values(&[label]).inc();
        metrics::LOOKUP_DURATION
            .with_label_values(&[label])
            .observe(record.elapsed.as_secs_f64());

        let elapsed_ms = record.elapsed.as_millis() as u64;
        let error = record.error.as_deref().unwrap_or("");
        if self.verbose {
            info!(
                query = record.query,
                attempt = record.attempt,
                elapsed_ms,
                outcome = label,
                retries_left = record.retries_left,
                error,
                "Catalog attempt"
            );
        } else {
            debug!(
                query = record.query,
                attempt = record.attempt,
                elapsed_ms,
                outcome = label,
                retries_left = record.retries_left,
                error,
                "Catalog attempt"
            );
        }
    }

    fn on_backoff(&self, query: &str, retry: u32, delay: Duration) {
        metrics::LOOKUP_RETRIES.inc();
        let delay_ms = delay.as_millis() as u64;
        if self.verbose {
            info!(query, retry, delay_ms, "Retrying after backoff");
        } else {
            debug!(query, retry, delay_ms, "Retrying after backoff");
        }
    }
}

/// Backoff parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub jitter: f64,
    /// Successes slower than this are retried while attempts remain.
    pub slow_after: Option<Duration>,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            multiplier: config.backoff_multiplier,
            jitter: config.jitter,
            slow_after: None,
        }
    }

    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
            jitter: 0.0,
            slow_after: None,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_slow_after(mut self, slow_after: Option<Duration>) -> Self {
        self.slow_after = slow_after;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry `retry` (1-based), without jitter.
    pub fn base_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let millis = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Delay before retry `retry` (1-based), with jitter applied.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let base = self.base_delay(retry);
        if self.jitter <= 0.0 || base.is_zero() {
            return base;
        }
        let extra = rand::thread_rng().gen_range(0.0..=self.jitter * base.as_secs_f64());
        base + Duration::from_secs_f64(extra)
    }

    fn is_slow(&self, elapsed: Duration) -> bool {
        self.slow_after.is_some_and(|limit| elapsed >= limit)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Final result of a retried operation.
#[derive(Debug, Clone)]
pub struct RetryReport<T, E> {
    pub outcome: Result<T, E>,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Run `attempt_fn` until it succeeds, fails terminally, or attempts run out.
///
/// `attempt_fn` receives the 1-based attempt number.
pub async fn run_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    query: &str,
    observer: &dyn AttemptObserver,
    mut attempt_fn: F,
) -> RetryReport<T, E>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AttemptOutcome<T, E>>,
{
    let started = Instant::now();
    let max_attempts = policy.max_attempts();
    let mut slow_result: Option<T> = None;
    let mut attempts = 0;

    let finish = |outcome: Result<T, E>, attempts: u32| RetryReport {
        outcome,
        attempts,
        elapsed: started.elapsed(),
    };

    loop {
        attempts += 1;
        let retries_left = max_attempts - attempts;

        let attempt_started = Instant::now();
        let outcome = attempt_fn(attempts).await;
        let elapsed = attempt_started.elapsed();

        let record = move |label: AttemptLabel, error: Option<String>| AttemptRecord {
            query,
            attempt: attempts,
            elapsed,
            outcome: label,
            retries_left,
            error,
        };

        match outcome {
            AttemptOutcome::Success(value) => {
                if retries_left == 0 || !policy.is_slow(elapsed) {
                    observer.on_attempt(&record(AttemptLabel::Success, None));
                    return finish(Ok(value), attempts);
                }
                observer.on_attempt(&record(AttemptLabel::Slow, None));
                slow_result = Some(value);
            }
            AttemptOutcome::RetryableFailure(err) => {
                observer.on_attempt(&record(AttemptLabel::Retryable, Some(err.to_string())));
                if retries_left == 0 {
                    return finish(slow_result.ok_or(err), attempts);
                }
            }
            AttemptOutcome::TerminalFailure(err) => {
                observer.on_attempt(&record(AttemptLabel::Terminal, Some(err.to_string())));
                return finish(slow_result.ok_or(err), attempts);
            }
        }

        let delay = policy.delay_for(attempts);
        observer.on_backoff(query, attempts, delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
