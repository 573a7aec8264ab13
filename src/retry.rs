//! Bounded retry with exponential backoff.
//!
//! The loop driver, not error propagation, decides whether to continue: each
//! attempt produces an explicit [`RetryDecision`] and the executor acts on
//! it. Retries that exhaust the budget re-raise the last error unchanged in
//! kind.

use std::fmt::Debug;
use std::thread;
use std::time::Duration;

use log::debug;
use log::warn;

use crate::config::EffectiveConfig;
use crate::constants::DEFAULT_BACKOFF_SCALE;
use crate::constants::DEFAULT_MAX_BACKOFF_DELAY;
use crate::constants::DEFAULT_MAX_ERROR_RETRY;
use crate::request::OutgoingRequest;
use crate::Error;

/// Verdict of a retry policy for one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for `delay`, then run the next attempt.
    Retry {
        /// Backoff delay before the next attempt.
        delay: Duration,
    },
    /// Propagate the error as-is.
    Abort,
}

/// Capability interface deciding whether a failed attempt is retried.
///
/// One default implementation exists ([`ExponentialBackoff`]); alternatives
/// are wired in through [`Config::retry_policy`](crate::Config).
pub trait RetryPolicy: Debug + Send + Sync + 'static {
    /// Classify a failure observed after `retries` completed retries.
    fn classify(&self, err: &Error, retries: u32) -> RetryDecision;
}

/// Default policy: capped exponential backoff over transient failures.
///
/// `delay(attempt) = min(max_delay, 2^attempt * scale)`, attempts counted
/// from 1 after the first failure, no jitter.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Retries granted after the initial attempt.
    pub max_retries: u32,
    /// Backoff scale factor.
    pub scale: Duration,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_ERROR_RETRY,
            scale: DEFAULT_BACKOFF_SCALE,
            max_delay: DEFAULT_MAX_BACKOFF_DELAY,
        }
    }
}

impl ExponentialBackoff {
    /// Create a policy granting `max_retries` retries after the initial
    /// attempt.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Change the backoff scale factor.
    pub fn with_scale(mut self, scale: Duration) -> Self {
        self.scale = scale;
        self
    }

    /// Change the delay cap.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    fn delay_before(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.scale
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn classify(&self, err: &Error, retries: u32) -> RetryDecision {
        if !err.is_transient() {
            return RetryDecision::Abort;
        }
        if retries >= self.max_retries {
            debug!("retry budget of {} exhausted", self.max_retries);
            return RetryDecision::Abort;
        }
        RetryDecision::Retry {
            delay: self.delay_before(retries + 1),
        }
    }
}

/// Drives attempts of one request until success, a permanent failure, or
/// budget exhaustion.
pub struct RetryExecutor<'a> {
    policy: &'a dyn RetryPolicy,
}

impl<'a> RetryExecutor<'a> {
    /// Create an executor driven by the given policy.
    pub fn new(policy: &'a dyn RetryPolicy) -> Self {
        Self { policy }
    }

    /// Run `attempt` until it succeeds or the policy aborts.
    ///
    /// Attempt numbers are monotonic and start at 1. Before every retry the
    /// request body, if present, is rewound to its original offset; a body
    /// that cannot be rewound makes the first transient failure terminal.
    /// The backoff sleep blocks the calling thread; there is no
    /// cross-attempt cancellation.
    pub fn execute<T>(
        &self,
        req: &mut OutgoingRequest,
        mut attempt: impl FnMut(u32, &mut OutgoingRequest) -> crate::Result<T>,
    ) -> crate::Result<T> {
        let mut retries = 0u32;
        loop {
            let n = retries + 1;
            let err = match attempt(n, req) {
                Ok(v) => return Ok(v),
                Err(err) => err,
            };

            let delay = match self.policy.classify(&err, retries) {
                RetryDecision::Abort => return Err(err),
                RetryDecision::Retry { delay } => delay,
            };

            if let Some(body) = req.body.as_mut() {
                if !body.is_replayable() {
                    warn!("request body is not replayable, giving up after attempt {n}");
                    return Err(err);
                }
                if let Err(io_err) = body.rewind() {
                    warn!("failed to rewind request body after attempt {n}: {io_err}");
                    return Err(err);
                }
            }

            debug!("attempt {n} failed ({err}), retrying in {delay:?}");
            thread::sleep(delay);
            retries += 1;
        }
    }
}

/// Run `attempt` under the retry policy of the given configuration.
///
/// This is the surface domain clients use; [`RetryExecutor`] is the
/// underlying driver.
pub fn execute_with_retry<T>(
    config: &EffectiveConfig,
    req: &mut OutgoingRequest,
    attempt: impl FnMut(u32, &mut OutgoingRequest) -> crate::Result<T>,
) -> crate::Result<T> {
    RetryExecutor::new(config.retry_policy.as_ref()).execute(req, attempt)
}
