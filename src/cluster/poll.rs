//! Bounded retry and eventual-consistency polling
//!
//! The control plane applies creates and deletes asynchronously, so a
//! listing taken right after a change may not reflect it yet.

use std::future::Future;
use std::time::Duration;

use crate::common::config::{ExhaustionPolicy, RetryConfig};
use crate::common::{Error, Result};

/// Whether a resource is expected to show up in a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Absent,
    Present,
}

impl Presence {
    /// Does `listing` agree with this presence for `name`
    pub fn holds(self, listing: &str, name: &str) -> bool {
        match self {
            Presence::Present => listing.contains(name),
            Presence::Absent => !listing.contains(name),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Presence::Absent => "deleted",
            Presence::Present => "created",
        }
    }
}

/// Attempt budget, fixed delay and exhaustion behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
    pub on_exhausted: ExhaustionPolicy,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            on_exhausted: ExhaustionPolicy::Fail,
        }
    }

    pub fn on_exhausted(mut self, policy: ExhaustionPolicy) -> Self {
        self.on_exhausted = policy;
        self
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            interval: config.interval(),
            on_exhausted: config.on_exhausted,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

/// How a poll ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The condition held on this attempt
    Satisfied { attempts: u32 },
    /// The budget ran out first
    Exhausted { attempts: u32 },
}

impl PollOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, PollOutcome::Satisfied { .. })
    }

    pub fn attempts(&self) -> u32 {
        match *self {
            PollOutcome::Satisfied { attempts } | PollOutcome::Exhausted { attempts } => attempts,
        }
    }

    /// Apply the exhaustion policy, yielding the attempt count on success
    pub fn into_result(self, name: &str, target: Presence, policy: ExhaustionPolicy) -> Result<u32> {
        match (self, policy) {
            (PollOutcome::Satisfied { attempts }, _) => Ok(attempts),
            (PollOutcome::Exhausted { attempts }, ExhaustionPolicy::Succeed) => {
                tracing::warn!(
                    name,
                    attempts,
                    "{} never became {}, continuing anyway",
                    name,
                    target.as_str()
                );
                Ok(attempts)
            }
            (PollOutcome::Exhausted { attempts }, ExhaustionPolicy::Fail) => {
                Err(Error::poll_timeout(name, target.as_str(), attempts))
            }
        }
    }
}

/// Probe until `name` reaches `target` presence or the budget runs out
///
/// A probe error counts as "not yet" and is otherwise ignored. The
/// interval is slept between unsatisfied attempts, not after the last.
pub async fn poll_until<F, Fut>(
    mut probe: F,
    name: &str,
    target: Presence,
    policy: &RetryPolicy,
) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let mut attempts = 0;
    while attempts < policy.max_attempts {
        attempts += 1;

        match probe().await {
            Ok(listing) if target.holds(&listing, name) => {
                return PollOutcome::Satisfied { attempts };
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "Probe failed, treating as not yet {}", target.as_str()),
        }

        if attempts < policy.max_attempts {
            tracing::debug!(
                "{} not yet {}, waiting {}s, and trying again: {} of {}",
                name,
                target.as_str(),
                policy.interval.as_secs(),
                attempts,
                policy.max_attempts
            );
            tokio::time::sleep(policy.interval).await;
        }
    }

    PollOutcome::Exhausted { attempts }
}

/// Retry `op` until it succeeds or the budget runs out
///
/// Returns the last error when every attempt fails. At least one attempt
/// is always made.
pub async fn retry<T, F, Fut>(mut op: F, policy: &RetryPolicy) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_attempts => return Err(e),
            Err(e) => {
                tracing::debug!(
                    "Attempt failed with error {}, waiting {}s, and trying again: {} of {}",
                    e,
                    policy.interval.as_secs(),
                    attempt,
                    max_attempts
                );
                tokio::time::sleep(policy.interval).await;
            }
        }
    }
}
