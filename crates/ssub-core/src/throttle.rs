//! Hold a submission until the user's cluster usage leaves room for it.
//!
//! The wait is a small state machine: WAITING polls usage and moves to
//! SUBMIT once `usage + requested <= ceiling`, or to GIVE_UP when the
//! optional deadline has passed. Between polls it sleeps for an interval
//! that grows by one second per attempt, capped at [`MAX_POLL_INTERVAL`].

use ssub_parsers::format_duration;
use std::time::{Duration, Instant};
use thiserror::Error;

/// First sleep between polls.
pub const INITIAL_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Longest sleep between polls.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(60);

const POLL_INTERVAL_STEP: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum ThrottleError {
    #[error("Failed to query cluster usage: {0}")]
    Query(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error(
        "Gave up after {} waiting for capacity: {usage} cores in use + {requested} requested exceeds the ceiling of {ceiling}",
        format_duration(.waited.clone())
    )]
    GaveUp {
        waited: Duration,
        usage: u64,
        requested: u64,
        ceiling: u64,
    },
}

/// Time source for the wait loop.
#[allow(async_fn_in_trait)]
pub trait Clock {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

impl<C: Clock> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }
}

/// Reports the invoking user's current aggregate usage, in cores.
#[allow(async_fn_in_trait)]
pub trait UsageProbe {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn current_usage(&mut self) -> Result<u64, Self::Error>;
}

/// Throttle settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThrottleConfig {
    /// Maximum cores the user may hold; `None` disables throttling.
    pub ceiling: Option<u64>,
    /// Stop waiting after this long; `None` waits forever.
    pub give_up_after: Option<Duration>,
}

/// Outcome of a wait that ended in submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleReport {
    /// Number of usage queries made.
    pub attempts: u32,
    /// Total time spent waiting.
    pub waited: Duration,
}

/// Next move after a usage reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Submit,
    GiveUp,
    Sleep(Duration),
}

/// Bookkeeping for one blocking wait.
#[derive(Debug)]
struct ThrottleState {
    started: Instant,
    interval: Duration,
    attempts: u32,
}

impl ThrottleState {
    fn new(started: Instant) -> Self {
        Self {
            started,
            interval: INITIAL_POLL_INTERVAL,
            attempts: 0,
        }
    }

    fn step(
        &mut self,
        usage: u64,
        requested: u64,
        ceiling: u64,
        give_up_after: Option<Duration>,
        now: Instant,
    ) -> Transition {
        self.attempts += 1;

        if usage.saturating_add(requested) <= ceiling {
            return Transition::Submit;
        }

        let elapsed = now.saturating_duration_since(self.started);
        if give_up_after.is_some_and(|limit| elapsed > limit) {
            return Transition::GiveUp;
        }

        let sleep = self.interval;
        self.interval = (self.interval + POLL_INTERVAL_STEP).min(MAX_POLL_INTERVAL);
        Transition::Sleep(sleep)
    }
}

/// Blocks submission while the cluster is too full.
pub struct Throttle<C, P> {
    config: ThrottleConfig,
    clock: C,
    probe: P,
}

impl<C: Clock, P: UsageProbe> Throttle<C, P> {
    pub fn new(config: ThrottleConfig, clock: C, probe: P) -> Self {
        Self {
            config,
            clock,
            probe,
        }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Wait until `requested` more cores fit under the ceiling.
    pub async fn wait(&mut self, requested: u64) -> Result<ThrottleReport, ThrottleError> {
        let Some(ceiling) = self.config.ceiling else {
            return Ok(ThrottleReport {
                attempts: 0,
                waited: Duration::ZERO,
            });
        };

        if requested > ceiling {
            tracing::warn!(
                "Job requests {} cores but the ceiling is {}; it will never fit",
                requested,
                ceiling
            );
        }

        let mut state = ThrottleState::new(self.clock.now());

        loop {
            let usage = self
                .probe
                .current_usage()
                .await
                .map_err(|e| ThrottleError::Query(Box::new(e)))?;

            let now = self.clock.now();
            let waited = now.saturating_duration_since(state.started);

            match state.step(usage, requested, ceiling, self.config.give_up_after, now) {
                Transition::Submit => {
                    tracing::debug!(
                        "Usage {} + {} fits under {} after {} attempt(s)",
                        usage,
                        requested,
                        ceiling,
                        state.attempts
                    );
                    return Ok(ThrottleReport {
                        attempts: state.attempts,
                        waited,
                    });
                }
                Transition::GiveUp => {
                    return Err(ThrottleError::GaveUp {
                        waited,
                        usage,
                        requested,
                        ceiling,
                    });
                }
                Transition::Sleep(interval) => {
                    tracing::info!(
                        "Usage {} + {} exceeds ceiling {}, retrying in {}s",
                        usage,
                        requested,
                        ceiling,
                        interval.as_secs()
                    );
                    self.clock.sleep(interval).await;
                }
            }
        }
    }
}
