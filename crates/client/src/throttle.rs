//! Throttle-aware retry for write operations
//!
//! The service signals backpressure with HTTP 429 plus an
//! `x-throttle-wait-seconds` response header. [`with_throttle_retry`]
//! wraps a mutating operation: on that signal it sleeps the
//! server-specified duration and resubmits, threading an explicit
//! [`RetryState`] into each attempt. Every other failure propagates
//! unchanged, and retries for one logical call are strictly
//! sequential, so the caller observes exactly one resolution.

use std::future::Future;
use std::time::Duration;

use roost_domain::{ClientError, RetryState, ServiceError};
use tracing::{debug, warn};

/// Retry budget for throttled writes.
///
/// `Disabled` mirrors the historical client default. `Unlimited`
/// reproduces the historical retry-forever behavior once enabled; a
/// misbehaving server that always answers 429 will keep such a call
/// in flight indefinitely, which is why [`ThrottlePolicy::RECOMMENDED`]
/// caps the budget instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThrottlePolicy {
    /// Never retry; surface the 429 to the caller.
    #[default]
    Disabled,
    /// Retry at most this many times.
    Limited(u32),
    /// Retry for as long as the server keeps asking.
    Unlimited,
}

impl ThrottlePolicy {
    /// Bounded budget suitable for production use.
    pub const RECOMMENDED: Self = Self::Limited(5);

    /// Whether another retry fits the budget after `completed_retries`.
    fn allows(self, completed_retries: u32) -> bool {
        match self {
            Self::Disabled => false,
            Self::Limited(max) => completed_retries < max,
            Self::Unlimited => true,
        }
    }
}

/// Errors that can ask for a throttle retry.
pub trait ThrottleSignal {
    /// The server-specified wait, when this error is the throttle
    /// signal (429 with a parseable wait header). `None` otherwise.
    fn throttle_wait_hint(&self) -> Option<Duration>;
}

impl ThrottleSignal for ServiceError {
    fn throttle_wait_hint(&self) -> Option<Duration> {
        if self.is_throttled() {
            self.throttle_wait()
        } else {
            None
        }
    }
}

impl ThrottleSignal for ClientError {
    fn throttle_wait_hint(&self) -> Option<Duration> {
        match self {
            Self::Service(err) => err.throttle_wait_hint(),
            Self::Validation(_) => None,
        }
    }
}

/// Run `op` to completion under the given policy.
///
/// `op` receives the current [`RetryState`] (starting at zero) and is
/// re-invoked with an incremented state after each throttle sleep. The
/// sleep is cooperative; cancellation of an in-flight sleep is not
/// supported.
pub async fn with_throttle_retry<T, E, F, Fut>(policy: ThrottlePolicy, op: F) -> Result<T, E>
where
    E: ThrottleSignal,
    F: Fn(RetryState) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut state = RetryState::default();

    loop {
        match op(state).await {
            Ok(value) => {
                if state.current_retry > 0 {
                    debug!(retries = state.current_retry, "write succeeded after throttling");
                }
                return Ok(value);
            }
            Err(err) => {
                if !policy.allows(state.current_retry) {
                    return Err(err);
                }
                let Some(wait) = err.throttle_wait_hint() else {
                    return Err(err);
                };

                warn!(
                    wait_secs = wait.as_secs(),
                    retry = state.current_retry + 1,
                    "throttled by service, sleeping before resubmit"
                );
                tokio::time::sleep(wait).await;
                state = state.next();
            }
        }
    }
}
