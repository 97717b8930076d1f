//! Probe retries bounded by the check deadline.
//!
//! A single dropped ping should not flip readiness and eject the instance
//! from the load balancer, so probes are retried with jittered exponential
//! backoff for as long as the enclosing check deadline allows.

use std::future::Future;
use std::time::Duration;

use tokio::time;

use crate::health::{CheckContext, CheckError, CheckResult};
use crate::resilience::backoff::ExponentialBackoff;

/// Retry budget used when the context carries no deadline.
pub const DEFAULT_MAX_ELAPSED: Duration = Duration::from_secs(1);

/// Retry `probe` until it succeeds or the context deadline budget is spent,
/// then fold the outcome into a [`CheckResult`].
pub async fn check_with_backoff<F, Fut>(
    ctx: &CheckContext,
    base_interval: Duration,
    probe: F,
) -> CheckResult
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), CheckError>>,
{
    CheckResult::from_outcome(retry_with_backoff(ctx, base_interval, probe).await)
}

/// Retry `probe` with backoff derived from `base_interval`; returns the last
/// probe error once the time remaining on `ctx` (or one second) is exhausted.
///
/// The probe is always attempted at least once. A sleep between attempts is
/// cut short when the context is cancelled.
pub async fn retry_with_backoff<F, Fut>(
    ctx: &CheckContext,
    base_interval: Duration,
    mut probe: F,
) -> Result<(), CheckError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), CheckError>>,
{
    let max_elapsed = ctx.remaining().unwrap_or(DEFAULT_MAX_ELAPSED);
    let mut backoff = ExponentialBackoff::from_base_interval(base_interval, max_elapsed);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let err = match probe().await {
            Ok(()) => {
                if attempt > 1 {
                    tracing::debug!(attempt, "Probe recovered after retry");
                }
                return Ok(());
            }
            Err(err) => err,
        };

        let Some(delay) = backoff.next_backoff() else {
            tracing::debug!(attempts = attempt, error = %err, "Probe retries exhausted");
            return Err(err);
        };

        tracing::trace!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Probe failed, backing off"
        );

        tokio::select! {
            _ = time::sleep(delay) => {}
            _ = ctx.cancelled() => return Err(err),
        }
    }
}
