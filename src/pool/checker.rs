//! Checkers for connection pools.
//!
//! Driver adapters implement [`PoolStats`]; the functions here turn such a
//! pool into readiness and liveness checkers.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::config::HealthConfig;
use crate::health::{CheckContext, CheckError, CheckResult, Checker};
use crate::pool::activity::ActivityTracker;
use crate::pool::saturation::{decide, PoolSnapshot, SaturationPolicy};
use crate::resilience::check_with_backoff;

/// The seam a database/cache/broker client adapter implements.
pub trait PoolStats: Send + Sync + 'static {
    /// Current idle, open and maximum capacity. Must be cheap and
    /// non-blocking. Lazily grown pools should report `open` so a pool that
    /// can still dial is probed rather than reported busy.
    fn snapshot(&self) -> PoolSnapshot;

    /// Round-trip to the backend (e.g. `PING`, `SELECT 1`) over a pooled
    /// connection, respecting `ctx`.
    fn ping(&self, ctx: CheckContext) -> BoxFuture<'static, Result<(), CheckError>>;

    /// Acquire-activity tracker, if the adapter records one.
    fn activity(&self) -> Option<&ActivityTracker> {
        None
    }
}

/// Tuning for pool checkers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolCheckConfig {
    pub policy: SaturationPolicy,
    /// Base interval of the retry backoff; also the window in which recent
    /// pool activity stands in for a ping.
    pub ping_interval: Duration,
    /// Minimum time between real pings issued by the liveness checker.
    pub liveness_period: Duration,
}

impl Default for PoolCheckConfig {
    fn default() -> Self {
        Self {
            policy: SaturationPolicy::default(),
            ping_interval: Duration::from_millis(500),
            liveness_period: Duration::from_secs(5),
        }
    }
}

impl From<&HealthConfig> for PoolCheckConfig {
    fn from(config: &HealthConfig) -> Self {
        Self {
            policy: SaturationPolicy {
                lower_limit_percent: config.pool.lower_limit_percent,
                boundary: config.pool.boundary,
            },
            ping_interval: Duration::from_millis(config.retry.base_interval_ms),
            liveness_period: Duration::from_millis(config.pool.liveness_period_ms),
        }
    }
}

/// Readiness checker: retries the saturation-guarded ping with backoff
/// until it succeeds or the check deadline is spent.
pub fn pool_readiness_checker<P>(pool: Arc<P>, config: PoolCheckConfig) -> impl Checker
where
    P: PoolStats,
{
    move |ctx: CheckContext| {
        let pool = pool.clone();
        async move {
            let probe_ctx = ctx.clone();
            check_with_backoff(&ctx, config.ping_interval, || {
                let pool = pool.clone();
                let ctx = probe_ctx.clone();
                async move {
                    let snapshot = pool.snapshot();
                    decide(snapshot, &config.policy, || async {
                        let recently_used = pool
                            .activity()
                            .is_some_and(|tracker| tracker.recently_active(config.ping_interval));
                        if recently_used {
                            return Ok(());
                        }
                        pool.ping(ctx).await
                    })
                    .await
                }
            })
            .await
        }
    }
}

/// Liveness checker: pings at most once per `liveness_period` so the
/// backend is not hammered; between successful pings it reports `UP`
/// without touching the pool.
pub fn pool_liveness_checker<P>(pool: Arc<P>, config: PoolCheckConfig) -> impl Checker
where
    P: PoolStats,
{
    let last_ping = Arc::new(ActivityTracker::new());
    move |ctx: CheckContext| {
        let pool = pool.clone();
        let last_ping = last_ping.clone();
        async move {
            if last_ping.recently_active(config.liveness_period) {
                return CheckResult::up();
            }
            let result = CheckResult::from_outcome(pool.ping(ctx).await);
            if result.is_up() {
                last_ping.touch();
            }
            result
        }
    }
}
