//! Pool saturation heuristic.
//!
//! Decides from a pool's idle/max capacity whether a health probe may spend
//! a connection. Under saturation the probe is skipped so that health
//! checking never adds to the contention it is meant to detect.
//!
//! ```text
//! max == 0                         → probe (unbounded pool, pressure unknown)
//! open < max                       → probe (pool can still grow)
//! free == 0                        → PoolNotReady, no probe
//! free > lower (>= if inclusive)   → probe
//! otherwise                        → healthy, no probe
//! ```
//! where `free = idle * 100 / max` with integer truncation.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::health::CheckError;

/// Whether a free ratio equal to the lower limit is enough to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdBoundary {
    /// Probe only when `free > lower_limit`.
    #[default]
    Exclusive,
    /// Probe when `free >= lower_limit`.
    Inclusive,
}

/// Capacity of a resource pool at one instant, as reported by its driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolSnapshot {
    /// Connections currently idle.
    pub idle: usize,
    /// Maximum (or current total) connections; zero means unbounded.
    pub max: usize,
    /// Connections currently open, when the driver reports it.
    pub open: Option<usize>,
}

impl PoolSnapshot {
    pub fn new(idle: usize, max: usize) -> Self {
        Self {
            idle,
            max,
            open: None,
        }
    }

    /// Attach the number of open connections of a lazily grown pool.
    pub fn with_open(mut self, open: usize) -> Self {
        self.open = Some(open);
        self
    }

    /// The pool may still open connections, so acquiring one for a probe
    /// cannot starve callers.
    pub fn has_headroom(&self) -> bool {
        self.open.is_some_and(|open| open < self.max)
    }

    /// Free capacity in whole percent, `None` for unbounded pools.
    pub fn free_ratio(&self) -> Option<usize> {
        if self.max == 0 {
            return None;
        }
        Some(self.idle.saturating_mul(100) / self.max)
    }
}

/// Outcome of evaluating a snapshot against a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Enough spare capacity (or unbounded): run the real probe.
    Probe,
    /// Some idle capacity but below the limit: healthy without probing.
    SkipHealthy,
    /// No idle capacity: not ready, no probe.
    Saturated,
}

/// Saturation thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaturationPolicy {
    /// Free-capacity percentage above which a real probe is performed.
    pub lower_limit_percent: u32,
    pub boundary: ThresholdBoundary,
}

impl Default for SaturationPolicy {
    fn default() -> Self {
        Self {
            lower_limit_percent: 5,
            boundary: ThresholdBoundary::Exclusive,
        }
    }
}

impl SaturationPolicy {
    pub fn new(lower_limit_percent: u32) -> Self {
        Self {
            lower_limit_percent,
            ..Self::default()
        }
    }

    pub fn with_boundary(mut self, boundary: ThresholdBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn evaluate(&self, snapshot: PoolSnapshot) -> Decision {
        if snapshot.has_headroom() {
            return Decision::Probe;
        }
        let Some(free) = snapshot.free_ratio() else {
            return Decision::Probe;
        };
        if free == 0 {
            return Decision::Saturated;
        }
        let lower = self.lower_limit_percent as usize;
        let enough = match self.boundary {
            ThresholdBoundary::Exclusive => free > lower,
            ThresholdBoundary::Inclusive => free >= lower,
        };
        if enough {
            Decision::Probe
        } else {
            Decision::SkipHealthy
        }
    }
}

/// Apply `policy` to `snapshot`, invoking `probe` only when it is safe to.
pub async fn decide<F, Fut>(
    snapshot: PoolSnapshot,
    policy: &SaturationPolicy,
    probe: F,
) -> Result<(), CheckError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), CheckError>>,
{
    match policy.evaluate(snapshot) {
        Decision::Probe => probe().await,
        Decision::SkipHealthy => {
            tracing::trace!(
                idle = snapshot.idle,
                max = snapshot.max,
                lower_limit = policy.lower_limit_percent,
                "Pool below probe threshold, skipping ping"
            );
            Ok(())
        }
        Decision::Saturated => {
            tracing::debug!(idle = snapshot.idle, max = snapshot.max, "Pool saturated");
            Err(CheckError::PoolNotReady)
        }
    }
}
