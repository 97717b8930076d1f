//! Liveness and readiness registries driven by a heartbeat.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthConfig;
use crate::health::checker::{CheckFn, Checker};
use crate::health::context::CheckContext;
use crate::health::group::CheckGroup;

pub const LIVENESS: &str = "liveness";
pub const READINESS: &str = "readiness";

/// Timing knobs of a [`Health`] registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthOptions {
    /// Upper bound of one liveness run.
    pub liveness_timeout: Duration,
    /// Upper bound of one readiness run.
    pub readiness_timeout: Duration,
    /// Interval between heartbeat ticks.
    pub check_period: Duration,
}

impl Default for HealthOptions {
    fn default() -> Self {
        Self {
            liveness_timeout: Duration::from_secs(2),
            readiness_timeout: Duration::from_secs(2),
            check_period: Duration::from_secs(3),
        }
    }
}

impl From<&HealthConfig> for HealthOptions {
    fn from(config: &HealthConfig) -> Self {
        Self {
            liveness_timeout: Duration::from_millis(config.liveness.timeout_ms),
            readiness_timeout: Duration::from_millis(config.readiness.timeout_ms),
            check_period: Duration::from_millis(config.heartbeat.period_ms),
        }
    }
}

/// Owns the liveness and readiness groups of a service.
///
/// Liveness checkers should only look at the process itself: a failing
/// liveness probe gets the process restarted. Readiness checkers look at
/// external dependencies: a failing readiness probe only withholds traffic.
#[derive(Debug)]
pub struct Health {
    liveness: CheckGroup,
    readiness: CheckGroup,
    check_period: Duration,
}

impl Health {
    pub fn new(options: HealthOptions) -> Self {
        Self {
            liveness: CheckGroup::new(LIVENESS, options.liveness_timeout),
            readiness: CheckGroup::new(READINESS, options.readiness_timeout),
            check_period: options.check_period,
        }
    }

    pub fn add_live_checker<C: Checker>(&self, subsystem: impl Into<String>, checker: C) {
        self.liveness.add_checker(subsystem, checker);
    }

    pub fn add_ready_checker<C: Checker>(&self, subsystem: impl Into<String>, checker: C) {
        self.readiness.add_checker(subsystem, checker);
    }

    /// Register one shared checker in both groups.
    pub fn add_checker_to_both(&self, subsystem: impl Into<String>, checker: CheckFn) {
        let subsystem = subsystem.into();
        self.liveness.add_shared_checker(subsystem.clone(), checker.clone());
        self.readiness.add_shared_checker(subsystem, checker);
    }

    pub fn liveness(&self) -> &CheckGroup {
        &self.liveness
    }

    pub fn readiness(&self) -> &CheckGroup {
        &self.readiness
    }

    pub fn check_period(&self) -> Duration {
        self.check_period
    }

    /// Run both groups once, concurrently.
    pub async fn run_checks(&self, ctx: &CheckContext) {
        tokio::join!(self.liveness.check(ctx), self.readiness.check(ctx));
    }

    /// Run both groups every `check_period` until shutdown is signalled.
    ///
    /// The first run happens immediately. A run that overshoots the period
    /// delays the next tick instead of bursting.
    pub async fn heartbeat(&self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            period_ms = self.check_period.as_millis() as u64,
            liveness_checkers = self.liveness.len(),
            readiness_checkers = self.readiness.len(),
            "Heartbeat starting"
        );

        let root = CheckContext::background();
        let mut ticker = time::interval(self.check_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_checks(&root).await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Heartbeat received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(HealthOptions::default())
    }
}
