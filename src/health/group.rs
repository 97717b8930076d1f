//! Concurrent check group.
//!
//! # Run model
//! ```text
//! check(ctx)
//!     → child context bounded by the group timeout
//!     → verdict reset to UP
//!     → one task per registered checker (JoinSet), each behind a panic boundary
//!     → results recorded as tasks finish
//!     → deadline: cancel context, abort laggards, record them DOWN
//!     → verdict = AND of every subsystem outcome of this run
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use futures_util::FutureExt;
use tokio::task::{Id, JoinSet};
use tokio::time::Instant;

use crate::health::checker::{CheckFn, Checker};
use crate::health::context::CheckContext;
use crate::health::result::{CheckError, CheckResult};
use crate::observability::metrics;

/// A named set of checkers evaluated together.
pub struct CheckGroup {
    name: String,
    timeout: Duration,
    /// Registry snapshot; runs work on the snapshot they loaded.
    checkers: ArcSwap<HashMap<String, CheckFn>>,
    /// Overall verdict of the latest run.
    status: AtomicBool,
    /// Latest result per subsystem.
    details: DashMap<String, CheckResult>,
}

impl CheckGroup {
    pub fn new(name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            timeout,
            checkers: ArcSwap::from_pointee(HashMap::new()),
            status: AtomicBool::new(false),
            details: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of registered checkers.
    pub fn len(&self) -> usize {
        self.checkers.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register `checker` under `subsystem`. A later registration with the
    /// same name replaces the earlier one.
    pub fn add_checker<C>(&self, subsystem: impl Into<String>, checker: C)
    where
        C: Checker,
    {
        self.add_shared_checker(subsystem, Arc::new(checker));
    }

    /// Register an already type-erased checker.
    pub fn add_shared_checker(&self, subsystem: impl Into<String>, checker: CheckFn) {
        let subsystem = subsystem.into();
        tracing::debug!(group = %self.name, subsystem = %subsystem, "Registering checker");
        self.checkers.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(subsystem.clone(), checker.clone());
            next
        });
    }

    /// Run every registered checker once, concurrently, bounded by the group
    /// timeout (or `ctx`'s deadline if that is earlier).
    ///
    /// Returns once every checker has reported or the deadline has passed;
    /// checkers still running at the deadline are aborted and recorded as
    /// `DOWN` with [`CheckError::DeadlineExceeded`].
    pub async fn check(&self, ctx: &CheckContext) {
        let ctx = ctx.with_timeout(self.timeout);
        let checkers = self.checkers.load_full();
        let started = Instant::now();

        let was_ok = self.status.swap(true, Ordering::SeqCst);

        let mut tasks = JoinSet::new();
        let mut pending: HashMap<Id, String> = HashMap::with_capacity(checkers.len());
        for (subsystem, checker) in checkers.iter() {
            let handle = tasks.spawn(run_guarded(checker.clone(), ctx.clone()));
            pending.insert(handle.id(), subsystem.clone());
        }

        tracing::debug!(group = %self.name, checkers = pending.len(), "Check run started");

        let mut healthy = true;
        let mut timed_out = false;
        loop {
            let joined = tokio::select! {
                biased;
                joined = tasks.join_next_with_id() => joined,
                _ = ctx.cancelled() => {
                    timed_out = true;
                    break;
                }
            };
            let Some(joined) = joined else { break };
            healthy &= self.record_joined(joined, &mut pending, false);
        }

        if timed_out {
            ctx.cancel();
            // Keep whatever finished right at the deadline before aborting.
            while let Some(joined) = tasks.try_join_next_with_id() {
                healthy &= self.record_joined(joined, &mut pending, false);
            }
            tasks.abort_all();
            while let Some(joined) = tasks.try_join_next_with_id() {
                healthy &= self.record_joined(joined, &mut pending, true);
            }
        }
        drop(tasks);

        for (_, subsystem) in pending.drain() {
            let error = if timed_out {
                self.warn_deadline(Some(&subsystem));
                CheckError::DeadlineExceeded
            } else {
                CheckError::Aborted("task ended without a result".to_string())
            };
            self.record(&subsystem, CheckResult::down(error));
            healthy = false;
        }

        self.details
            .retain(|subsystem, _| checkers.contains_key(subsystem));

        if !healthy {
            self.status.store(false, Ordering::SeqCst);
        }

        let elapsed = started.elapsed();
        metrics::record_group_run(&self.name, healthy, elapsed);

        if healthy != was_ok {
            tracing::info!(
                group = %self.name,
                healthy,
                "Health verdict changed"
            );
        }
        tracing::debug!(
            group = %self.name,
            healthy,
            elapsed_ms = elapsed.as_millis() as u64,
            "Check run finished"
        );
    }

    /// Point-in-time copy of the latest result of every subsystem.
    pub fn details(&self) -> HashMap<String, CheckResult> {
        self.details
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Verdict of the latest run. `false` until the first run completes; an
    /// empty group is healthy once it has run.
    pub fn is_ok(&self) -> bool {
        self.status.load(Ordering::SeqCst)
    }

    /// Record a joined task. Returns whether the subsystem came back `UP`.
    ///
    /// `deadline_abort` marks tasks cancelled because the run timed out;
    /// those are reported as [`CheckError::DeadlineExceeded`].
    fn record_joined(
        &self,
        joined: Result<(Id, CheckResult), tokio::task::JoinError>,
        pending: &mut HashMap<Id, String>,
        deadline_abort: bool,
    ) -> bool {
        let (id, result) = match joined {
            Ok((id, result)) => (id, result),
            Err(err) => {
                let error = if err.is_panic() {
                    CheckError::Panicked(err.to_string())
                } else if deadline_abort && err.is_cancelled() {
                    self.warn_deadline(pending.get(&err.id()).map(String::as_str));
                    CheckError::DeadlineExceeded
                } else {
                    CheckError::Aborted(err.to_string())
                };
                (err.id(), CheckResult::down(error))
            }
        };
        let Some(subsystem) = pending.remove(&id) else {
            return true;
        };
        let up = result.is_up();
        self.record(&subsystem, result);
        up
    }

    fn warn_deadline(&self, subsystem: Option<&str>) {
        tracing::warn!(
            group = %self.name,
            subsystem = subsystem.unwrap_or("unknown"),
            timeout_ms = self.timeout.as_millis() as u64,
            "Checker did not finish before the deadline"
        );
    }

    fn record(&self, subsystem: &str, result: CheckResult) {
        if let Some(err) = &result.error {
            match err {
                CheckError::Panicked(msg) => tracing::error!(
                    group = %self.name,
                    subsystem = %subsystem,
                    panic = %msg,
                    "Checker panicked"
                ),
                _ => tracing::warn!(
                    group = %self.name,
                    subsystem = %subsystem,
                    error = %err,
                    "Subsystem is down"
                ),
            }
        }
        metrics::record_check(&self.name, subsystem, &result);
        self.details.insert(subsystem.to_string(), result);
    }
}

impl std::fmt::Debug for CheckGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckGroup")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("checkers", &self.len())
            .field("ok", &self.is_ok())
            .finish()
    }
}

/// Run one checker behind a panic boundary.
async fn run_guarded(checker: CheckFn, ctx: CheckContext) -> CheckResult {
    let outcome = AssertUnwindSafe(async move { checker.check(ctx).await })
        .catch_unwind()
        .await;
    match outcome {
        Ok(result) => result,
        Err(panic) => CheckResult::down(CheckError::Panicked(panic_message(&*panic))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::result::SubsystemStatus;

    const TIMEOUT: Duration = Duration::from_millis(100);

    fn failing(_ctx: CheckContext) -> impl std::future::Future<Output = CheckResult> {
        async { CheckResult::down(CheckError::message("failed check")) }
    }

    fn explode(_ctx: CheckContext) -> impl std::future::Future<Output = CheckResult> {
        async { panic!("checker exploded") }
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_up_is_ok() {
        let group = CheckGroup::new("liveness", TIMEOUT);
        group.add_checker("one", |_ctx: CheckContext| async { CheckResult::up() });
        group.add_checker("two", |_ctx: CheckContext| async { CheckResult::up() });

        group.check(&CheckContext::background()).await;

        assert!(group.is_ok());
        let details = group.details();
        assert_eq!(details.len(), 2);
        assert!(details.values().all(CheckResult::is_up));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_failure_takes_group_down() {
        let group = CheckGroup::new("readiness", TIMEOUT);
        group.add_checker("ok", |_ctx: CheckContext| async { CheckResult::up() });
        group.add_checker("broken", failing);

        group.check(&CheckContext::background()).await;

        assert!(!group.is_ok());
        let details = group.details();
        assert!(details["ok"].is_up());
        let broken = &details["broken"];
        assert_eq!(broken.status, SubsystemStatus::Down);
        assert_eq!(broken.error.as_ref().unwrap().to_string(), "failed check");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_checker_times_out() {
        let group = CheckGroup::new("liveness", TIMEOUT);
        group.add_checker("fast", |_ctx: CheckContext| async { CheckResult::up() });
        group.add_checker("slow", |_ctx: CheckContext| async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            CheckResult::up()
        });

        let started = Instant::now();
        group.check(&CheckContext::background()).await;
        let elapsed = started.elapsed();

        assert!(!group.is_ok());
        assert!(elapsed >= TIMEOUT);
        assert!(elapsed < TIMEOUT + Duration::from_millis(20));

        let details = group.details();
        assert!(details["fast"].is_up());
        assert!(details["slow"]
            .error
            .as_ref()
            .is_some_and(CheckError::is_deadline_exceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_deadline_shortens_run() {
        let group = CheckGroup::new("liveness", Duration::from_secs(10));
        group.add_checker("slow", |ctx: CheckContext| async move {
            ctx.cancelled().await;
            CheckResult::down(CheckError::DeadlineExceeded)
        });

        let parent = CheckContext::background().with_timeout(Duration::from_millis(50));
        let started = Instant::now();
        group.check(&parent).await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!group.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_group_is_ok() {
        let group = CheckGroup::new("liveness", TIMEOUT);
        assert!(group.is_empty());
        group.check(&CheckContext::background()).await;
        assert!(group.is_ok());
        assert!(group.details().is_empty());
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let group = CheckGroup::new("liveness", TIMEOUT);
        group.add_checker("healthy", |_ctx: CheckContext| async { CheckResult::up() });
        group.add_checker("panicky", explode);

        group.check(&CheckContext::background()).await;

        assert!(!group.is_ok());
        let details = group.details();
        assert!(details["healthy"].is_up());
        match details["panicky"].error.as_ref() {
            Some(CheckError::Panicked(msg)) => assert!(msg.contains("checker exploded")),
            other => panic!("expected panic error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_details_empty_before_first_run() {
        let group = CheckGroup::new("liveness", TIMEOUT);
        group.add_checker("one", |_ctx: CheckContext| async { CheckResult::up() });
        assert!(group.details().is_empty());
        assert!(!group.is_ok());
        assert_eq!(group.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_registration_wins() {
        let group = CheckGroup::new("readiness", TIMEOUT);
        group.add_checker("db", failing);
        group.add_checker("db", |_ctx: CheckContext| async { CheckResult::up() });

        group.check(&CheckContext::background()).await;

        assert_eq!(group.len(), 1);
        assert!(group.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_verdict_recovers_on_next_run() {
        let flaky = Arc::new(AtomicBool::new(false));
        let group = CheckGroup::new("readiness", TIMEOUT);
        let state = flaky.clone();
        group.add_checker("flaky", move |_ctx: CheckContext| {
            let up = state.load(Ordering::SeqCst);
            async move {
                if up {
                    CheckResult::up()
                } else {
                    CheckResult::down(CheckError::message("not yet"))
                }
            }
        });

        group.check(&CheckContext::background()).await;
        assert!(!group.is_ok());

        flaky.store(true, Ordering::SeqCst);
        group.check(&CheckContext::background()).await;
        assert!(group.is_ok());
        assert!(group.details()["flaky"].is_up());
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "unknown panic payload");
    }
}
