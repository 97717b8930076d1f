//! Deadline-carrying cancellation context handed to every checker.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::health::result::CheckError;

/// Cancellation scope for one check run.
///
/// A context optionally carries a deadline and always carries a
/// [`CancellationToken`]. Derived contexts never outlive their parent: the
/// child deadline is clamped to the parent's and cancelling the parent
/// cancels every child.
#[derive(Debug, Clone, Default)]
pub struct CheckContext {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl CheckContext {
    /// Root context with no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a child bounded by `deadline` (or the parent's, if earlier).
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            token: self.token.child_token(),
        }
    }

    /// Derive a child that expires `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline, zero once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// True once the context was cancelled or its deadline passed.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.is_expired()
    }

    /// Resolves on explicit cancellation or when the deadline is reached.
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Cancel this context and all contexts derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Drive `fut` until it completes or the context is done.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, CheckError>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            out = fut => Ok(out),
            _ = self.cancelled() => Err(CheckError::DeadlineExceeded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_child_deadline_is_clamped_to_parent() {
        let parent = CheckContext::background().with_timeout(Duration::from_millis(100));
        let child = parent.with_timeout(Duration::from_secs(10));
        assert_eq!(child.deadline(), parent.deadline());

        let tighter = parent.with_timeout(Duration::from_millis(10));
        assert!(tighter.deadline().unwrap() < parent.deadline().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_resolves_at_deadline() {
        let ctx = CheckContext::background().with_timeout(Duration::from_millis(50));
        assert!(!ctx.is_cancelled());
        ctx.cancelled().await;
        assert!(ctx.is_cancelled());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[tokio::test]
    async fn test_parent_cancel_propagates() {
        let parent = CheckContext::background();
        let child = parent.with_timeout(Duration::from_secs(60));
        parent.cancel();
        assert!(child.is_cancelled());
        child.cancelled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_reports_deadline() {
        let ctx = CheckContext::background().with_timeout(Duration::from_millis(20));
        let out = ctx
            .run(tokio::time::sleep(Duration::from_secs(1)))
            .await;
        assert!(matches!(out, Err(CheckError::DeadlineExceeded)));

        let ok = CheckContext::background().run(async { 7 }).await;
        assert_eq!(ok.unwrap(), 7);
    }
}
