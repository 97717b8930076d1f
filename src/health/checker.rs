//! The checker capability.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::health::context::CheckContext;
use crate::health::result::CheckResult;

/// A named subsystem probe.
///
/// Implementations must return within the context deadline and should
/// observe [`CheckContext::cancelled`]. A panic inside a checker is caught by
/// the [`CheckGroup`](crate::health::CheckGroup) and reported as `DOWN`.
///
/// Any `Fn(CheckContext) -> impl Future<Output = CheckResult>` closure is a
/// checker.
pub trait Checker: Send + Sync + 'static {
    fn check(&self, ctx: CheckContext) -> BoxFuture<'static, CheckResult>;
}

impl<F, Fut> Checker for F
where
    F: Fn(CheckContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CheckResult> + Send + 'static,
{
    fn check(&self, ctx: CheckContext) -> BoxFuture<'static, CheckResult> {
        Box::pin(self(ctx))
    }
}

/// Shared, type-erased checker as stored in a group.
pub type CheckFn = Arc<dyn Checker>;
