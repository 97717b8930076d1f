//! Resilience helpers for building checkers.
//!
//! # Data Flow
//! ```text
//! Checker invoked with a deadline-bound context:
//!     → retries.rs (attempt probe, on failure sleep per backoff.rs)
//!     → backoff.rs (jittered exponential schedule within the remaining budget)
//!     → CheckResult (UP on success, DOWN with the last probe error)
//! ```
//!
//! # Design Decisions
//! - The retry budget is the time left on the check context, never more
//! - Backoff derives from a single base interval (start at 1/4, cap at 1/2)
//! - Jittered backoff keeps replicas from probing a dependency in lockstep

pub mod backoff;
pub mod retries;

pub use backoff::ExponentialBackoff;
pub use retries::{check_with_backoff, retry_with_backoff};
