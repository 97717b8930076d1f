//! Connection-pool aware checkers.
//!
//! # Data Flow
//! ```text
//! Driver adapter (external)
//!     → PoolStats::snapshot (idle / max)
//!     → saturation.rs decides: probe, skip healthy, or not ready
//!     → PoolStats::ping when probing (skipped if activity.rs saw a recent acquire)
//!     → retried by resilience::retries within the check deadline
//! ```
//!
//! # Design Decisions
//! - Health checks must never consume the last free connection
//! - The saturation boundary (`>` vs `>=`) is an explicit policy

pub mod activity;
pub mod checker;
pub mod saturation;

pub use activity::ActivityTracker;
pub use checker::{pool_liveness_checker, pool_readiness_checker, PoolCheckConfig, PoolStats};
pub use saturation::{decide, Decision, PoolSnapshot, SaturationPolicy, ThresholdBoundary};
