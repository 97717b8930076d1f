//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Heartbeat (registry.rs):
//!     Periodic timer
//!     → CheckGroup::check for liveness and readiness
//!
//! Check group (group.rs):
//!     Fan out one task per checker under a shared deadline
//!     → collect CheckResult per subsystem
//!     → overall verdict = every subsystem UP
//!
//! Readers (HTTP layer):
//!     is_ok()    → lock-free verdict
//!     details()  → snapshot of per-subsystem results
//! ```
//!
//! # Design Decisions
//! - Liveness and readiness are separate groups with separate timeouts
//! - A checker failure of any kind stays local to its subsystem slot
//! - No retries at this layer; checkers retry inside their own deadline

pub mod checker;
pub mod context;
pub mod group;
pub mod registry;
pub mod result;

pub use checker::{CheckFn, Checker};
pub use context::CheckContext;
pub use group::CheckGroup;
pub use registry::{Health, HealthOptions, LIVENESS, READINESS};
pub use result::{CheckError, CheckResult, SubsystemStatus};
