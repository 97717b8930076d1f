//! Liveness and readiness checking for long-running services.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pool;
pub mod probes;
pub mod resilience;

pub use config::HealthConfig;
pub use health::{CheckContext, CheckGroup, CheckResult, Health};
pub use http::HealthServer;
pub use lifecycle::Shutdown;
