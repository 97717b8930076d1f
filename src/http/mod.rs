//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Probe request (kubelet, load balancer, operator)
//!     → server.rs (Axum router, middleware)
//!     → handler reads CheckGroup::is_ok / details (never runs checks)
//!     → response.rs (status code, JSON body, no-cache headers)
//! ```

pub mod response;
pub mod server;

pub use response::{is_kube_probe, probe_response, KUBE_PROBE_AGENT};
pub use server::{AppState, HealthServer, MetricsEndpoint};
