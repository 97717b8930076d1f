//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Check groups and heartbeat produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (gauges, counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape on the health server)
//! ```
//!
//! # Design Decisions
//! - Structured fields (group, subsystem, error) on every check event
//! - Metrics are cheap and recorded unconditionally

pub mod logging;
pub mod metrics;
