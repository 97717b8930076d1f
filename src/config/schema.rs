//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the health
//! service. All types derive Serde traits for deserialization from TOML.

use serde::{Deserialize, Serialize};

use crate::pool::ThresholdBoundary;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HealthConfig {
    /// HTTP endpoint settings.
    pub server: ServerConfig,

    /// Liveness group settings.
    pub liveness: GroupConfig,

    /// Readiness group settings.
    pub readiness: GroupConfig,

    /// Heartbeat scheduling.
    pub heartbeat: HeartbeatConfig,

    /// Pool saturation heuristic.
    pub pool: PoolConfig,

    /// Probe retry backoff.
    pub retry: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// TCP dependencies probed by the `healthd` binary.
    pub probes: Vec<ProbeConfig>,
}

/// HTTP endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Liveness probe path.
    pub live_path: String,

    /// Readiness probe path.
    pub ready_path: String,

    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            live_path: "/live".to_string(),
            ready_path: "/ready".to_string(),
            // Kubernetes' default probe timeout.
            request_timeout_ms: 1000,
        }
    }
}

/// Settings of one check group.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Upper bound of one run in milliseconds.
    pub timeout_ms: u64,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self { timeout_ms: 2000 }
    }
}

/// Heartbeat configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Interval between runs in milliseconds.
    pub period_ms: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self { period_ms: 3000 }
    }
}

/// Pool saturation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Free-capacity percentage above which pools are actively pinged.
    pub lower_limit_percent: u32,

    /// Whether a free ratio equal to the limit also pings.
    pub boundary: ThresholdBoundary,

    /// Minimum interval between liveness pings in milliseconds.
    pub liveness_period_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            lower_limit_percent: 5,
            boundary: ThresholdBoundary::Exclusive,
            liveness_period_ms: 5000,
        }
    }
}

/// Probe retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Base interval for backoff in milliseconds; retries start at a
    /// quarter of it and never wait longer than half of it.
    pub base_interval_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: 500,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Expose Prometheus metrics.
    pub metrics_enabled: bool,

    /// Metrics path on the health server.
    pub metrics_path: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_path: "/metrics".to_string(),
        }
    }
}

/// Which group a probe is registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    Live,
    Ready,
}

/// A TCP dependency probe.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// Subsystem name reported in details.
    pub name: String,

    /// Group to register in.
    #[serde(default = "default_probe_kind")]
    pub kind: ProbeKind,

    /// Address to dial (e.g., "db.internal:5432").
    pub address: String,
}

fn default_probe_kind() -> ProbeKind {
    ProbeKind::Ready
}
