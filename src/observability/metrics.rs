//! Metrics collection and exposition.
//!
//! # Metrics
//! - `health_check_status` (gauge): 1=UP, 0=DOWN per group and subsystem
//! - `health_check_failures_total` (counter): DOWN results by reason
//! - `health_group_status` (gauge): overall verdict per group
//! - `health_check_duration_seconds` (histogram): wall time of a group run
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::health::CheckResult;

/// Install the Prometheus recorder and return a handle for rendering.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::info!("Prometheus recorder installed");
    Ok(handle)
}

/// Record the outcome of one subsystem check.
pub fn record_check(group: &str, subsystem: &str, result: &CheckResult) {
    let up = if result.is_up() { 1.0 } else { 0.0 };
    gauge!(
        "health_check_status",
        "group" => group.to_string(),
        "subsystem" => subsystem.to_string()
    )
    .set(up);

    if let Some(err) = &result.error {
        counter!(
            "health_check_failures_total",
            "group" => group.to_string(),
            "subsystem" => subsystem.to_string(),
            "reason" => err.reason()
        )
        .increment(1);
    }
}

/// Record the verdict and duration of a group run.
pub fn record_group_run(group: &str, healthy: bool, elapsed: Duration) {
    gauge!("health_group_status", "group" => group.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
    histogram!("health_check_duration_seconds", "group" => group.to_string())
        .record(elapsed.as_secs_f64());
}
