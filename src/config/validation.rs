//! Configuration validation.
//!
//! Semantic checks that serde cannot express. All violations are collected
//! so a bad file is reported in one pass.

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::HealthConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("pool.lower_limit_percent must be at most 100, got {0}")]
    LowerLimitOutOfRange(u32),

    #[error("{field} must start with '/', got {value:?}")]
    InvalidPath { field: &'static str, value: String },

    #[error("liveness and readiness share the path {0:?}")]
    DuplicatePath(String),

    #[error("server.bind_address {0:?} is not a socket address")]
    InvalidBindAddress(String),

    #[error("probe name {0:?} is used more than once")]
    DuplicateProbe(String),

    #[error("probe {name:?} address {address:?} is not host:port")]
    InvalidProbeAddress { name: String, address: String },
}

/// Validate `config`, returning every problem found.
pub fn validate_config(config: &HealthConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let durations = [
        ("server.request_timeout_ms", config.server.request_timeout_ms),
        ("liveness.timeout_ms", config.liveness.timeout_ms),
        ("readiness.timeout_ms", config.readiness.timeout_ms),
        ("heartbeat.period_ms", config.heartbeat.period_ms),
        ("pool.liveness_period_ms", config.pool.liveness_period_ms),
        ("retry.base_interval_ms", config.retry.base_interval_ms),
    ];
    for (field, value) in durations {
        if value == 0 {
            errors.push(ValidationError::ZeroDuration { field });
        }
    }

    if config.pool.lower_limit_percent > 100 {
        errors.push(ValidationError::LowerLimitOutOfRange(
            config.pool.lower_limit_percent,
        ));
    }

    let paths = [
        ("server.live_path", &config.server.live_path),
        ("server.ready_path", &config.server.ready_path),
        ("observability.metrics_path", &config.observability.metrics_path),
    ];
    for (field, value) in paths {
        if !value.starts_with('/') {
            errors.push(ValidationError::InvalidPath {
                field,
                value: value.clone(),
            });
        }
    }
    if config.server.live_path == config.server.ready_path {
        errors.push(ValidationError::DuplicatePath(config.server.live_path.clone()));
    }

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.server.bind_address.clone(),
        ));
    }

    let mut seen = HashSet::new();
    for probe in &config.probes {
        if !seen.insert(probe.name.as_str()) {
            errors.push(ValidationError::DuplicateProbe(probe.name.clone()));
        }
        if !is_host_port(&probe.address) {
            errors.push(ValidationError::InvalidProbeAddress {
                name: probe.name.clone(),
                address: probe.address.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `host:port` with a non-empty host and a numeric port. Hostnames are
/// resolved at dial time, so only the shape is checked here.
fn is_host_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => !host.trim().is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{ProbeConfig, ProbeKind};

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&HealthConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = HealthConfig::default();
        config.liveness.timeout_ms = 0;
        config.pool.lower_limit_percent = 150;
        config.server.ready_path = "ready".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::ZeroDuration {
            field: "liveness.timeout_ms"
        }));
        assert!(errors.contains(&ValidationError::LowerLimitOutOfRange(150)));
    }

    #[test]
    fn test_rejects_shared_paths_and_duplicate_probes() {
        let mut config = HealthConfig::default();
        config.server.ready_path = config.server.live_path.clone();
        let probe = ProbeConfig {
            name: "db".to_string(),
            kind: ProbeKind::Ready,
            address: "127.0.0.1:5432".to_string(),
        };
        config.probes = vec![probe.clone(), probe];

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicatePath("/live".to_string())));
        assert!(errors.contains(&ValidationError::DuplicateProbe("db".to_string())));
    }

    #[test]
    fn test_probe_address_shape() {
        let mut config = HealthConfig::default();
        config.probes = vec![
            ProbeConfig {
                name: "cache".to_string(),
                kind: ProbeKind::Ready,
                address: "redis.internal:6379".to_string(),
            },
            ProbeConfig {
                name: "broker".to_string(),
                kind: ProbeKind::Live,
                address: "amqp.internal".to_string(),
            },
        ];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidProbeAddress {
                name: "broker".to_string(),
                address: "amqp.internal".to_string(),
            }]
        );
    }
}
