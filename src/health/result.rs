//! Check outcome model.
//!
//! A [`CheckResult`] is produced once per checker invocation and is the only
//! value that crosses the checker boundary. Every failure mode of a check
//! (saturated pool, failed probe, deadline, panic) is folded into a
//! [`CheckError`] carried by a `DOWN` result.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Status of a single subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubsystemStatus {
    Up,
    Down,
}

impl fmt::Display for SubsystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubsystemStatus::Up => f.write_str("UP"),
            SubsystemStatus::Down => f.write_str("DOWN"),
        }
    }
}

/// Reasons a subsystem is reported `DOWN`.
#[derive(Debug, Clone, Error)]
pub enum CheckError {
    /// The resource pool has no spare capacity; the probe was skipped.
    #[error("currently pool is busy")]
    PoolNotReady,

    /// The run deadline elapsed before the checker returned.
    #[error("check deadline exceeded")]
    DeadlineExceeded,

    /// The checker panicked.
    #[error("checker panicked: {0}")]
    Panicked(String),

    /// The checker task ended without producing a result.
    #[error("checker aborted: {0}")]
    Aborted(String),

    /// The underlying probe (ping, dial, query) failed.
    #[error("{0}")]
    Probe(Arc<dyn std::error::Error + Send + Sync>),
}

impl CheckError {
    /// Wrap a driver or I/O error as a probe failure.
    pub fn probe<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CheckError::Probe(Arc::new(err))
    }

    /// Build a probe failure from a plain message.
    pub fn message(msg: impl Into<String>) -> Self {
        let msg: String = msg.into();
        let boxed: Box<dyn std::error::Error + Send + Sync> = msg.into();
        CheckError::Probe(Arc::from(boxed))
    }

    pub fn is_pool_not_ready(&self) -> bool {
        matches!(self, CheckError::PoolNotReady)
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, CheckError::DeadlineExceeded)
    }

    /// Short label used for the `reason` metric dimension.
    pub fn reason(&self) -> &'static str {
        match self {
            CheckError::PoolNotReady => "pool_not_ready",
            CheckError::DeadlineExceeded => "deadline_exceeded",
            CheckError::Panicked(_) => "panicked",
            CheckError::Aborted(_) => "aborted",
            CheckError::Probe(_) => "probe",
        }
    }
}

impl From<std::io::Error> for CheckError {
    fn from(err: std::io::Error) -> Self {
        CheckError::probe(err)
    }
}

/// Outcome of one checker invocation.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_error"
    )]
    pub error: Option<CheckError>,
    pub status: SubsystemStatus,
}

impl CheckResult {
    pub fn up() -> Self {
        Self {
            error: None,
            status: SubsystemStatus::Up,
        }
    }

    pub fn down(error: CheckError) -> Self {
        Self {
            error: Some(error),
            status: SubsystemStatus::Down,
        }
    }

    /// Map a probe outcome onto a result: `Ok` is `UP`, `Err(e)` is `DOWN` with `e`.
    pub fn from_outcome(outcome: Result<(), CheckError>) -> Self {
        match outcome {
            Ok(()) => Self::up(),
            Err(err) => Self::down(err),
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == SubsystemStatus::Up
    }
}

impl From<Result<(), CheckError>> for CheckResult {
    fn from(outcome: Result<(), CheckError>) -> Self {
        Self::from_outcome(outcome)
    }
}

fn serialize_error<S>(error: &Option<CheckError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match error {
        Some(err) => serializer.serialize_str(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_up_serializes_without_error() {
        let json = serde_json::to_value(CheckResult::up()).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "UP" }));
    }

    #[test]
    fn test_down_carries_error_message() {
        let result = CheckResult::down(CheckError::PoolNotReady);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "error": "currently pool is busy", "status": "DOWN" })
        );
        assert!(!result.is_up());
    }

    #[test]
    fn test_from_outcome() {
        assert!(CheckResult::from_outcome(Ok(())).is_up());

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let result: CheckResult = Err(CheckError::from(io)).into();
        assert_eq!(result.status, SubsystemStatus::Down);
        assert_eq!(result.error.unwrap().to_string(), "refused");
    }

    #[test]
    fn test_error_reasons() {
        assert_eq!(CheckError::DeadlineExceeded.reason(), "deadline_exceeded");
        assert!(CheckError::DeadlineExceeded.is_deadline_exceeded());
        assert!(CheckError::PoolNotReady.is_pool_not_ready());
        assert_eq!(CheckError::message("boom").to_string(), "boom");
    }
}
