//! Probe response rendering.
//!
//! # Responsibilities
//! - Map a group verdict to 200 / 503
//! - Render per-subsystem details as JSON
//! - Keep responses uncacheable

use std::any::Any;

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};

use crate::health::CheckGroup;

/// User-Agent prefix of the kubelet's HTTP prober.
pub const KUBE_PROBE_AGENT: &str = "kube-probe";

/// Build the response for a probe of `group`.
///
/// The kubelet only looks at the status code, so details are omitted for
/// its requests.
pub fn probe_response(group: &CheckGroup, headers: &HeaderMap) -> Response {
    let status = if group.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    if is_kube_probe(headers) {
        return status.into_response();
    }

    (status, Json(group.details())).into_response()
}

pub fn is_kube_probe(headers: &HeaderMap) -> bool {
    headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|agent| agent.starts_with(KUBE_PROBE_AGENT))
}

/// Drop conditional request headers so a probe can never get a 304.
pub async fn strip_conditional_headers(mut request: Request<Body>, next: Next) -> Response {
    let conditional = [
        header::ETAG,
        header::IF_MODIFIED_SINCE,
        header::IF_MATCH,
        header::IF_NONE_MATCH,
        header::IF_RANGE,
        header::IF_UNMODIFIED_SINCE,
    ];
    let headers = request.headers_mut();
    for name in conditional {
        headers.remove(name);
    }
    next.run(request).await
}

/// Response for a handler that panicked.
pub fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("Probe handler panicked");
    StatusCode::SERVICE_UNAVAILABLE.into_response()
}
