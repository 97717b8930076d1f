//! HTTP server exposing the probe endpoints.
//!
//! # Responsibilities
//! - Create the Axum Router with liveness, readiness and metrics routes
//! - Wire up middleware (timeout, no-cache, panic guard, tracing)
//! - Serve until shutdown is signalled

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue},
    middleware,
    response::Response,
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer, timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::health::Health;
use crate::http::response::{panic_response, probe_response, strip_conditional_headers};

const NO_CACHE: &str = "no-cache, no-store, no-transform, must-revalidate, private, max-age=0";
const EPOCH: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub health: Arc<Health>,
}

/// Prometheus exposition mounted next to the probes.
#[derive(Clone)]
pub struct MetricsEndpoint {
    pub path: String,
    pub handle: PrometheusHandle,
}

/// HTTP server for the probe endpoints.
pub struct HealthServer {
    router: Router,
}

impl HealthServer {
    pub fn new(
        health: Arc<Health>,
        config: &ServerConfig,
        metrics: Option<MetricsEndpoint>,
    ) -> Self {
        let router = Self::build_router(AppState { health }, config, metrics);
        Self { router }
    }

    /// The assembled router, for embedding into a larger application.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    #[allow(deprecated)]
    fn build_router(
        state: AppState,
        config: &ServerConfig,
        metrics: Option<MetricsEndpoint>,
    ) -> Router {
        let mut router = Router::new()
            .route(&config.live_path, get(live_handler))
            .route(&config.ready_path, get(ready_handler));

        if let Some(MetricsEndpoint { path, handle }) = metrics {
            router = router.route(
                &path,
                get(move || {
                    let handle = handle.clone();
                    async move { handle.render() }
                }),
            );
        }

        let layers = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(TimeoutLayer::new(Duration::from_millis(
                config.request_timeout_ms,
            )))
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static(NO_CACHE),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::EXPIRES,
                HeaderValue::from_static(EPOCH),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::PRAGMA,
                HeaderValue::from_static("no-cache"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                HeaderName::from_static("x-accel-expires"),
                HeaderValue::from_static("0"),
            ))
            .layer(middleware::from_fn(strip_conditional_headers));

        router.with_state(state).layer(layers)
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Health server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Health server received shutdown signal");
            })
            .await?;

        tracing::info!("Health server stopped");
        Ok(())
    }
}

async fn live_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    probe_response(state.health.liveness(), &headers)
}

async fn ready_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    probe_response(state.health.readiness(), &headers)
}
