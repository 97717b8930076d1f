//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use healthcheck::config::ServerConfig;
use healthcheck::health::{Health, HealthOptions};
use healthcheck::http::HealthServer;
use healthcheck::lifecycle::Shutdown;

/// Start a dependency that accepts and immediately drops connections.
#[allow(dead_code)]
pub async fn start_tcp_dependency() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => drop(socket),
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing listens on.
#[allow(dead_code)]
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Options with short timeouts suitable for tests.
#[allow(dead_code)]
pub fn fast_options() -> HealthOptions {
    HealthOptions {
        liveness_timeout: Duration::from_millis(300),
        readiness_timeout: Duration::from_millis(300),
        check_period: Duration::from_millis(100),
    }
}

/// Serve `health` on an ephemeral port and return its address.
#[allow(dead_code)]
pub async fn start_health_server(health: Arc<Health>, shutdown: &Shutdown) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HealthServer::new(health, &ServerConfig::default(), None);
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    addr
}

/// Poll `condition` until it holds or `limit` elapses.
#[allow(dead_code)]
pub async fn wait_until<F: Fn() -> bool>(limit: Duration, condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
