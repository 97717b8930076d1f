//! Health probe daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                   healthd                    │
//!                        │                                              │
//!   kubelet / LB probe   │  ┌─────────┐  is_ok()   ┌────────────────┐   │
//!   ─────────────────────┼─▶│  http   │───────────▶│  CheckGroup    │   │
//!     GET /live /ready   │  │ server  │  details() │ live │ ready   │   │
//!                        │  └─────────┘            └───────▲────────┘   │
//!                        │                                 │ check()    │
//!                        │                         ┌───────┴────────┐   │
//!                        │                         │   heartbeat    │   │
//!                        │                         └───────┬────────┘   │
//!                        │                                 │ fan out    │
//!                        │              ┌──────────────────┼─────────┐  │
//!                        │              ▼                  ▼         ▼  │
//!                        │         tcp probe          tcp probe    ...  │──▶ dependencies
//!                        │     (backoff retries)  (backoff retries)     │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use healthcheck::config::{load_config, HealthConfig, ProbeKind};
use healthcheck::health::{Health, HealthOptions};
use healthcheck::http::{HealthServer, MetricsEndpoint};
use healthcheck::lifecycle::{wait_for_signal, Shutdown};
use healthcheck::observability::{logging, metrics};
use healthcheck::probes::tcp_checker;

#[derive(Parser)]
#[command(name = "healthd")]
#[command(about = "Liveness and readiness probe daemon", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override server.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HealthConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("healthd v{} starting", env!("CARGO_PKG_VERSION"));

    let health = Arc::new(Health::new(HealthOptions::from(&config)));
    let base_interval = Duration::from_millis(config.retry.base_interval_ms);
    for probe in &config.probes {
        let checker = tcp_checker(probe.address.clone(), base_interval);
        match probe.kind {
            ProbeKind::Live => health.add_live_checker(probe.name.clone(), checker),
            ProbeKind::Ready => health.add_ready_checker(probe.name.clone(), checker),
        }
        tracing::info!(name = %probe.name, address = %probe.address, kind = ?probe.kind, "Probe registered");
    }

    let metrics_endpoint = if config.observability.metrics_enabled {
        Some(MetricsEndpoint {
            path: config.observability.metrics_path.clone(),
            handle: metrics::init_metrics()?,
        })
    } else {
        None
    };

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        live = %config.server.live_path,
        ready = %config.server.ready_path,
        "Listening for probes"
    );

    let shutdown = Shutdown::new();

    let beating = health.clone();
    let heartbeat_rx = shutdown.subscribe();
    let heartbeat = tokio::spawn(async move { beating.heartbeat(heartbeat_rx).await });

    let server = HealthServer::new(health, &config.server, metrics_endpoint);
    let server_rx = shutdown.subscribe();
    let serving = tokio::spawn(async move { server.run(listener, server_rx).await });

    wait_for_signal().await;
    tracing::info!(
        listeners = shutdown.receiver_count(),
        "Shutdown signal received, stopping heartbeat and server"
    );
    shutdown.trigger();

    heartbeat.await?;
    serving.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
