//! Probe endpoints served over a real socket.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use healthcheck::health::{CheckContext, CheckError, CheckResult, Health};
use healthcheck::lifecycle::Shutdown;

mod common;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_probe_endpoints_follow_heartbeat() {
    let health = Arc::new(Health::new(common::fast_options()));
    health.add_live_checker("process", |_ctx: CheckContext| async { CheckResult::up() });
    health.add_ready_checker("database", |_ctx: CheckContext| async {
        CheckResult::down(CheckError::message("connection refused"))
    });

    let shutdown = Shutdown::new();
    let addr = common::start_health_server(health.clone(), &shutdown).await;
    let client = client();

    // Before the first heartbeat nothing has been verified yet.
    let res = client.get(format!("http://{}/live", addr)).send().await.unwrap();
    assert_eq!(res.status(), 503);

    let beating = health.clone();
    let rx = shutdown.subscribe();
    tokio::spawn(async move { beating.heartbeat(rx).await });
    assert!(common::wait_until(Duration::from_secs(2), || health.liveness().is_ok()).await);

    let res = client.get(format!("http://{}/live", addr)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()["cache-control"],
        "no-cache, no-store, no-transform, must-revalidate, private, max-age=0"
    );
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["process"]["status"], "UP");

    let res = client.get(format!("http://{}/ready", addr)).send().await.unwrap();
    assert_eq!(res.status(), 503);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["database"]["status"], "DOWN");
    assert_eq!(body["database"]["error"], "connection refused");

    shutdown.trigger();
}

#[tokio::test]
async fn test_kube_probe_gets_status_only() {
    let health = Arc::new(Health::new(common::fast_options()));
    health.add_live_checker("process", |_ctx: CheckContext| async { CheckResult::up() });
    health.run_checks(&CheckContext::background()).await;

    let shutdown = Shutdown::new();
    let addr = common::start_health_server(health, &shutdown).await;

    let res = client()
        .get(format!("http://{}/live", addr))
        .header("User-Agent", "kube-probe/1.29")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.text().await.unwrap().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_server_stops_on_shutdown() {
    let health = Arc::new(Health::default());
    let shutdown = Shutdown::new();
    let addr = common::start_health_server(health, &shutdown).await;
    let client = client();

    assert!(client.get(format!("http://{}/live", addr)).send().await.is_ok());

    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let res = client
        .get(format!("http://{}/live", addr))
        .timeout(Duration::from_millis(500))
        .send()
        .await;
    assert!(res.is_err());
}
