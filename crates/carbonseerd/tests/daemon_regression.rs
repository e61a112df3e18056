//! Daemon regression tests.
//!
//! Drives the assembled daemon with in-memory latency and replica fakes:
//! ingestion feeds the scorer, cycles patch the workload, and both
//! servers start and drain on shutdown.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use tokio::sync::watch;
use tower::ServiceExt;

use carbonseer_autoscale::{LatencyError, LatencySource, ReplicaTarget, ScaleDecision, TargetError};
use carbonseer_carbon::CarbonResolver;
use carbonseer_core::ControllerConfig;
use carbonseerd::Daemon;

struct FixedLatency(f64);

#[async_trait]
impl LatencySource for FixedLatency {
    async fn p95_ms(&self) -> Result<f64, LatencyError> {
        Ok(self.0)
    }
}

struct MemoryDeployment {
    replicas: Mutex<u32>,
    patches: Mutex<Vec<u32>>,
}

impl MemoryDeployment {
    fn new(replicas: u32) -> Arc<Self> {
        Arc::new(Self {
            replicas: Mutex::new(replicas),
            patches: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ReplicaTarget for MemoryDeployment {
    async fn current_replicas(&self) -> Result<u32, TargetError> {
        Ok(*self.replicas.lock().unwrap())
    }

    async fn set_replicas(&self, replicas: u32) -> Result<(), TargetError> {
        self.patches.lock().unwrap().push(replicas);
        *self.replicas.lock().unwrap() = replicas;
        Ok(())
    }
}

fn test_config() -> ControllerConfig {
    ControllerConfig::from_toml_str(
        r#"
region = "eu"
min_replicas = 1
max_replicas = 5
slo_p95_ms = 200
interval_s = 1
default_carbon = 300
metrics_port = 0

[http_api]
host = "127.0.0.1"
port = 0

[prometheus]
url = "http://prometheus:9090"

[deployment]
namespace = "default"
name = "checkout"

[carbon_map]
eu = 250
"#,
    )
    .unwrap()
}

fn daemon(latency_ms: f64, target: Arc<MemoryDeployment>) -> Daemon {
    Daemon::with_collaborators(test_config(), Arc::new(FixedLatency(latency_ms)), target)
        .unwrap()
}

fn post_carbon(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/update_carbon")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn pushed_carbon_is_resolved_for_region() {
    let daemon = daemon(150.0, MemoryDeployment::new(3));

    let resp = daemon
        .ingest_router()
        .oneshot(post_carbon(r#"{"region":"eu","carbon":50}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let config = test_config();
    let resolver = CarbonResolver::from_config(&config, daemon.cache().clone()).unwrap();
    assert_eq!(resolver.resolve("eu").await, 50.0);
}

#[tokio::test]
async fn pushed_carbon_reaches_scores_and_gauges() {
    let daemon = daemon(150.0, MemoryDeployment::new(3));

    let before = daemon.run_once().await;
    assert_eq!(before.scores.carbon_value, 250.0);

    daemon
        .ingest_router()
        .oneshot(post_carbon(r#"{"region":"eu","carbon":"50"}"#))
        .await
        .unwrap();

    let after = daemon.run_once().await;
    assert_eq!(after.scores.carbon_value, 50.0);
    assert!(after.scores.carbon_score > before.scores.carbon_score);
    assert_eq!(daemon.metrics().snapshot().carbon_intensity, 50.0);
}

#[tokio::test]
async fn invalid_push_is_rejected_and_ignored() {
    let daemon = daemon(150.0, MemoryDeployment::new(3));

    let resp = daemon
        .ingest_router()
        .oneshot(post_carbon(r#"{"region":"eu","carbon":"dirty"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = daemon
        .ingest_router()
        .oneshot(post_carbon(r#"{"region":"eu"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = daemon
        .ingest_router()
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    assert!(daemon.cache().is_empty().await);
    assert_eq!(daemon.run_once().await.scores.carbon_value, 250.0);
}

#[tokio::test]
async fn cycle_patches_workload_and_exposes_metrics() {
    let target = MemoryDeployment::new(3);
    let daemon = daemon(250.0, target.clone());

    let report = daemon.run_once().await;
    assert_eq!(report.decision, ScaleDecision::ScaleTo(4));
    assert_eq!(*target.patches.lock().unwrap(), vec![4]);

    let resp = daemon
        .metrics_router()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    assert!(text.contains("# TYPE carb_scale_events_total counter"));
    assert!(text.contains("carb_scale_events_total{deployment=\"default/checkout\"} 1"));
    assert!(text.contains("carb_p95_latency_ms{deployment=\"default/checkout\"} 250"));
    assert!(text.contains("carb_current_gco2_per_kwh{deployment=\"default/checkout\"} 250"));
}

#[tokio::test]
async fn run_serves_until_shutdown() {
    let target = MemoryDeployment::new(3);
    let daemon = daemon(150.0, target.clone());
    let metrics = daemon.metrics().clone();

    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(daemon.run(rx));

    tokio::time::sleep(Duration::from_millis(200)).await;
    tx.send(true).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("daemon did not stop")
        .unwrap();
    assert!(result.is_ok(), "{result:?}");
    assert!(metrics.snapshot().cycles >= 1);
    assert!(target.patches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn run_without_ingestion_server() {
    let mut config = test_config();
    config.http_api.enabled = false;
    let daemon = Daemon::with_collaborators(
        config,
        Arc::new(FixedLatency(150.0)),
        MemoryDeployment::new(2),
    )
    .unwrap();

    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(daemon.run(rx));
    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(true).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("daemon did not stop")
        .unwrap();
    assert!(result.is_ok(), "{result:?}");
}
