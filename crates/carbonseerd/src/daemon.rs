//! Daemon wiring: shared cache, controller, and the two HTTP servers.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use carbonseer_autoscale::{
    Controller, CycleReport, KubeDeployment, LatencySource, PrometheusLatency, ReplicaTarget,
    Scorer,
};
use carbonseer_carbon::{CarbonCache, CarbonResolver};
use carbonseer_core::ControllerConfig;
use carbonseer_metrics::ControllerMetrics;

/// A fully assembled controller process.
pub struct Daemon {
    config: ControllerConfig,
    cache: CarbonCache,
    metrics: ControllerMetrics,
    controller: Arc<Controller>,
}

impl Daemon {
    /// Assemble with the Prometheus and Kubernetes clients from config.
    pub fn from_config(config: ControllerConfig) -> anyhow::Result<Self> {
        let latency = PrometheusLatency::from_config(&config.prometheus)
            .context("building Prometheus client")?;
        let target = KubeDeployment::from_config(&config.kubernetes, config.deployment.clone())
            .context("building orchestrator client")?;
        Self::with_collaborators(config, Arc::new(latency), Arc::new(target))
    }

    /// Assemble around caller-provided latency source and replica target.
    pub fn with_collaborators(
        config: ControllerConfig,
        latency: Arc<dyn LatencySource>,
        target: Arc<dyn ReplicaTarget>,
    ) -> anyhow::Result<Self> {
        let cache = CarbonCache::new();
        let resolver = CarbonResolver::from_config(&config, cache.clone())
            .context("building carbon providers")?;
        let scorer = Scorer::from_config(&config, resolver);
        let metrics = ControllerMetrics::new(config.deployment.to_string());
        let controller = Controller::new(&config, scorer, latency, target, metrics.clone());

        Ok(Self {
            config,
            cache,
            metrics,
            controller: Arc::new(controller),
        })
    }

    pub fn cache(&self) -> &CarbonCache {
        &self.cache
    }

    pub fn metrics(&self) -> &ControllerMetrics {
        &self.metrics
    }

    pub fn ingest_router(&self) -> Router {
        carbonseer_api::ingest_router(self.cache.clone())
    }

    pub fn metrics_router(&self) -> Router {
        carbonseer_api::metrics_router(self.metrics.clone())
    }

    /// Run a single control cycle without starting any server.
    pub async fn run_once(&self) -> CycleReport {
        self.controller.run_cycle().await
    }

    /// Bind both servers, then run the control loop until `shutdown`
    /// flips. Servers drain on the same signal.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        // ── Metrics server ─────────────────────────────────────────
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], self.config.metrics_port));
        let metrics_listener = TcpListener::bind(metrics_addr)
            .await
            .with_context(|| format!("binding metrics listener on {metrics_addr}"))?;
        info!(addr = %metrics_listener.local_addr()?, "metrics server starting");
        let metrics_handle = tokio::spawn(serve(
            metrics_listener,
            self.metrics_router(),
            shutdown.clone(),
        ));

        // ── Ingestion server ───────────────────────────────────────
        let ingest_handle = if self.config.http_api.enabled {
            let api = &self.config.http_api;
            let listener = TcpListener::bind((api.host.as_str(), api.port))
                .await
                .with_context(|| format!("binding ingestion listener on {}:{}", api.host, api.port))?;
            info!(addr = %listener.local_addr()?, "ingestion server starting");
            Some(tokio::spawn(serve(
                listener,
                self.ingest_router(),
                shutdown.clone(),
            )))
        } else {
            info!("ingestion server disabled");
            None
        };

        // ── Control loop ───────────────────────────────────────────
        self.controller.run(shutdown).await;

        metrics_handle.await??;
        if let Some(handle) = ingest_handle {
            handle.await??;
        }
        info!("carbonseerd stopped");
        Ok(())
    }
}

/// Serve `router` until `shutdown` flips to true.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await
}
