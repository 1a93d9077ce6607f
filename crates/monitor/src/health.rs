//! Backend service health polling.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::scheduler::Ticker;

/// Default period between health sweeps.
pub const DEFAULT_HEALTH_PERIOD: Duration = Duration::from_secs(30);

/// Reported state of one backend service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Responding normally.
    Active,
    /// Responding with an error status.
    Error,
    /// Unreachable or not yet probed.
    Pending,
}

/// Health poller configuration.
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Base URL the per-service health endpoints hang off.
    pub base_url: String,
    /// Services to probe each sweep.
    pub services: Vec<String>,
    /// Services reported `Active` without probing. These run in the
    /// same process group as the poller, so reachability is implied.
    pub pinned: Vec<String>,
    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            services: vec![
                "threat-classifier".to_string(),
                "entity-memory".to_string(),
            ],
            pinned: vec!["alert-ingest".to_string()],
            timeout_ms: 5000,
        }
    }
}

/// Map of service name to current status.
pub type HealthMap = HashMap<String, ServiceStatus>;

/// Sweeps backend services and publishes the resulting health map.
pub struct HealthPoller {
    client: Client,
    config: HealthConfig,
}

impl HealthPoller {
    #[must_use]
    pub fn new(config: HealthConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Probe every configured service once, sequentially.
    ///
    /// Pinned services are reported `Active` without a request.
    pub async fn probe_all(&self) -> HealthMap {
        let mut map = HealthMap::new();

        for service in &self.config.pinned {
            map.insert(service.clone(), ServiceStatus::Active);
        }

        for service in &self.config.services {
            let status = self.probe(service).await;
            debug!(service = %service, ?status, "Probed service");
            map.insert(service.clone(), status);
        }

        map
    }

    async fn probe(&self, service: &str) -> ServiceStatus {
        let url = format!("{}/{service}", self.config.base_url);
        let result = self
            .client
            .post(&url)
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .json(&serde_json::json!({ "action": "health_check" }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => ServiceStatus::Active,
            Ok(response) => {
                warn!(service = %service, status = %response.status(), "Service unhealthy");
                ServiceStatus::Error
            }
            Err(e) => {
                warn!(service = %service, error = %e, "Service unreachable");
                ServiceStatus::Pending
            }
        }
    }

    /// Sweep on the ticker's schedule, publishing each complete map.
    ///
    /// The map is replaced wholesale per sweep so watchers never see a
    /// half-updated mix of old and new statuses.
    pub async fn run(&self, ticker: &Ticker, sender: &watch::Sender<HealthMap>) {
        ticker
            .run(|| async {
                let map = self.probe_all().await;
                sender.send_replace(map);
            })
            .await;
    }
}
