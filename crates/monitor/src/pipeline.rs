//! Scan pipeline for one monitored entity.
//!
//! Owns the alert store, the source registry, and the monitoring
//! tracker, and wires scan results into the notification dispatcher.
//! All locks are plain `std::sync::Mutex` held only for short
//! non-async sections; network work happens on cloned data.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use intel::{ThreatAnalysis, ThreatClassifier};
use notify::{NotifyEvent, Notifier, Severity};
use tracing::{info, warn};
use uuid::Uuid;

use crate::alerts::{
    AlertSeverity, AlertStatus, AlertStore, ContentAlert, Platform, Selector, Sentiment,
    StoreError,
};
use crate::scheduler::Ticker;
use crate::sources::{ScrapingSource, SourceRegistry};
use crate::tracker::{MonitoringStatus, MonitoringTracker};

/// Fetches raw alerts from a single source.
#[async_trait]
pub trait SourceScanner: Send + Sync {
    async fn scan(
        &self,
        source: &ScrapingSource,
        entity: &str,
    ) -> anyhow::Result<Vec<ContentAlert>>;
}

/// Scanner that always returns nothing. Stands in until a real
/// scraping backend is wired up.
pub struct NoopScanner;

#[async_trait]
impl SourceScanner for NoopScanner {
    async fn scan(
        &self,
        _source: &ScrapingSource,
        _entity: &str,
    ) -> anyhow::Result<Vec<ContentAlert>> {
        Ok(Vec::new())
    }
}

/// Outcome of one scan cycle.
#[derive(Debug, Clone, Default)]
pub struct ScanCycleResult {
    /// Alerts fetched across all sources.
    pub fetched: usize,
    /// Alerts actually stored (unseen ids).
    pub stored: usize,
    /// Alert notifications dispatched.
    pub notified: usize,
    /// Per-source scan errors.
    pub errors: Vec<String>,
}

/// The monitoring pipeline for a single entity.
pub struct Pipeline {
    entity: String,
    store: Mutex<AlertStore>,
    tracker: Mutex<MonitoringTracker>,
    sources: Mutex<SourceRegistry>,
    scanner: Arc<dyn SourceScanner>,
    notifier: Arc<Notifier>,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        entity: impl Into<String>,
        tracker: MonitoringTracker,
        sources: SourceRegistry,
        scanner: Arc<dyn SourceScanner>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            entity: entity.into(),
            store: Mutex::new(AlertStore::new()),
            tracker: Mutex::new(tracker),
            sources: Mutex::new(sources),
            scanner,
            notifier,
        }
    }

    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Mark monitoring active. The caller drives actual cycles via
    /// [`Pipeline::run`] or [`Pipeline::scan_cycle`].
    pub fn start(&self) {
        let count = self
            .sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .enabled_count();
        self.tracker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .start(count);
        info!(entity = %self.entity, sources = count, "Monitoring started");
    }

    /// Mark monitoring stopped. Scan stamps survive.
    pub fn stop(&self) {
        self.tracker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stop();
        info!(entity = %self.entity, "Monitoring stopped");
    }

    #[must_use]
    pub fn status(&self) -> MonitoringStatus {
        self.tracker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .status()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.tracker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_active()
    }

    /// Cloned copy of every stored alert.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ContentAlert> {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Filtered view of stored alerts.
    #[must_use]
    pub fn filtered(
        &self,
        platform: &Selector<Platform>,
        sentiment: &Selector<Sentiment>,
    ) -> Vec<ContentAlert> {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .filtered(platform, sentiment)
    }

    /// Move a stored alert to a new workflow status.
    pub fn update_alert_status(&self, id: &str, to: AlertStatus) -> Result<(), StoreError> {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .update_status(id, to)
    }

    /// Register a source with the running pipeline.
    pub fn add_source(&self, source: ScrapingSource) -> Uuid {
        self.sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .add(source)
    }

    /// Enable or disable a source.
    pub fn set_source_enabled(&self, id: Uuid, enabled: bool) -> bool {
        self.sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_enabled(id, enabled)
    }

    /// Run one scan cycle: fetch from every enabled source, store
    /// unseen alerts, and notify for each stored alert.
    pub async fn scan_cycle(&self) -> ScanCycleResult {
        let enabled = self
            .sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .enabled();

        let mut result = ScanCycleResult::default();
        let mut batch = Vec::new();

        for source in &enabled {
            match self.scanner.scan(source, &self.entity).await {
                Ok(alerts) => {
                    result.fetched += alerts.len();
                    batch.extend(alerts);
                    self.sources
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .mark_scanned(source.id, Utc::now());
                }
                Err(e) => {
                    warn!(source = %source.name, error = %e, "Source scan failed");
                    result.errors.push(format!("{}: {e}", source.name));
                }
            }
        }

        let new_alerts: Vec<ContentAlert> = {
            let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
            let stored_ids = store.merge_new(batch);
            stored_ids
                .iter()
                .filter_map(|id| store.get(id).cloned())
                .collect()
        };
        result.stored = new_alerts.len();

        // Dispatch outside every lock; listener callbacks may re-enter
        // the pipeline.
        for alert in &new_alerts {
            let delivered = self.notifier.dispatch(&NotifyEvent::AlertDetected {
                alert_id: alert.id.clone(),
                entity: self.entity.clone(),
                platform: alert.platform.to_string(),
                severity: notify_severity(alert.severity),
                preview: alert.preview(),
                timestamp: Utc::now(),
            });
            if delivered {
                result.notified += 1;
            }
        }

        if result.fetched > 0 {
            self.notifier.dispatch(&NotifyEvent::ScanCompleted {
                entity: self.entity.clone(),
                fetched: result.fetched,
                stored: result.stored,
                timestamp: Utc::now(),
            });
        }

        let all_failed = !enabled.is_empty() && result.errors.len() == enabled.len();
        {
            let mut tracker = self.tracker.lock().unwrap_or_else(PoisonError::into_inner);
            if all_failed {
                tracker.record_scan_failure();
            } else {
                tracker.complete_scan(enabled.len());
            }
        }

        info!(
            entity = %self.entity,
            fetched = result.fetched,
            stored = result.stored,
            notified = result.notified,
            errors = result.errors.len(),
            "Scan cycle finished"
        );
        result
    }

    /// Classify a stored alert through the threat gateway.
    ///
    /// Returns `None` when the alert is unknown or classification
    /// fails; failures are logged inside the gateway, never raised.
    pub async fn classify(
        &self,
        alert_id: &str,
        classifier: &ThreatClassifier,
        use_memory_context: bool,
    ) -> Option<ThreatAnalysis> {
        let alert = {
            let store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
            store.get(alert_id).cloned()
        }?;

        classifier
            .try_analyze(
                &alert.content,
                alert.platform.as_str(),
                &self.entity,
                use_memory_context,
            )
            .await
    }

    /// Scan on the ticker's schedule until cancelled, skipping cycles
    /// while monitoring is stopped.
    pub async fn run(&self, ticker: &Ticker) {
        ticker
            .run(|| async {
                if self.is_active() {
                    self.scan_cycle().await;
                }
            })
            .await;
    }
}

fn notify_severity(severity: Option<AlertSeverity>) -> Severity {
    match severity {
        None | Some(AlertSeverity::Low) => Severity::Info,
        Some(AlertSeverity::Medium) => Severity::Warning,
        Some(AlertSeverity::High | AlertSeverity::Critical) => Severity::Critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SourceConfig;
    use crate::tracker::ScanFailurePolicy;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticScanner {
        alerts: Vec<ContentAlert>,
    }

    #[async_trait]
    impl SourceScanner for StaticScanner {
        async fn scan(
            &self,
            _source: &ScrapingSource,
            _entity: &str,
        ) -> anyhow::Result<Vec<ContentAlert>> {
            Ok(self.alerts.clone())
        }
    }

    struct FailingScanner;

    #[async_trait]
    impl SourceScanner for FailingScanner {
        async fn scan(
            &self,
            _source: &ScrapingSource,
            _entity: &str,
        ) -> anyhow::Result<Vec<ContentAlert>> {
            anyhow::bail!("connection reset")
        }
    }

    fn registry_with_one_source() -> SourceRegistry {
        let mut registry = SourceRegistry::new();
        registry.add(ScrapingSource::new(
            "search",
            SourceConfig::Google {
                query: "\"Acme Corp\"".to_string(),
                region: None,
            },
        ));
        registry
    }

    fn pipeline(scanner: Arc<dyn SourceScanner>, notifier: Arc<Notifier>) -> Pipeline {
        Pipeline::new(
            "Acme Corp",
            MonitoringTracker::new(),
            registry_with_one_source(),
            scanner,
            notifier,
        )
    }

    #[tokio::test]
    async fn test_scan_cycle_stores_and_notifies() {
        let scanner = Arc::new(StaticScanner {
            alerts: vec![
                ContentAlert::new("a1", Platform::Reddit, "thread")
                    .with_severity(AlertSeverity::High),
                ContentAlert::new("a2", Platform::News, "article"),
            ],
        });
        let notifier = Arc::new(Notifier::new());
        let alert_events = Arc::new(AtomicUsize::new(0));
        {
            let alert_events = Arc::clone(&alert_events);
            notifier.register(Arc::new(move |event: &NotifyEvent| {
                if event.alert_id().is_some() {
                    alert_events.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }

        let pipeline = pipeline(scanner, notifier);
        pipeline.start();

        let result = pipeline.scan_cycle().await;
        assert_eq!(result.fetched, 2);
        assert_eq!(result.stored, 2);
        assert_eq!(result.notified, 2);
        assert!(result.errors.is_empty());
        assert_eq!(alert_events.load(Ordering::SeqCst), 2);
        assert_eq!(pipeline.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn test_second_cycle_does_not_renotify() {
        let scanner = Arc::new(StaticScanner {
            alerts: vec![ContentAlert::new("a1", Platform::Reddit, "thread")],
        });
        let pipeline = pipeline(scanner, Arc::new(Notifier::new()));
        pipeline.start();

        let first = pipeline.scan_cycle().await;
        assert_eq!(first.stored, 1);

        let second = pipeline.scan_cycle().await;
        assert_eq!(second.fetched, 1);
        assert_eq!(second.stored, 0);
        assert_eq!(second.notified, 0);
        assert_eq!(pipeline.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_scan_cycle_stamps_tracker() {
        let scanner = Arc::new(StaticScanner { alerts: vec![] });
        let pipeline = pipeline(scanner, Arc::new(Notifier::new()));
        pipeline.start();
        let started = pipeline.status().last_run.unwrap();

        pipeline.scan_cycle().await;
        let status = pipeline.status();
        assert!(status.is_active);
        assert!(status.last_run.unwrap() >= started);
        assert_eq!(status.source_count, 1);
    }

    #[tokio::test]
    async fn test_all_sources_failing_stays_active_by_default() {
        let pipeline = pipeline(Arc::new(FailingScanner), Arc::new(Notifier::new()));
        pipeline.start();

        let result = pipeline.scan_cycle().await;
        assert_eq!(result.errors.len(), 1);
        assert!(pipeline.is_active());
    }

    #[tokio::test]
    async fn test_all_sources_failing_deactivates_under_policy() {
        let pipeline = Pipeline::new(
            "Acme Corp",
            MonitoringTracker::new().with_failure_policy(ScanFailurePolicy::Deactivate),
            registry_with_one_source(),
            Arc::new(FailingScanner),
            Arc::new(Notifier::new()),
        );
        pipeline.start();

        pipeline.scan_cycle().await;
        assert!(!pipeline.is_active());
    }

    #[tokio::test]
    async fn test_status_updates_flow_through_pipeline() {
        let scanner = Arc::new(StaticScanner {
            alerts: vec![ContentAlert::new("a1", Platform::Reddit, "thread")],
        });
        let pipeline = pipeline(scanner, Arc::new(Notifier::new()));
        pipeline.start();
        pipeline.scan_cycle().await;

        pipeline
            .update_alert_status("a1", AlertStatus::Acknowledged)
            .unwrap();
        assert_eq!(
            pipeline.snapshot()[0].status,
            AlertStatus::Acknowledged
        );

        let err = pipeline
            .update_alert_status("ghost", AlertStatus::Resolved)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_run_skips_cycles_while_stopped() {
        let scanner = Arc::new(StaticScanner {
            alerts: vec![ContentAlert::new("a1", Platform::Reddit, "thread")],
        });
        let pipeline = Arc::new(pipeline(scanner, Arc::new(Notifier::new())));
        // Never started: the loop ticks but no cycle runs.
        let ticker = Ticker::new(std::time::Duration::from_secs(3600));
        let token = ticker.cancellation_token();

        tokio::join!(pipeline.run(&ticker), async {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            token.cancel();
        });

        assert!(pipeline.snapshot().is_empty());
    }
}
