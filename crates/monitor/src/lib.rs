//! Core monitoring pipeline for Repsignal.
//!
//! This crate holds the alert model and store, the scraping source
//! registry, the monitoring state tracker, the periodic scheduler, the
//! backend health poller, the ingestion client, and the scan pipeline
//! that wires them into the notification dispatcher.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod alerts;
pub mod health;
pub mod ingest;
pub mod pipeline;
pub mod scheduler;
pub mod sources;
pub mod tracker;

pub use alerts::{
    filter_alerts, AlertSeverity, AlertStatus, AlertStore, ContentAlert, InvalidTransition,
    Platform, Selector, Sentiment, StoreError,
};
pub use health::{HealthConfig, HealthMap, HealthPoller, ServiceStatus, DEFAULT_HEALTH_PERIOD};
pub use ingest::{IngestClient, IngestConfig};
pub use pipeline::{NoopScanner, Pipeline, ScanCycleResult, SourceScanner};
pub use scheduler::Ticker;
pub use sources::{ScrapingSource, SourceConfig, SourceKind, SourceRegistry};
pub use tracker::{MonitoringStatus, MonitoringTracker, ScanFailurePolicy, ScanState};
