//! Monitoring state machine.
//!
//! Tracks whether scanning is active and when the last and next scans
//! happen. Scan stamps survive a stop so operators can still see when
//! the pipeline last did useful work.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Lifecycle state of the scan loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanState {
    /// Never started.
    #[default]
    Idle,
    /// Scanning on schedule.
    Running,
    /// Started once, currently stopped.
    Stopped,
}

/// What a failed scan cycle does to the running state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanFailurePolicy {
    /// Keep scanning on schedule; the failure only logs.
    #[default]
    StayActive,
    /// Stop the loop so the failure is impossible to miss.
    Deactivate,
}

/// Status snapshot in the dashboard wire format.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringStatus {
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_run: Option<DateTime<Utc>>,
    pub source_count: usize,
}

/// Tracks scan scheduling state for one pipeline.
#[derive(Debug, Clone)]
pub struct MonitoringTracker {
    state: ScanState,
    failure_policy: ScanFailurePolicy,
    scan_interval: Duration,
    last_run: Option<DateTime<Utc>>,
    next_run: Option<DateTime<Utc>>,
    source_count: usize,
}

impl Default for MonitoringTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitoringTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ScanState::Idle,
            failure_policy: ScanFailurePolicy::default(),
            scan_interval: Duration::hours(1),
            last_run: None,
            next_run: None,
            source_count: 0,
        }
    }

    #[must_use]
    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    #[must_use]
    pub fn with_failure_policy(mut self, policy: ScanFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Start (or restart) monitoring, stamping an immediate scan.
    pub fn start(&mut self, source_count: usize) {
        self.source_count = source_count;
        self.stamp();
    }

    /// Stop monitoring. Scan stamps are kept.
    pub fn stop(&mut self) {
        if self.state == ScanState::Running {
            self.state = ScanState::Stopped;
        }
    }

    /// Record a successful scan cycle and schedule the next.
    pub fn complete_scan(&mut self, source_count: usize) {
        self.source_count = source_count;
        self.stamp();
    }

    /// Record a failed scan cycle, applying the failure policy.
    pub fn record_scan_failure(&mut self) {
        match self.failure_policy {
            ScanFailurePolicy::StayActive => self.stamp(),
            ScanFailurePolicy::Deactivate => self.stop(),
        }
    }

    fn stamp(&mut self) {
        let now = Utc::now();
        self.state = ScanState::Running;
        self.last_run = Some(now);
        self.next_run = Some(now + self.scan_interval);
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == ScanState::Running
    }

    #[must_use]
    pub const fn state(&self) -> ScanState {
        self.state
    }

    #[must_use]
    pub fn status(&self) -> MonitoringStatus {
        MonitoringStatus {
            is_active: self.is_active(),
            last_run: self.last_run,
            next_run: self.next_run,
            source_count: self.source_count,
        }
    }
}
