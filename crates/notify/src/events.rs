//! Notification event types for the monitoring pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity levels for alerts and notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational - normal operations
    Info,
    /// Warning - something needs attention
    Warning,
    /// Critical - immediate action required
    Critical,
}

/// Audible cue kinds, classified by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueKind {
    /// Soft chime for informational events.
    Chime,
    /// Alarm tone for warnings and critical alerts.
    Alarm,
}

impl Severity {
    /// Get display name for this severity.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        }
    }

    /// Get the audible cue for this severity.
    #[must_use]
    pub const fn cue(&self) -> CueKind {
        match self {
            Self::Info => CueKind::Chime,
            Self::Warning | Self::Critical => CueKind::Alarm,
        }
    }
}

/// Events that can trigger notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifyEvent {
    /// A new content alert arrived for a monitored entity.
    AlertDetected {
        alert_id: String,
        entity: String,
        platform: String,
        severity: Severity,
        /// First ~100 chars of the alert content.
        preview: String,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    /// A scan cycle finished and produced results.
    ScanCompleted {
        entity: String,
        fetched: usize,
        stored: usize,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },
}

impl NotifyEvent {
    /// Get a short title for this event type.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::AlertDetected {
                entity, platform, ..
            } => {
                format!("Alert: {entity} on {platform}")
            }
            Self::ScanCompleted { entity, stored, .. } => {
                format!("Scan Completed: {entity} ({stored} new)")
            }
        }
    }

    /// Get the severity for this event.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::AlertDetected { severity, .. } => *severity,
            Self::ScanCompleted { .. } => Severity::Info,
        }
    }

    /// Get the timestamp for this event.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::AlertDetected { timestamp, .. } | Self::ScanCompleted { timestamp, .. } => {
                *timestamp
            }
        }
    }

    /// Get the alert id, if this event is tied to a specific alert.
    ///
    /// Events with an alert id are deduplicated by the dispatcher;
    /// lifecycle events (scan completions) are not.
    #[must_use]
    pub fn alert_id(&self) -> Option<&str> {
        match self {
            Self::AlertDetected { alert_id, .. } => Some(alert_id),
            Self::ScanCompleted { .. } => None,
        }
    }
}
