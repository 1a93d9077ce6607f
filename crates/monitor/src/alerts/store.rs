//! In-memory alert store.

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use super::filter::{filter_alerts, Selector};
use super::types::{AlertStatus, ContentAlert, InvalidTransition, Platform, Sentiment};

/// Alert store operation failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("alert not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}

/// Holds all alerts for one monitored entity, newest batch last.
///
/// Alert ids are unique within the store; `merge_new` drops duplicates
/// so repeated scans of overlapping content never resurface an alert.
#[derive(Debug, Default)]
pub struct AlertStore {
    alerts: Vec<ContentAlert>,
}

impl AlertStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection, e.g. when seeding from a backfill.
    pub fn replace_all(&mut self, alerts: Vec<ContentAlert>) {
        self.alerts = alerts;
    }

    /// Merge a scan batch, keeping only alerts whose id is unseen.
    ///
    /// Duplicates within the batch itself collapse to the first
    /// occurrence. Returns the ids actually stored, in arrival order.
    pub fn merge_new(&mut self, batch: Vec<ContentAlert>) -> Vec<String> {
        let mut seen: HashSet<String> = self.alerts.iter().map(|a| a.id.clone()).collect();
        let mut stored = Vec::new();

        for alert in batch {
            if seen.insert(alert.id.clone()) {
                stored.push(alert.id.clone());
                self.alerts.push(alert);
            } else {
                debug!(alert_id = %alert.id, "Skipping already-stored alert");
            }
        }

        stored
    }

    /// Look up an alert by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ContentAlert> {
        self.alerts.iter().find(|a| a.id == id)
    }

    /// Move an alert to a new workflow status.
    pub fn update_status(&mut self, id: &str, to: AlertStatus) -> Result<(), StoreError> {
        let alert = self
            .alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        alert.transition(to)?;
        Ok(())
    }

    /// All alerts, in storage order.
    #[must_use]
    pub fn alerts(&self) -> &[ContentAlert] {
        &self.alerts
    }

    /// Cloned copy of all alerts.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ContentAlert> {
        self.alerts.clone()
    }

    /// Filtered view by platform and sentiment.
    #[must_use]
    pub fn filtered(
        &self,
        platform: &Selector<Platform>,
        sentiment: &Selector<Sentiment>,
    ) -> Vec<ContentAlert> {
        filter_alerts(&self.alerts, platform, sentiment)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}
