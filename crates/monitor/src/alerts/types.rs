//! Alert record types.
//!
//! The ingestion wire format uses camelCase field names; serde attributes
//! here match it so records pass through unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Platform a piece of content was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Google,
    News,
    Reddit,
    Twitter,
    Facebook,
    Instagram,
    Youtube,
    Tiktok,
    Forum,
    Web,
}

impl Platform {
    /// Get all platforms.
    #[must_use]
    pub fn all() -> &'static [Platform] {
        &[
            Platform::Google,
            Platform::News,
            Platform::Reddit,
            Platform::Twitter,
            Platform::Facebook,
            Platform::Instagram,
            Platform::Youtube,
            Platform::Tiktok,
            Platform::Forum,
            Platform::Web,
        ]
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Platform::Google => "google",
            Platform::News => "news",
            Platform::Reddit => "reddit",
            Platform::Twitter => "twitter",
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
            Platform::Forum => "forum",
            Platform::Web => "web",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Platform::Google),
            "news" => Ok(Platform::News),
            "reddit" => Ok(Platform::Reddit),
            "twitter" | "x" => Ok(Platform::Twitter),
            "facebook" => Ok(Platform::Facebook),
            "instagram" => Ok(Platform::Instagram),
            "youtube" => Ok(Platform::Youtube),
            "tiktok" => Ok(Platform::Tiktok),
            "forum" => Ok(Platform::Forum),
            "web" => Ok(Platform::Web),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// Coarse sentiment attached to an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Positive => "positive",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            "positive" => Ok(Sentiment::Positive),
            other => Err(format!("unknown sentiment: {other}")),
        }
    }
}

/// Alert severity, set at ingestion or by a later classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Workflow status of an alert.
///
/// Transitions only move forward (or laterally between the terminal
/// states); nothing ever returns to `New`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    #[default]
    New,
    Acknowledged,
    Investigating,
    Resolved,
    Dismissed,
}

impl AlertStatus {
    const fn rank(self) -> u8 {
        match self {
            Self::New => 0,
            Self::Acknowledged => 1,
            Self::Investigating => 2,
            Self::Resolved | Self::Dismissed => 3,
        }
    }

    /// Check whether moving to `to` is a legal (forward or lateral) step.
    #[must_use]
    pub const fn can_transition(self, to: Self) -> bool {
        !matches!(to, Self::New) && to.rank() >= self.rank()
    }
}

/// Rejected alert status transition.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid status transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: AlertStatus,
    pub to: AlertStatus,
}

/// A single detected mention relevant to a monitored entity.
///
/// Identity is the `id`; everything except `status` (and the
/// `updated_at` stamp it drags along) is immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAlert {
    pub id: String,
    pub platform: Platform,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<AlertSeverity>,
    #[serde(default)]
    pub status: AlertStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_reach: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detected_entities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentAlert {
    /// Create a new alert with fresh timestamps.
    #[must_use]
    pub fn new(id: impl Into<String>, platform: Platform, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            platform,
            content: content.into(),
            url: None,
            severity: None,
            status: AlertStatus::New,
            threat_type: None,
            confidence_score: None,
            potential_reach: None,
            detected_entities: Vec::new(),
            sentiment: None,
            client_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the sentiment (builder style, for construction only).
    #[must_use]
    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    /// Set the severity (builder style, for construction only).
    #[must_use]
    pub fn with_severity(mut self, severity: AlertSeverity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Move the alert to a new workflow status.
    pub fn transition(&mut self, to: AlertStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition(to) {
            return Err(InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Truncated content for previews, respecting UTF-8 character
    /// boundaries.
    #[must_use]
    pub fn preview(&self) -> String {
        const MAX_CHARS: usize = 100;

        let char_count = self.content.chars().count();
        if char_count <= MAX_CHARS {
            self.content.clone()
        } else {
            let truncated: String = self.content.chars().take(MAX_CHARS).collect();
            format!("{truncated}...")
        }
    }
}
