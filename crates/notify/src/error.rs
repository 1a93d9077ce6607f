//! Error types for the notification system.

use thiserror::Error;

/// Errors that can occur when sending notifications.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Channel is not configured
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote endpoint rejected the notification
    #[error("Webhook rejected notification with status {status}")]
    Rejected { status: u16 },

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Error raised by an audible cue backend.
///
/// Cue failures are always swallowed and logged by the dispatcher,
/// never propagated to the caller.
#[derive(Debug, Error)]
#[error("cue playback failed: {0}")]
pub struct CueError(pub String);
