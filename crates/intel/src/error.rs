//! Error types for the classification gateway.
//!
//! The source system collapsed every failure into a null result. Here the
//! failure kinds are kept apart so callers can apply differentiated
//! policies later (transport errors are retryable on the next tick, remote
//! rejections and malformed responses generally are not).

use thiserror::Error;

/// Result alias for gateway operations.
pub type IntelResult<T> = Result<T, IntelError>;

/// Errors raised by the classification gateway and memory client.
#[derive(Debug, Error)]
pub enum IntelError {
    /// Network-level failure (unreachable, timeout, TLS).
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote endpoint answered with a non-success status.
    #[error("remote rejection (status {status}): {message}")]
    Remote { status: u16, message: String },

    /// The response arrived but could not be interpreted.
    #[error("malformed response: {reason}")]
    Malformed { reason: String },

    /// Prompt template failed to register.
    #[error("prompt template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    /// Prompt template failed to render.
    #[error("prompt render error: {0}")]
    Render(#[from] handlebars::RenderError),

    /// Provider or client is missing required configuration.
    #[error("not configured: {0}")]
    NotConfigured(String),
}

impl IntelError {
    /// True for failures where trying again later could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
