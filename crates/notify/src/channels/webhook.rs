//! Generic JSON webhook notification channel.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::ChannelError;
use crate::events::NotifyEvent;
use crate::NotifyChannel;

/// Environment variable for the webhook URL.
const ENV_WEBHOOK_URL: &str = "REPSIGNAL_WEBHOOK_URL";

/// Webhook notification channel.
///
/// Posts each event as a flat JSON document to a configured URL. Any
/// HTTP endpoint that accepts JSON can consume it (chat bridges,
/// incident tooling, plain collectors).
pub struct WebhookChannel {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

/// Payload posted to the webhook.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    title: String,
    severity: &'static str,
    timestamp: DateTime<Utc>,
    event: &'a NotifyEvent,
}

impl WebhookChannel {
    /// Create a new webhook channel from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let webhook_url = std::env::var(ENV_WEBHOOK_URL).ok();

        if webhook_url.is_some() {
            debug!("Webhook notifications enabled");
        } else {
            debug!("Webhook notifications disabled (REPSIGNAL_WEBHOOK_URL not set)");
        }

        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }

    /// Create a webhook channel with a specific URL.
    #[must_use]
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url: Some(webhook_url),
            client: reqwest::Client::new(),
        }
    }

    fn format_payload(event: &NotifyEvent) -> WebhookPayload<'_> {
        WebhookPayload {
            title: event.title(),
            severity: event.severity().as_str(),
            timestamp: event.timestamp(),
            event,
        }
    }
}

#[async_trait]
impl NotifyChannel for WebhookChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    async fn send(&self, event: &NotifyEvent) -> Result<(), ChannelError> {
        let Some(url) = &self.webhook_url else {
            return Err(ChannelError::NotConfigured(
                "REPSIGNAL_WEBHOOK_URL not set".to_string(),
            ));
        };

        let payload = Self::format_payload(event);
        let response = self.client.post(url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::Rejected {
                status: status.as_u16(),
            });
        }

        debug!(title = %event.title(), "Webhook notification delivered");
        Ok(())
    }
}
