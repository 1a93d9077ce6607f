//! Manual alert ingestion client.
//!
//! Submits operator-entered content to the ingestion endpoint, which
//! classifies and stores it server-side.

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::alerts::Platform;

/// Environment variable for the ingestion endpoint URL.
pub const ENV_INGEST_URL: &str = "REPSIGNAL_INGEST_URL";
/// Environment variable for the ingestion credential.
pub const ENV_INGEST_CREDENTIAL: &str = "REPSIGNAL_INGEST_CREDENTIAL";

/// Ingestion endpoint configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub url: String,
    /// Raw credential sent as-is in `credential_header`. No scheme
    /// prefix is added.
    pub credential: Option<String>,
    pub credential_header: String,
}

impl IngestConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            credential: None,
            credential_header: "authorization".to_string(),
        }
    }

    /// Read the endpoint and credential from the environment.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var(ENV_INGEST_URL)
            .with_context(|| format!("{ENV_INGEST_URL} is not set"))?;
        let mut config = Self::new(url);
        config.credential = std::env::var(ENV_INGEST_CREDENTIAL).ok();
        Ok(config)
    }
}

/// Submitted content in the ingestion wire format.
#[derive(Debug, Serialize)]
struct IngestRequest<'a> {
    content: &'a str,
    platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    test: bool,
}

/// Client for the alert ingestion endpoint.
pub struct IngestClient {
    client: Client,
    config: IngestConfig,
}

impl IngestClient {
    #[must_use]
    pub fn new(config: IngestConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Submit content for ingestion. Returns the endpoint's response
    /// body, which echoes the stored alert.
    pub async fn submit(
        &self,
        content: &str,
        platform: Platform,
        url: Option<&str>,
        test: bool,
    ) -> Result<serde_json::Value> {
        let request = IngestRequest {
            content,
            platform,
            url,
            test,
        };

        let mut builder = self.client.post(&self.config.url).json(&request);
        if let Some(credential) = &self.config.credential {
            builder = builder.header(self.config.credential_header.as_str(), credential);
        }

        let response = builder
            .send()
            .await
            .context("Failed to reach ingestion endpoint")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read ingestion response")?;

        if !status.is_success() {
            bail!("Ingestion endpoint rejected submission ({status}): {body}");
        }

        info!(%platform, test, "Submitted content for ingestion");
        serde_json::from_str(&body).context("Ingestion response was not JSON")
    }
}
