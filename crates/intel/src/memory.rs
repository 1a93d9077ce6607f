//! Entity memory client.
//!
//! Talks to the entity memory recall service, which stores prior content
//! observations per monitored entity. Recall results feed the
//! classification prompt as historical context.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{IntelError, IntelResult};

/// Environment variable for the memory service URL.
pub const ENV_MEMORY_API_URL: &str = "MEMORY_API_URL";

/// Entity memory client configuration.
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Memory service URL
    pub url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Maximum number of entries a recall may return
    pub recall_limit: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000/entity-memory".to_string(),
            timeout_ms: 5000,
            recall_limit: 50,
        }
    }
}

/// Reference to a monitored entity, by exact id or by name.
///
/// Name lookups match case-insensitively on substrings server-side.
#[derive(Debug, Clone, Serialize)]
pub struct EntityRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
}

impl EntityRef {
    /// Reference an entity by exact id.
    #[must_use]
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            entity_id: Some(id.into()),
            entity_name: None,
        }
    }

    /// Reference an entity by (partial) name.
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            entity_id: None,
            entity_name: Some(name.into()),
        }
    }
}

/// A single remembered observation for an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: String,
    pub entity_name: String,
    pub content: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub threat_type: Option<String>,
    pub last_seen: DateTime<Utc>,
}

impl MemoryEntry {
    /// One-line rendering for prompt context.
    #[must_use]
    pub fn context_line(&self) -> String {
        let platform = self.platform.as_deref().unwrap_or("unknown");
        format!(
            "[{} | {}] {}",
            self.last_seen.format("%Y-%m-%d"),
            platform,
            self.content
        )
    }
}

/// Recall response: remembered entries plus the total match count.
#[derive(Debug, Deserialize)]
pub struct MemoryRecall {
    pub memory: Vec<MemoryEntry>,
    pub count: usize,
}

/// Memory search request.
#[derive(Debug, Serialize)]
struct SearchQuery<'a> {
    query: &'a str,
    entity_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_type: Option<&'a str>,
}

/// Memory search response.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<MemoryEntry>,
}

/// Client for the entity memory service.
pub struct EntityMemoryClient {
    client: Client,
    config: MemoryConfig,
}

impl EntityMemoryClient {
    /// Create a client with the given configuration.
    #[must_use]
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create a client from environment variables, if configured.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let url = std::env::var(ENV_MEMORY_API_URL).ok()?;
        Some(Self::new(MemoryConfig {
            url,
            ..MemoryConfig::default()
        }))
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }

    /// Recall prior observations for an entity.
    ///
    /// Entries come back most-recent-first and capped at the configured
    /// recall limit; both are re-applied client-side in case the service
    /// version behind the URL predates those guarantees.
    pub async fn recall(&self, entity: &EntityRef) -> IntelResult<MemoryRecall> {
        let response = self
            .client
            .post(&self.config.url)
            .timeout(self.timeout())
            .json(entity)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(IntelError::Remote {
                status: status.as_u16(),
                message: body,
            });
        }

        let mut recall: MemoryRecall =
            serde_json::from_str(&body).map_err(|e| IntelError::Malformed {
                reason: format!("memory recall response: {e}"),
            })?;

        recall.memory.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        recall.memory.truncate(self.config.recall_limit);

        debug!(
            count = recall.count,
            returned = recall.memory.len(),
            "Recalled entity memory"
        );
        Ok(recall)
    }

    /// Search remembered observations for an entity.
    ///
    /// Returns matches most-recent-first; an empty vec when nothing
    /// matches.
    pub async fn search(
        &self,
        query: &str,
        entity_name: &str,
        search_type: Option<&str>,
    ) -> IntelResult<Vec<MemoryEntry>> {
        let url = format!("{}/search", self.config.url);
        let request = SearchQuery {
            query,
            entity_name,
            search_type,
        };

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(IntelError::Remote {
                status: status.as_u16(),
                message: body,
            });
        }

        let mut parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| IntelError::Malformed {
                reason: format!("memory search response: {e}"),
            })?;

        parsed.results.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        Ok(parsed.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entry(id: &str, last_seen: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "entity_name": "Acme Corp",
            "content": format!("observation {id}"),
            "platform": "reddit",
            "last_seen": last_seen,
        })
    }

    #[tokio::test]
    async fn test_recall_orders_most_recent_first() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_partial_json(serde_json::json!({
                "entity_name": "acme",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "memory": [
                    entry("m1", "2026-01-01T00:00:00Z"),
                    entry("m3", "2026-03-01T00:00:00Z"),
                    entry("m2", "2026-02-01T00:00:00Z"),
                ],
                "count": 3,
            })))
            .mount(&server)
            .await;

        let client = EntityMemoryClient::new(MemoryConfig {
            url: server.uri(),
            ..MemoryConfig::default()
        });

        let recall = client.recall(&EntityRef::by_name("acme")).await.unwrap();
        let ids: Vec<&str> = recall.memory.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m3", "m2", "m1"]);
        assert_eq!(recall.count, 3);
    }

    #[tokio::test]
    async fn test_recall_caps_entries() {
        let server = MockServer::start().await;
        let memory: Vec<_> = (0..5)
            .map(|i| entry(&format!("m{i}"), &format!("2026-01-0{}T00:00:00Z", i + 1)))
            .collect();
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "memory": memory,
                "count": 5,
            })))
            .mount(&server)
            .await;

        let client = EntityMemoryClient::new(MemoryConfig {
            url: server.uri(),
            recall_limit: 2,
            ..MemoryConfig::default()
        });

        let recall = client.recall(&EntityRef::by_id("e1")).await.unwrap();
        assert_eq!(recall.memory.len(), 2);
        assert_eq!(recall.memory[0].id, "m4");
    }

    #[tokio::test]
    async fn test_search_empty_store_returns_empty_vec() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"results": []})),
            )
            .mount(&server)
            .await;

        let client = EntityMemoryClient::new(MemoryConfig {
            url: server.uri(),
            ..MemoryConfig::default()
        });

        let results = client.search("lawsuit", "Acme Corp", None).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_recall_maps_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = EntityMemoryClient::new(MemoryConfig {
            url: server.uri(),
            ..MemoryConfig::default()
        });

        let err = client.recall(&EntityRef::by_id("e1")).await.unwrap_err();
        assert!(matches!(err, IntelError::Remote { status: 500, .. }));
    }

    #[test]
    fn test_context_line_format() {
        let entry = MemoryEntry {
            id: "m1".to_string(),
            entity_name: "Acme Corp".to_string(),
            content: "negative thread".to_string(),
            platform: Some("reddit".to_string()),
            sentiment: None,
            threat_type: None,
            last_seen: "2026-05-01T12:00:00Z".parse().unwrap(),
        };
        assert_eq!(entry.context_line(), "[2026-05-01 | reddit] negative thread");
    }
}
