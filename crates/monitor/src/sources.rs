//! Scraping source definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of a scraping source, independent of its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Google,
    News,
    Manual,
    Crawler,
    Zapier,
}

/// Source-specific configuration, tagged by kind on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    Google {
        query: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        region: Option<String>,
    },
    News {
        feed_url: String,
    },
    Manual,
    Crawler {
        seed_url: String,
        max_depth: u8,
    },
    Zapier {
        hook_id: String,
    },
}

impl SourceConfig {
    #[must_use]
    pub const fn kind(&self) -> SourceKind {
        match self {
            SourceConfig::Google { .. } => SourceKind::Google,
            SourceConfig::News { .. } => SourceKind::News,
            SourceConfig::Manual => SourceKind::Manual,
            SourceConfig::Crawler { .. } => SourceKind::Crawler,
            SourceConfig::Zapier { .. } => SourceKind::Zapier,
        }
    }
}

/// A single configured scraping source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapingSource {
    pub id: Uuid,
    pub name: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scan: Option<DateTime<Utc>>,
    pub config: SourceConfig,
}

impl ScrapingSource {
    /// Create an enabled source with a fresh id and no scan history.
    #[must_use]
    pub fn new(name: impl Into<String>, config: SourceConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            enabled: true,
            last_scan: None,
            config,
        }
    }
}

/// The set of sources a pipeline scans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRegistry {
    sources: Vec<ScrapingSource>,
}

impl SourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source and return its id.
    pub fn add(&mut self, source: ScrapingSource) -> Uuid {
        let id = source.id;
        self.sources.push(source);
        id
    }

    /// Remove a source. Returns the removed source if it existed.
    pub fn remove(&mut self, id: Uuid) -> Option<ScrapingSource> {
        let index = self.sources.iter().position(|s| s.id == id)?;
        Some(self.sources.remove(index))
    }

    /// Enable or disable a source. Returns false if the id is unknown.
    pub fn set_enabled(&mut self, id: Uuid, enabled: bool) -> bool {
        if let Some(source) = self.sources.iter_mut().find(|s| s.id == id) {
            source.enabled = enabled;
            true
        } else {
            false
        }
    }

    /// Record a completed scan for a source.
    pub fn mark_scanned(&mut self, id: Uuid, at: DateTime<Utc>) {
        if let Some(source) = self.sources.iter_mut().find(|s| s.id == id) {
            source.last_scan = Some(at);
        }
    }

    /// Enabled sources, cloned for scanning outside any lock.
    #[must_use]
    pub fn enabled(&self) -> Vec<ScrapingSource> {
        self.sources.iter().filter(|s| s.enabled).cloned().collect()
    }

    #[must_use]
    pub fn enabled_count(&self) -> usize {
        self.sources.iter().filter(|s| s.enabled).count()
    }

    #[must_use]
    pub fn all(&self) -> &[ScrapingSource] {
        &self.sources
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_enable_disable() {
        let mut registry = SourceRegistry::new();
        let id = registry.add(ScrapingSource::new(
            "acme search",
            SourceConfig::Google {
                query: "\"Acme Corp\"".to_string(),
                region: None,
            },
        ));
        registry.add(ScrapingSource::new(
            "press feed",
            SourceConfig::News {
                feed_url: "https://news.example.com/rss".to_string(),
            },
        ));

        assert_eq!(registry.enabled_count(), 2);
        assert!(registry.set_enabled(id, false));
        assert_eq!(registry.enabled_count(), 1);
        assert!(!registry.set_enabled(Uuid::new_v4(), true));
    }

    #[test]
    fn test_remove_unknown_source() {
        let mut registry = SourceRegistry::new();
        assert!(registry.remove(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_mark_scanned_sets_timestamp() {
        let mut registry = SourceRegistry::new();
        let id = registry.add(ScrapingSource::new("manual", SourceConfig::Manual));
        assert!(registry.all()[0].last_scan.is_none());

        let now = Utc::now();
        registry.mark_scanned(id, now);
        assert_eq!(registry.all()[0].last_scan, Some(now));
    }

    #[test]
    fn test_config_wire_format_is_tagged() {
        let source = ScrapingSource::new(
            "crawler",
            SourceConfig::Crawler {
                seed_url: "https://forum.example.com".to_string(),
                max_depth: 2,
            },
        );
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["config"]["type"], "crawler");
        assert_eq!(json["config"]["max_depth"], 2);
        assert_eq!(source.config.kind(), SourceKind::Crawler);
    }
}
