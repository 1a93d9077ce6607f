//! Threat classification gateway.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::error::{IntelError, IntelResult};
use crate::memory::{EntityMemoryClient, EntityRef, MemoryEntry};
use crate::prompts::PromptManager;
use crate::provider::{parse_model_json, ChatMessage, GenerateOptions, InferenceProvider};

/// Threat severity assessed by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatSeverity {
    /// Parse severity from a model-emitted string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "moderate" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "severe" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Structured result of a threat classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatAnalysis {
    /// Assessed severity.
    pub severity: ThreatSeverity,
    /// Short threat label (e.g. "defamation", "impersonation", "none").
    pub threat_type: String,
    /// Model confidence (0.0-1.0).
    pub confidence: f32,
    /// Why the content was classified this way.
    pub reasoning: String,
    /// Concrete next steps for the entity's team.
    #[serde(default)]
    pub recommended_actions: Vec<String>,
    /// People/orgs/brands named in the content.
    #[serde(default)]
    pub detected_entities: Vec<String>,
}

/// Raw response from the model for parsing.
#[derive(Debug, Deserialize)]
struct RawThreatResponse {
    severity: String,
    threat_type: String,
    confidence: f32,
    reasoning: String,
    #[serde(default)]
    recommended_actions: Vec<String>,
    #[serde(default)]
    detected_entities: Vec<String>,
}

/// Classifies content threats using an inference provider, optionally
/// enriched with recalled entity memory.
pub struct ThreatClassifier {
    provider: Arc<dyn InferenceProvider>,
    memory: Option<EntityMemoryClient>,
    prompts: PromptManager,
    model: String,
}

impl ThreatClassifier {
    /// Create a new classifier with the given provider.
    pub fn new(
        provider: Arc<dyn InferenceProvider>,
        memory: Option<EntityMemoryClient>,
        model: String,
    ) -> IntelResult<Self> {
        let prompts = PromptManager::new()?;
        Ok(Self {
            provider,
            memory,
            prompts,
            model,
        })
    }

    /// Classify a content/platform/entity tuple.
    ///
    /// With `use_memory_context`, prior observations for the entity are
    /// recalled and embedded in the prompt; recall failures degrade to a
    /// context-free classification with a warning rather than failing the
    /// call.
    pub async fn analyze(
        &self,
        content: &str,
        platform: &str,
        entity_name: &str,
        use_memory_context: bool,
    ) -> IntelResult<ThreatAnalysis> {
        let memories = if use_memory_context {
            self.recall_context(entity_name).await
        } else {
            Vec::new()
        };

        let prompt_data = serde_json::json!({
            "entity": entity_name,
            "platform": platform,
            "content": content,
            "memories": memories,
        });

        let prompt = self.prompts.render("classify", &prompt_data)?;
        let messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];

        let options = GenerateOptions {
            temperature: Some(0.2),
            max_tokens: Some(1000),
            json_mode: true,
        };

        let completion = self
            .provider
            .complete(&self.model, &messages, &options)
            .await?;

        let raw: RawThreatResponse = parse_model_json(&completion.text)?;

        let severity = ThreatSeverity::parse(&raw.severity).unwrap_or_else(|| {
            warn!(severity = %raw.severity, "Unknown severity from model, defaulting to medium");
            ThreatSeverity::Medium
        });

        Ok(ThreatAnalysis {
            severity,
            threat_type: raw.threat_type,
            confidence: raw.confidence.clamp(0.0, 1.0),
            reasoning: raw.reasoning,
            recommended_actions: raw.recommended_actions,
            detected_entities: raw.detected_entities,
        })
    }

    /// Classification that never fails past the call boundary.
    ///
    /// Failures of any kind are logged and collapsed to `None`, matching
    /// the behavior user-facing callers expect from a best-effort verdict.
    pub async fn try_analyze(
        &self,
        content: &str,
        platform: &str,
        entity_name: &str,
        use_memory_context: bool,
    ) -> Option<ThreatAnalysis> {
        match self
            .analyze(content, platform, entity_name, use_memory_context)
            .await
        {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                warn!(entity = entity_name, error = %e, "Threat analysis failed");
                None
            }
        }
    }

    /// Summarize a content item for the monitoring team.
    pub async fn summarize(&self, content: &str, entity_name: &str) -> IntelResult<String> {
        let prompt = self.prompts.render(
            "summarize",
            &serde_json::json!({"entity": entity_name, "content": content}),
        )?;
        let messages = vec![ChatMessage::user(prompt)];

        let options = GenerateOptions {
            temperature: Some(0.3),
            max_tokens: Some(300),
            json_mode: false,
        };

        let completion = self
            .provider
            .complete(&self.model, &messages, &options)
            .await?;
        Ok(completion.text.trim().to_string())
    }

    /// Search entity memories, most-recent-first.
    ///
    /// Degrades to an empty sequence when no memory service is configured
    /// or the search fails; this is the boundary where those failures are
    /// absorbed.
    pub async fn search_memories(
        &self,
        query: &str,
        entity_name: &str,
        search_type: Option<&str>,
    ) -> Vec<MemoryEntry> {
        let Some(memory) = &self.memory else {
            return Vec::new();
        };

        match memory.search(query, entity_name, search_type).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(entity = entity_name, query, error = %e, "Memory search failed");
                Vec::new()
            }
        }
    }

    /// Recall prior observations as prompt context lines.
    async fn recall_context(&self, entity_name: &str) -> Vec<String> {
        let Some(memory) = &self.memory else {
            return Vec::new();
        };

        match memory.recall(&EntityRef::by_name(entity_name)).await {
            Ok(recall) => recall.memory.iter().map(MemoryEntry::context_line).collect(),
            Err(e) => {
                warn!(entity = entity_name, error = %e, "Memory recall failed, classifying without context");
                Vec::new()
            }
        }
    }
}

const SYSTEM_PROMPT: &str = r#"You are a reputation-intelligence analyst assessing whether online content threatens a monitored entity.

You evaluate each item for:
1. Direct reputational harm (defamation, misinformation, leaked material)
2. Coordinated behavior visible across prior observations
3. Amplification risk given the platform

Severity guide:
- critical = active, spreading, materially damaging
- high = credible threat likely to spread without intervention
- medium = negative content worth tracking, limited reach so far
- low = benign or routine mentions

Always respond with valid JSON. Be specific in the reasoning; never pad the confidence."#;
