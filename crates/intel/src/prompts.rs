//! Prompt template management.

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::IntelResult;

/// Manages Handlebars prompt templates.
pub struct PromptManager {
    handlebars: Handlebars<'static>,
}

impl PromptManager {
    /// Create a new prompt manager with embedded templates.
    pub fn new() -> IntelResult<Self> {
        let mut handlebars = Handlebars::new();

        handlebars.register_template_string("classify", CLASSIFY_TEMPLATE)?;
        handlebars.register_template_string("summarize", SUMMARIZE_TEMPLATE)?;

        Ok(Self { handlebars })
    }

    /// Render a template with the given data.
    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> IntelResult<String> {
        let result = self.handlebars.render(template, data)?;
        Ok(result)
    }
}

/// Threat classification prompt template.
const CLASSIFY_TEMPLATE: &str = r#"Classify the threat level of this content mentioning a monitored entity.

## Entity
{{entity}}

## Content
Platform: {{platform}}
Text: {{content}}

{{#if memories}}
## Prior Observations
Earlier content recorded for this entity, most recent first:
{{#each memories}}
- {{this}}
{{/each}}
{{/if}}

## Task
Assess whether this content poses a reputational threat to the entity.
Consider coordinated patterns across the prior observations, not just this
item in isolation. Respond with JSON:
{
  "severity": "<low|medium|high|critical>",
  "threat_type": "<short label, e.g. defamation, impersonation, review_bombing, data_leak, none>",
  "confidence": <0.0-1.0>,
  "reasoning": "<what makes this a threat or not, referencing prior observations when relevant>",
  "recommended_actions": ["<concrete next steps for the entity's team>"],
  "detected_entities": ["<people/orgs/brands named in the content>"]
}
"#;

/// Content summary prompt template.
const SUMMARIZE_TEMPLATE: &str = r"Summarize this content item for the team monitoring {{entity}}.

## Content
{{content}}

Write a 2-3 sentence summary focused on what it says about the entity and
why it might matter. Plain text, no preamble.
";
