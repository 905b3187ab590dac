//! services/orchestrator/src/adapters/research_llm.rs
//!
//! This module contains the adapter for the persona-research LLM.
//! It implements the `PersonaResearchService` port from the `core` crate.

const SYSTEM_INSTRUCTIONS: &str = r#"You are a social media strategy researcher.

Given a niche and a campaign goal, research the three most successful social
media persona archetypes for that combination. For each persona analyze its
strategy, hook style and visual aesthetic.

Output rules:
- Respond with a JSON array of EXACTLY 3 objects and nothing else.
- Each object must have exactly these keys, all non-empty strings:
  "name", "handle", "strategy", "hookStyle", "visualAesthetic".
- No markdown, no commentary, no trailing text."#;

const USER_INPUT_TEMPLATE: &str = r#"Research the top 3 successful social media personas for {goal} in "{niche}". Analyze Strategy, Hooks, Aesthetics."#;

use super::strip_code_fences;
use async_openai::{
    config::OpenAIConfig, error::OpenAIError, types::responses::CreateResponseArgs, Client,
};
use async_trait::async_trait;
use social_pilot_core::{
    domain::{CampaignGoal, Persona},
    ports::{PersonaResearchService, PortError, PortResult},
};
use tracing::info;

/// Exactly this many personas are demanded from the provider.
const PERSONA_COUNT: usize = 3;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `PersonaResearchService` using an
/// OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiResearchAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiResearchAdapter {
    /// Creates a new `OpenAiResearchAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// Parses and validates the provider payload into exactly three
/// fully-populated personas.
fn parse_personas(raw: &str) -> PortResult<Vec<Persona>> {
    let personas: Vec<Persona> = serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| PortError::MalformedResponse(e.to_string()))?;

    if personas.len() != PERSONA_COUNT {
        return Err(PortError::MalformedResponse(format!(
            "expected {} personas, got {}",
            PERSONA_COUNT,
            personas.len()
        )));
    }
    for persona in &personas {
        let fields = [
            ("name", &persona.name),
            ("handle", &persona.handle),
            ("strategy", &persona.strategy),
            ("hookStyle", &persona.hook_style),
            ("visualAesthetic", &persona.visual_aesthetic),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(PortError::MalformedResponse(format!(
                    "persona field '{}' is empty",
                    field
                )));
            }
        }
    }
    Ok(personas)
}

//=========================================================================================
// `PersonaResearchService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PersonaResearchService for OpenAiResearchAdapter {
    /// Researches the top persona archetypes for a niche and campaign goal.
    async fn research_personas(
        &self,
        niche: &str,
        goal: CampaignGoal,
    ) -> PortResult<Vec<Persona>> {
        let user_input = USER_INPUT_TEMPLATE
            .replace("{goal}", &goal.to_string())
            .replace("{niche}", niche);

        let request = CreateResponseArgs::default()
            .model(&self.model)
            .instructions(SYSTEM_INSTRUCTIONS)
            .input(user_input)
            .max_output_tokens(2_000u32)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .responses()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let raw = response.output_text().unwrap_or_default();
        let personas = parse_personas(&raw)?;
        info!("Persona research returned {} archetypes.", personas.len());
        Ok(personas)
    }
}
