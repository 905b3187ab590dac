//! services/orchestrator/src/adapters/plan_llm.rs
//!
//! This module contains the adapter for the plan-synthesis LLM.
//! It implements the `PlanSynthesisService` port from the `core` crate.

const SYSTEM_INSTRUCTIONS: &str = r#"You are a social media campaign architect.

You design day-by-day content plans that move an audience through a
three-phase funnel: Growth (reach new followers), Trust (deepen the
relationship), Sales (convert).

Output rules:
- Respond with a JSON array containing EXACTLY one object per campaign day
  and nothing else.
- Each object must have exactly these keys:
  "day" (integer, 1-based, every day exactly once),
  "type" (one of "Reel", "Post", "Story", "Carousel"),
  "topic", "hook", "caption" (strings),
  "hashtags" (array of strings),
  "visualPrompt" (string describing the visual for an image generator).
- No markdown, no commentary, no trailing text."#;

const USER_INPUT_TEMPLATE: &str = r#"Create a {days}-day social media plan for "{niche}".
Stages: Growth (1-{growth}), Trust ({trust_start}-{trust}), Sales ({sales_start}-{days}).
Goal: {goal}.
Persona context: {personas}."#;

use super::strip_code_fences;
use async_openai::{
    config::OpenAIConfig, error::OpenAIError, types::responses::CreateResponseArgs, Client,
};
use async_trait::async_trait;
use social_pilot_core::{
    domain::{CampaignGoal, CampaignShape, Persona, PlanItemDraft},
    plan::CampaignPlan,
    ports::{PlanSynthesisService, PortError, PortResult},
};
use tracing::info;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `PlanSynthesisService` using an
/// OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiPlanAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    shape: CampaignShape,
}

impl OpenAiPlanAdapter {
    /// Creates a new `OpenAiPlanAdapter` for a given campaign shape.
    pub fn new(client: Client<OpenAIConfig>, model: String, shape: CampaignShape) -> Self {
        Self { client, model, shape }
    }

    fn build_user_input(
        &self,
        niche: &str,
        goal: CampaignGoal,
        personas: &[Persona],
    ) -> PortResult<String> {
        let personas_json = serde_json::to_string(personas)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(USER_INPUT_TEMPLATE
            .replace("{days}", &self.shape.days.to_string())
            .replace("{growth}", &self.shape.growth_until.to_string())
            .replace("{trust_start}", &(self.shape.growth_until + 1).to_string())
            .replace("{trust}", &self.shape.trust_until.to_string())
            .replace("{sales_start}", &(self.shape.trust_until + 1).to_string())
            .replace("{niche}", niche)
            .replace("{goal}", &goal.to_string())
            .replace("{personas}", &personas_json))
    }
}

/// Parses and validates the provider payload into a full set of drafts
/// covering every campaign day exactly once.
fn parse_drafts(raw: &str, expected_days: u32) -> PortResult<Vec<PlanItemDraft>> {
    let drafts: Vec<PlanItemDraft> = serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| PortError::MalformedResponse(e.to_string()))?;

    CampaignPlan::validate_drafts(&drafts, expected_days)
        .map_err(|e| PortError::MalformedResponse(e.to_string()))?;
    Ok(drafts)
}

//=========================================================================================
// `PlanSynthesisService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PlanSynthesisService for OpenAiPlanAdapter {
    /// Synthesizes the full day-by-day plan, seeded with the researched
    /// personas.
    async fn synthesize_plan(
        &self,
        niche: &str,
        goal: CampaignGoal,
        personas: &[Persona],
    ) -> PortResult<Vec<PlanItemDraft>> {
        let user_input = self.build_user_input(niche, goal, personas)?;

        let request = CreateResponseArgs::default()
            .model(&self.model)
            .instructions(SYSTEM_INSTRUCTIONS)
            .input(user_input)
            .max_output_tokens(16_000u32)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .responses()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let raw = response.output_text().unwrap_or_default();
        let drafts = parse_drafts(&raw, self.shape.days)?;
        info!("Plan synthesis returned {} daily items.", drafts.len());
        Ok(drafts)
    }
}
