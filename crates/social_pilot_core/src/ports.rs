//! crates/social_pilot_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the campaign engine's core
//! logic. These traits form the boundary of the hexagonal architecture,
//! keeping the core independent of the concrete generative provider.

use crate::domain::{AspectRatio, CampaignGoal, ContentType, Persona, PlanItemDraft};
use async_trait::async_trait;
use bytes::Bytes;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
///
/// The provider is a fallible, latency-bearing black box; these variants
/// are the only distinctions the core cares about.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The provider's structured payload failed schema validation. Never
    /// retried internally; surfaced to the campaign-generation caller.
    #[error("Provider response failed validation: {0}")]
    MalformedResponse(String),
    /// A single image-generation call failed or returned no payload.
    /// Absorbed locally by the batch pipeline.
    #[error("Image generation failed: {0}")]
    GenerationFailed(String),
    #[error("An unexpected provider error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Request Shapes
//=========================================================================================

/// Everything the asset generator needs to produce one visual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub content_type: ContentType,
    pub visual_prompt: String,
    pub niche: String,
    /// The lead persona's visual aesthetic, when one exists.
    pub stylistic_context: Option<String>,
    pub aspect_ratio: AspectRatio,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait PersonaResearchService: Send + Sync {
    /// Researches exactly three audience personas for the niche and goal.
    /// Fails with `MalformedResponse` if the provider payload does not
    /// parse into three fully-populated personas.
    async fn research_personas(
        &self,
        niche: &str,
        goal: CampaignGoal,
    ) -> PortResult<Vec<Persona>>;
}

#[async_trait]
pub trait PlanSynthesisService: Send + Sync {
    /// Synthesizes a full campaign plan, one draft per day, seeded with
    /// the researched personas. Fails with `MalformedResponse` on any
    /// schema violation (missing field, wrong day range, duplicate day).
    async fn synthesize_plan(
        &self,
        niche: &str,
        goal: CampaignGoal,
        personas: &[Persona],
    ) -> PortResult<Vec<PlanItemDraft>>;
}

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Generates one visual asset as raw image bytes. Fails with
    /// `GenerationFailed` on provider error or an empty payload.
    async fn generate_image(&self, request: &ImageRequest) -> PortResult<Bytes>;
}
