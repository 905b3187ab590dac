//! services/orchestrator/src/campaign/state.rs
//!
//! Defines the engine's shared and campaign-specific states.

use crate::config::Config;
use chrono::{DateTime, Utc};
use social_pilot_core::{
    domain::{AspectRatio, CampaignClock, CampaignGoal, Persona},
    plan::{CampaignPlan, CampaignStats, PlanError},
    ports::{ImageGenerationService, ImageRequest, PersonaResearchService, PlanSynthesisService},
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across the Whole Engine)
//=========================================================================================

/// The shared application state, created once at startup and passed to all
/// engine tasks.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub research_adapter: Arc<dyn PersonaResearchService>,
    pub plan_adapter: Arc<dyn PlanSynthesisService>,
    pub image_adapter: Arc<dyn ImageGenerationService>,
}

//=========================================================================================
// CampaignState (The Single Shared Mutable Resource)
//=========================================================================================

/// Whether the auto-pilot scheduler is currently ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutopilotStatus {
    Idle,
    Armed,
}

/// A receipt for one automatic publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostedReceipt {
    pub day: u32,
    pub posted_at: DateTime<Utc>,
}

/// The live state of one campaign session: the plan, its personas, the
/// simulated clock and the publishing flags.
///
/// This is the only shared mutable resource in the engine. It lives behind
/// one `Arc<tokio::sync::Mutex<_>>`; the scheduler and the batch pipeline
/// both mutate items exclusively through the plan repository's per-item
/// operations while holding the lock.
pub struct CampaignState {
    pub niche: String,
    pub goal: CampaignGoal,
    pub personas: Vec<Persona>,
    pub plan: CampaignPlan,
    pub clock: CampaignClock,
    pub autopilot: AutopilotStatus,
    pub connected: bool,
}

impl CampaignState {
    /// The pre-campaign state: no personas, an empty plan, a fresh clock.
    pub fn new(interval_ticks: u32) -> Self {
        Self {
            niche: String::new(),
            goal: CampaignGoal::ThemePage,
            personas: Vec::new(),
            plan: CampaignPlan::empty(),
            clock: CampaignClock::new(interval_ticks),
            autopilot: AutopilotStatus::Idle,
            connected: false,
        }
    }

    /// Atomically replaces the campaign content and resets the clock.
    /// The publishing-target connection survives regeneration.
    pub fn replace_campaign(
        &mut self,
        niche: String,
        goal: CampaignGoal,
        personas: Vec<Persona>,
        plan: CampaignPlan,
        interval_ticks: u32,
    ) {
        self.niche = niche;
        self.goal = goal;
        self.personas = personas;
        self.plan = plan;
        self.clock = CampaignClock::new(interval_ticks);
        self.autopilot = AutopilotStatus::Idle;
    }

    /// The lead persona's visual aesthetic, used as stylistic context for
    /// asset generation.
    pub fn lead_aesthetic(&self) -> Option<String> {
        self.personas.first().map(|p| p.visual_aesthetic.clone())
    }

    /// Builds the asset-generation request for one plan item.
    pub fn image_request_for(&self, index: usize) -> Result<ImageRequest, PlanError> {
        let item = self.plan.item(index)?;
        Ok(ImageRequest {
            content_type: item.content_type,
            visual_prompt: item.visual_prompt.clone(),
            niche: self.niche.clone(),
            stylistic_context: self.lead_aesthetic(),
            aspect_ratio: AspectRatio::for_content(item.content_type),
        })
    }

    /// Publishes the lowest-day `Scheduled` item and advances simulated
    /// time past it. Returns `None` when no pending item remains.
    pub fn publish_next(
        &mut self,
        at: DateTime<Utc>,
        interval_ticks: u32,
    ) -> Result<Option<PostedReceipt>, PlanError> {
        let Some(index) = self.plan.find_next_scheduled() else {
            return Ok(None);
        };

        let day = self.plan.mark_posted(index, at)?.day;
        self.clock.advance_past(day, interval_ticks);
        Ok(Some(PostedReceipt { day, posted_at: at }))
    }

    pub fn stats(&self) -> CampaignStats {
        self.plan.stats()
    }
}
