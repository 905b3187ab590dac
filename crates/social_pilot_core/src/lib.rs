pub mod domain;
pub mod plan;
pub mod ports;
pub mod score;

pub use domain::{
    AspectRatio, CampaignClock, CampaignGoal, CampaignShape, ContentItem, ContentStatus,
    ContentType, Persona, PlanItemDraft,
};
pub use plan::{CampaignPlan, CampaignStats, GenerationStart, PlanError};
pub use ports::{
    ImageGenerationService, ImageRequest, PersonaResearchService, PlanSynthesisService, PortError,
    PortResult,
};
pub use score::{score_with_jitter, viral_score, MAX_VIRAL_SCORE};
