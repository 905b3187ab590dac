//! services/orchestrator/src/campaign/protocol.rs
//!
//! Defines the event protocol between the engine and its presentation
//! layer. Events provide context for the campaign's live progress; the
//! presentation layer reads plan data itself through the state handle.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Represents the structured events the engine emits while a campaign runs.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Persona research has started for a niche. The UI can show its
    /// "analyzing competitors" state.
    ResearchStarted { niche: String },

    /// Persona research succeeded and plan synthesis has started.
    PlanSynthesisStarted,

    /// The full campaign is generated, scored and stored.
    CampaignReady { days: usize, personas: usize },

    /// The simulated publishing-target handshake completed.
    PublishingConnected,

    /// The auto-pilot scheduler is armed and ticking.
    AutopilotArmed,

    /// The auto-pilot scheduler stopped ticking, either by request or
    /// because no scheduled item remains.
    AutopilotDisarmed,

    /// Every planned item has been published.
    MissionComplete,

    /// The scheduler published one item.
    ItemPosted { day: u32, posted_at: DateTime<Utc> },

    /// A batch asset-generation run started over `total` items.
    BatchStarted { total: usize },

    /// Progress after each processed batch item. `completed` counts
    /// processed items, successful or not, and never exceeds `total`.
    BatchProgress { completed: usize, total: usize },

    /// One item's visual asset is generated and stored.
    ItemImageReady { day: u32 },

    /// One item's generation attempt failed; the item reverted to its
    /// pending-visual appearance. Routine, not exceptional.
    ItemImageFailed { day: u32 },

    /// A batch run finished (success, partial failure or exhaustion).
    BatchFinished { completed: usize, total: usize },
}

/// Sends one event, discarding it if the receiver side is gone. A dropped
/// receiver only means nobody is watching; engine state is unaffected.
pub(crate) fn emit(events: &UnboundedSender<EngineEvent>, event: EngineEvent) {
    if events.send(event).is_err() {
        debug!("Engine event receiver dropped; event discarded.");
    }
}
