//! services/orchestrator/src/campaign/engine.rs
//!
//! The orchestration facade: the single entry point the presentation layer
//! talks to. It sequences the two-phase campaign-generation workflow and
//! owns the shared campaign state, the event channel, the batch
//! single-flight guard and the auto-pilot task handle.

use crate::campaign::{
    autopilot_task::autopilot_process,
    batch_task::{batch_process, generate_single, BatchReport, ImageOutcome},
    protocol::{emit, EngineEvent},
    state::{AppState, AutopilotStatus, CampaignState},
};
use crate::error::{EngineError, EngineResult};
use social_pilot_core::{domain::CampaignGoal, plan::CampaignPlan, plan::CampaignStats};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// A handle to a spawned auto-pilot task.
struct AutopilotHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// The campaign orchestration engine.
///
/// One instance owns one campaign session. All inbound operations go
/// through here; all outbound progress is reported on the event channel
/// returned by [`CampaignEngine::new`].
pub struct CampaignEngine {
    app: Arc<AppState>,
    campaign: Arc<Mutex<CampaignState>>,
    events: UnboundedSender<EngineEvent>,
    batch_active: Arc<AtomicBool>,
    autopilot: Mutex<Option<AutopilotHandle>>,
}

impl CampaignEngine {
    /// Creates an engine in the pre-campaign state, plus the receiving end
    /// of its event channel.
    pub fn new(app: Arc<AppState>) -> (Self, UnboundedReceiver<EngineEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let interval_ticks = app.config.post_interval_ticks;
        let engine = Self {
            app,
            campaign: Arc::new(Mutex::new(CampaignState::new(interval_ticks))),
            events,
            batch_active: Arc::new(AtomicBool::new(false)),
            autopilot: Mutex::new(None),
        };
        (engine, receiver)
    }

    /// A handle to the live campaign state, for presentation-layer reads.
    pub fn state_handle(&self) -> Arc<Mutex<CampaignState>> {
        self.campaign.clone()
    }

    pub async fn stats(&self) -> CampaignStats {
        self.campaign.lock().await.stats()
    }

    /// Runs the two-phase campaign-generation workflow: persona research,
    /// then plan synthesis seeded with the personas.
    ///
    /// Any failure aborts the whole workflow and leaves the previous state
    /// untouched; no partial persona or plan data is ever stored. Success
    /// atomically replaces the campaign and resets the simulated clock; a
    /// running auto-pilot is disarmed first.
    pub async fn start_campaign(&self, niche: &str, goal: CampaignGoal) -> EngineResult<()> {
        self.disarm_autopilot().await;

        info!("Researching personas for {} in \"{}\".", goal, niche);
        emit(&self.events, EngineEvent::ResearchStarted { niche: niche.to_string() });
        let personas = self.app.research_adapter.research_personas(niche, goal).await?;

        info!("Synthesizing the day-by-day plan.");
        emit(&self.events, EngineEvent::PlanSynthesisStarted);
        let drafts = self
            .app
            .plan_adapter
            .synthesize_plan(niche, goal, &personas)
            .await?;
        let plan = CampaignPlan::from_drafts(drafts, self.app.config.shape.days)?;

        let days = plan.len();
        let persona_count = personas.len();
        {
            let mut state = self.campaign.lock().await;
            state.replace_campaign(
                niche.to_string(),
                goal,
                personas,
                plan,
                self.app.config.post_interval_ticks,
            );
        }

        info!("Campaign ready: {} days, {} personas.", days, persona_count);
        emit(&self.events, EngineEvent::CampaignReady { days, personas: persona_count });
        Ok(())
    }

    /// The simulated publishing-target handshake. The real integration is
    /// out of scope; this just waits the configured delay and flips the
    /// connection flag.
    pub async fn connect_publishing_target(&self) {
        tokio::time::sleep(self.app.config.connect_delay).await;
        self.campaign.lock().await.connected = true;
        info!("Publishing target connected.");
        emit(&self.events, EngineEvent::PublishingConnected);
    }

    /// Requests asset generation for a single item. Idempotent: an item
    /// that already has an image, or already has a request in flight,
    /// results in a no-op and no provider call.
    pub async fn request_image(&self, index: usize) -> EngineResult<ImageOutcome> {
        generate_single(
            self.app.clone(),
            self.campaign.clone(),
            self.events.clone(),
            index,
        )
        .await
    }

    /// Runs one batch asset-generation pass over up to `max_items`
    /// eligible items. Only one batch may run at a time; an overlapping
    /// request is rejected with `BatchAlreadyRunning` and changes nothing.
    pub async fn request_batch(&self, max_items: usize) -> EngineResult<BatchReport> {
        if self
            .batch_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::BatchAlreadyRunning);
        }

        let result = batch_process(
            self.app.clone(),
            self.campaign.clone(),
            self.events.clone(),
            max_items,
        )
        .await;

        // The single-flight guard is released on every exit path.
        self.batch_active.store(false, Ordering::SeqCst);
        result
    }

    /// Arms the auto-pilot scheduler. Rejected with `NotConnected` before
    /// any state change when the publishing target handshake has not
    /// completed. Re-arming always restarts the countdown at the full
    /// interval; arming an already-armed engine is a no-op.
    pub async fn arm_autopilot(&self) -> EngineResult<()> {
        let mut slot = self.autopilot.lock().await;
        if let Some(handle) = slot.as_ref() {
            if !handle.task.is_finished() {
                return Ok(());
            }
        }

        {
            let mut state = self.campaign.lock().await;
            if !state.connected {
                return Err(EngineError::NotConnected);
            }
            state.autopilot = AutopilotStatus::Armed;
            state.clock.rewind(self.app.config.post_interval_ticks);
        }

        let token = CancellationToken::new();
        let task = {
            let app = self.app.clone();
            let campaign = self.campaign.clone();
            let events = self.events.clone();
            let token = token.clone();
            tokio::spawn(async move {
                if let Err(e) = autopilot_process(app, campaign, events, token).await {
                    error!("Auto-pilot task failed: {:?}", e);
                }
            })
        };
        *slot = Some(AutopilotHandle { token, task });

        emit(&self.events, EngineEvent::AutopilotArmed);
        Ok(())
    }

    /// Disarms the auto-pilot. Future ticks are cancelled; a publish that
    /// already happened is never undone. The discarded countdown does not
    /// carry over to the next arming.
    pub async fn disarm_autopilot(&self) {
        let mut slot = self.autopilot.lock().await;
        if let Some(handle) = slot.take() {
            handle.token.cancel();
        }

        let mut state = self.campaign.lock().await;
        if state.autopilot == AutopilotStatus::Armed {
            state.autopilot = AutopilotStatus::Idle;
            info!("Auto-pilot disarmed by request.");
            emit(&self.events, EngineEvent::AutopilotDisarmed);
        }
    }
}
