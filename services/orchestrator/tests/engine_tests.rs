//! services/orchestrator/tests/engine_tests.rs
//!
//! End-to-end tests for the campaign orchestration engine, driven through
//! the facade with stub provider adapters standing in for the ports.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use orchestrator_lib::campaign::batch_task::ImageOutcome;
use orchestrator_lib::campaign::state::{AppState, AutopilotStatus};
use orchestrator_lib::campaign::{CampaignEngine, EngineEvent};
use orchestrator_lib::config::Config;
use orchestrator_lib::error::EngineError;
use social_pilot_core::domain::{
    CampaignGoal, CampaignShape, ContentStatus, ContentType, Persona, PlanItemDraft,
};
use social_pilot_core::ports::{
    ImageGenerationService, ImageRequest, PersonaResearchService, PlanSynthesisService, PortError,
    PortResult,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Notify;
use tracing::Level;

//=========================================================================================
// Stub Adapters
//=========================================================================================

struct StubResearch {
    fail: bool,
}

#[async_trait]
impl PersonaResearchService for StubResearch {
    async fn research_personas(
        &self,
        _niche: &str,
        _goal: CampaignGoal,
    ) -> PortResult<Vec<Persona>> {
        if self.fail {
            return Err(PortError::MalformedResponse(
                "missing field `handle`".to_string(),
            ));
        }
        Ok((1..=3)
            .map(|i| Persona {
                name: format!("Persona {}", i),
                handle: format!("@persona{}", i),
                strategy: "Teach daily".to_string(),
                hook_style: "Bold claims".to_string(),
                visual_aesthetic: "Neon gradients".to_string(),
            })
            .collect())
    }
}

struct StubPlan {
    drafts: Vec<PlanItemDraft>,
}

#[async_trait]
impl PlanSynthesisService for StubPlan {
    async fn synthesize_plan(
        &self,
        _niche: &str,
        _goal: CampaignGoal,
        _personas: &[Persona],
    ) -> PortResult<Vec<PlanItemDraft>> {
        Ok(self.drafts.clone())
    }
}

/// Blocks the first generation call on a gate so a test can interleave
/// other operations while that request is "in flight".
struct Gate {
    entered: Notify,
    release: Notify,
    armed: AtomicBool,
}

impl Gate {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            entered: Notify::new(),
            release: Notify::new(),
            armed: AtomicBool::new(true),
        })
    }
}

struct StubImages {
    calls: AtomicUsize,
    gate: Option<Arc<Gate>>,
}

impl StubImages {
    fn new() -> Self {
        Self { calls: AtomicUsize::new(0), gate: None }
    }

    fn gated(gate: Arc<Gate>) -> Self {
        Self { calls: AtomicUsize::new(0), gate: Some(gate) }
    }
}

#[async_trait]
impl ImageGenerationService for StubImages {
    async fn generate_image(&self, request: &ImageRequest) -> PortResult<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            if gate.armed.swap(false, Ordering::SeqCst) {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
        }
        if request.visual_prompt.contains("FAIL") {
            return Err(PortError::GenerationFailed("provider refused".to_string()));
        }
        Ok(Bytes::from_static(b"\x89PNG fake"))
    }
}

//=========================================================================================
// Test Fixtures
//=========================================================================================

fn drafts(days: u32) -> Vec<PlanItemDraft> {
    (1..=days)
        .map(|day| PlanItemDraft {
            day,
            content_type: if day % 2 == 0 { ContentType::Post } else { ContentType::Reel },
            topic: format!("topic {}", day),
            hook: format!("hook {}", day),
            caption: format!("caption {}", day),
            hashtags: vec!["#one".to_string(), "#two".to_string()],
            visual_prompt: format!("visual {}", day),
        })
        .collect()
}

fn test_config(days: u32, post_interval_ticks: u32) -> Config {
    Config {
        log_level: Level::INFO,
        openai_api_key: None,
        research_model: "stub".to_string(),
        plan_model: "stub".to_string(),
        image_model: "stub".to_string(),
        shape: CampaignShape { days, growth_until: 1, trust_until: 2 },
        tick_interval: Duration::from_millis(10),
        post_interval_ticks,
        batch_limit: 5,
        connect_delay: Duration::from_millis(5),
    }
}

struct Harness {
    engine: Arc<CampaignEngine>,
    events: UnboundedReceiver<EngineEvent>,
    images: Arc<StubImages>,
}

fn harness_with(
    config: Config,
    research_fail: bool,
    plan_drafts: Vec<PlanItemDraft>,
    images: StubImages,
) -> Harness {
    let images = Arc::new(images);
    let app = Arc::new(AppState {
        config: Arc::new(config),
        research_adapter: Arc::new(StubResearch { fail: research_fail }),
        plan_adapter: Arc::new(StubPlan { drafts: plan_drafts }),
        image_adapter: images.clone(),
    });
    let (engine, events) = CampaignEngine::new(app);
    Harness { engine: Arc::new(engine), events, images }
}

fn harness(days: u32, post_interval_ticks: u32) -> Harness {
    harness_with(
        test_config(days, post_interval_ticks),
        false,
        drafts(days),
        StubImages::new(),
    )
}

async fn next_event(events: &mut UnboundedReceiver<EngineEvent>) -> EngineEvent {
    tokio::time::timeout(Duration::from_secs(30), events.recv())
        .await
        .expect("timed out waiting for an engine event")
        .expect("event channel closed")
}

/// Receives events until `stop` matches, returning everything seen
/// including the matching event.
async fn collect_until(
    events: &mut UnboundedReceiver<EngineEvent>,
    stop: impl Fn(&EngineEvent) -> bool,
) -> Vec<EngineEvent> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(events).await;
        let done = stop(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

//=========================================================================================
// Campaign Generation
//=========================================================================================

#[tokio::test]
async fn start_campaign_stores_scored_scheduled_plan() {
    let mut h = harness(5, 10);
    h.engine.start_campaign("indoor plants", CampaignGoal::Creator).await.unwrap();

    let seen = collect_until(&mut h.events, |e| {
        matches!(e, EngineEvent::CampaignReady { .. })
    })
    .await;
    assert!(matches!(seen.last(), Some(EngineEvent::CampaignReady { days: 5, personas: 3 })));

    let state = h.engine.state_handle();
    let state = state.lock().await;
    let days: Vec<u32> = state.plan.items().iter().map(|i| i.day).collect();
    assert_eq!(days, vec![1, 2, 3, 4, 5]);
    for item in state.plan.items() {
        assert_eq!(item.status, ContentStatus::Scheduled);
        assert!((50..=98).contains(&item.viral_score));
        assert!(item.posted_at.is_none());
    }
    assert_eq!(state.personas.len(), 3);
}

#[tokio::test]
async fn malformed_research_aborts_with_no_partial_state() {
    let mut h = harness_with(test_config(5, 10), true, drafts(5), StubImages::new());
    let err = h.engine.start_campaign("niche", CampaignGoal::ThemePage).await.unwrap_err();
    assert!(matches!(err, EngineError::Port(PortError::MalformedResponse(_))));

    let state = h.engine.state_handle();
    let state = state.lock().await;
    assert!(state.personas.is_empty());
    assert!(state.plan.is_empty());

    // Only the research announcement went out; nothing was stored.
    let first = next_event(&mut h.events).await;
    assert!(matches!(first, EngineEvent::ResearchStarted { .. }));
}

#[tokio::test]
async fn wrong_day_count_from_provider_is_rejected() {
    // Provider returns 4 drafts for a 5-day campaign.
    let h = harness_with(test_config(5, 10), false, drafts(4), StubImages::new());
    let err = h.engine.start_campaign("niche", CampaignGoal::ThemePage).await.unwrap_err();
    assert!(matches!(err, EngineError::Plan(_)));

    let state = h.engine.state_handle();
    assert!(state.lock().await.plan.is_empty());
}

//=========================================================================================
// Batch Asset Pipeline
//=========================================================================================

#[tokio::test]
async fn batch_processes_capacity_and_reports_progress() {
    let mut h = harness(3, 10);
    h.engine.start_campaign("niche", CampaignGoal::ThemePage).await.unwrap();

    // Five requested, three imageless exist.
    let report = h.engine.request_batch(5).await.unwrap();
    assert_eq!((report.completed, report.total), (3, 3));
    assert_eq!(h.images.calls.load(Ordering::SeqCst), 3);

    let seen = collect_until(&mut h.events, |e| {
        matches!(e, EngineEvent::BatchFinished { .. })
    })
    .await;
    let progress: Vec<(usize, usize)> = seen
        .iter()
        .filter_map(|e| match e {
            EngineEvent::BatchProgress { completed, total } => Some((*completed, *total)),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);

    let state = h.engine.state_handle();
    let state = state.lock().await;
    for item in state.plan.items() {
        assert!(item.image_url.as_deref().unwrap().starts_with("data:image/png;base64,"));
        assert_eq!(item.status, ContentStatus::Scheduled);
    }
}

#[tokio::test]
async fn batch_absorbs_single_item_failures() {
    let mut failing = drafts(3);
    failing[1].visual_prompt = "FAIL on purpose".to_string();
    let mut h = harness_with(test_config(3, 10), false, failing, StubImages::new());
    h.engine.start_campaign("niche", CampaignGoal::ThemePage).await.unwrap();

    let report = h.engine.request_batch(5).await.unwrap();
    assert_eq!((report.completed, report.total), (3, 3));

    let seen = collect_until(&mut h.events, |e| {
        matches!(e, EngineEvent::BatchFinished { .. })
    })
    .await;
    assert!(seen.contains(&EngineEvent::ItemImageFailed { day: 2 }));
    assert!(seen.contains(&EngineEvent::ItemImageReady { day: 1 }));
    assert!(seen.contains(&EngineEvent::ItemImageReady { day: 3 }));

    let state = h.engine.state_handle();
    let state = state.lock().await;
    let items = state.plan.items();
    assert!(items[0].image_url.is_some());
    assert!(items[1].image_url.is_none());
    assert_eq!(items[1].status, ContentStatus::Scheduled);
    assert!(items[2].image_url.is_some());
}

#[tokio::test(start_paused = true)]
async fn overlapping_batches_are_coalesced() {
    let gate = Gate::new();
    let h = harness_with(
        test_config(3, 10),
        false,
        drafts(3),
        StubImages::gated(gate.clone()),
    );
    h.engine.start_campaign("niche", CampaignGoal::ThemePage).await.unwrap();

    let first = {
        let engine = h.engine.clone();
        tokio::spawn(async move { engine.request_batch(5).await })
    };
    gate.entered.notified().await;

    // The first batch is mid-item; a second request must be rejected
    // without touching any state.
    let err = h.engine.request_batch(5).await.unwrap_err();
    assert!(matches!(err, EngineError::BatchAlreadyRunning));

    gate.release.notify_one();
    let report = first.await.unwrap().unwrap();
    assert_eq!((report.completed, report.total), (3, 3));

    // With the single-flight guard released, a fresh batch may start.
    let report = h.engine.request_batch(5).await.unwrap();
    assert_eq!(report.total, 0);
}

#[tokio::test]
async fn request_image_is_idempotent() {
    let h = harness(1, 10);
    h.engine.start_campaign("niche", CampaignGoal::ThemePage).await.unwrap();

    assert_eq!(h.engine.request_image(0).await.unwrap(), ImageOutcome::Generated);
    assert_eq!(h.images.calls.load(Ordering::SeqCst), 1);

    // The item already has an image: no status change, no provider call.
    assert_eq!(h.engine.request_image(0).await.unwrap(), ImageOutcome::Skipped);
    assert_eq!(h.images.calls.load(Ordering::SeqCst), 1);

    let state = h.engine.state_handle();
    assert_eq!(state.lock().await.plan.items()[0].status, ContentStatus::Scheduled);
}

#[tokio::test(start_paused = true)]
async fn publication_wins_over_in_flight_generation() {
    let gate = Gate::new();
    let h = harness_with(
        test_config(1, 10),
        false,
        drafts(1),
        StubImages::gated(gate.clone()),
    );
    h.engine.start_campaign("niche", CampaignGoal::ThemePage).await.unwrap();

    let generation = {
        let engine = h.engine.clone();
        tokio::spawn(async move { engine.request_image(0).await })
    };
    gate.entered.notified().await;

    {
        let handle = h.engine.state_handle();
        let mut state = handle.lock().await;
        assert_eq!(state.plan.items()[0].status, ContentStatus::Processing);
        state.plan.mark_posted(0, Utc::now()).unwrap();
    }

    gate.release.notify_one();
    assert_eq!(generation.await.unwrap().unwrap(), ImageOutcome::Generated);

    let handle = h.engine.state_handle();
    let state = handle.lock().await;
    let item = &state.plan.items()[0];
    assert_eq!(item.status, ContentStatus::Posted);
    assert!(item.image_url.is_some());
    assert!(item.posted_at.is_some());
}

//=========================================================================================
// Auto-Pilot Scheduler
//=========================================================================================

#[tokio::test(start_paused = true)]
async fn full_autopilot_run_posts_every_day_in_order() {
    let mut h = harness(3, 2);
    h.engine.start_campaign("niche", CampaignGoal::ThemePage).await.unwrap();
    h.engine.connect_publishing_target().await;
    h.engine.arm_autopilot().await.unwrap();

    let seen = collect_until(&mut h.events, |e| *e == EngineEvent::MissionComplete).await;
    let posted_days: Vec<u32> = seen
        .iter()
        .filter_map(|e| match e {
            EngineEvent::ItemPosted { day, .. } => Some(*day),
            _ => None,
        })
        .collect();
    assert_eq!(posted_days, vec![1, 2, 3]);
    assert_eq!(next_event(&mut h.events).await, EngineEvent::AutopilotDisarmed);

    let handle = h.engine.state_handle();
    let state = handle.lock().await;
    for item in state.plan.items() {
        assert_eq!(item.status, ContentStatus::Posted);
        assert!(item.posted_at.is_some());
    }
    assert_eq!(state.clock.simulation_day, 4);
    assert_eq!(state.autopilot, AutopilotStatus::Idle);
    assert_eq!(state.stats().posted, 3);
}

#[tokio::test]
async fn arming_without_connection_is_rejected() {
    let h = harness(3, 10);
    h.engine.start_campaign("niche", CampaignGoal::ThemePage).await.unwrap();

    let err = h.engine.arm_autopilot().await.unwrap_err();
    assert!(matches!(err, EngineError::NotConnected));

    let handle = h.engine.state_handle();
    assert_eq!(handle.lock().await.autopilot, AutopilotStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn arming_with_nothing_scheduled_disarms_immediately() {
    let mut h = harness(2, 10);
    h.engine.start_campaign("niche", CampaignGoal::ThemePage).await.unwrap();
    h.engine.connect_publishing_target().await;

    // Publish everything before arming.
    {
        let handle = h.engine.state_handle();
        let mut state = handle.lock().await;
        while state.publish_next(Utc::now(), 10).unwrap().is_some() {}
    }

    h.engine.arm_autopilot().await.unwrap();
    let seen = collect_until(&mut h.events, |e| *e == EngineEvent::AutopilotDisarmed).await;
    assert!(seen.contains(&EngineEvent::MissionComplete));
    assert!(!seen.iter().any(|e| matches!(e, EngineEvent::ItemPosted { .. })));

    let handle = h.engine.state_handle();
    assert_eq!(handle.lock().await.autopilot, AutopilotStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn rearming_restarts_the_full_countdown() {
    let h = harness(3, 5);
    h.engine.start_campaign("niche", CampaignGoal::ThemePage).await.unwrap();
    h.engine.connect_publishing_target().await;
    h.engine.arm_autopilot().await.unwrap();

    // Let two ticks elapse, then disarm mid-countdown.
    tokio::time::sleep(Duration::from_millis(25)).await;
    h.engine.disarm_autopilot().await;
    {
        let handle = h.engine.state_handle();
        let state = handle.lock().await;
        assert!(state.clock.next_post_timer < 5);
        assert_eq!(state.autopilot, AutopilotStatus::Idle);
    }

    // Re-arming discards the partial countdown.
    h.engine.arm_autopilot().await.unwrap();
    let handle = h.engine.state_handle();
    let state = handle.lock().await;
    assert_eq!(state.clock.next_post_timer, 5);
    assert_eq!(state.autopilot, AutopilotStatus::Armed);
}

#[tokio::test(start_paused = true)]
async fn regeneration_resets_clock_and_disarms() {
    let mut h = harness(2, 4);
    h.engine.start_campaign("first niche", CampaignGoal::ThemePage).await.unwrap();
    h.engine.connect_publishing_target().await;
    h.engine.arm_autopilot().await.unwrap();

    // Wait for the first publish, then regenerate the campaign.
    collect_until(&mut h.events, |e| matches!(e, EngineEvent::ItemPosted { .. })).await;
    h.engine.start_campaign("second niche", CampaignGoal::Creator).await.unwrap();

    let handle = h.engine.state_handle();
    let state = handle.lock().await;
    assert_eq!(state.niche, "second niche");
    assert_eq!(state.clock.simulation_day, 1);
    assert_eq!(state.clock.next_post_timer, 4);
    assert_eq!(state.autopilot, AutopilotStatus::Idle);
    assert!(state.connected);
    assert_eq!(state.stats().posted, 0);
}
