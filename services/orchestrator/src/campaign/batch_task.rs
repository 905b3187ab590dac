//! services/orchestrator/src/campaign/batch_task.rs
//!
//! This module contains the asynchronous "worker" functions for asset
//! generation: the single-item cycle shared with on-demand requests, and
//! the capped, strictly sequential batch run built on top of it.

use crate::campaign::{
    protocol::{emit, EngineEvent},
    state::{AppState, CampaignState},
};
use crate::error::EngineResult;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use social_pilot_core::plan::GenerationStart;
use std::sync::Arc;
use tokio::sync::{mpsc::UnboundedSender, Mutex};
use tracing::{error, info, warn};

/// The outcome of one item's generation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOutcome {
    /// The asset was generated and stored.
    Generated,
    /// The provider call failed; the item reverted to pending.
    Failed,
    /// The item was not eligible (already has an image or a request in
    /// flight); nothing changed.
    Skipped,
}

/// The final tally of one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub completed: usize,
    pub total: usize,
}

/// Runs the full generation cycle for one item: reserve it in the plan
/// repository, call the provider, then reconcile the result against
/// whatever happened to the item in the meantime.
pub async fn generate_single(
    app: Arc<AppState>,
    campaign: Arc<Mutex<CampaignState>>,
    events: UnboundedSender<EngineEvent>,
    index: usize,
) -> EngineResult<ImageOutcome> {
    let (request, day) = {
        let mut state = campaign.lock().await;
        match state.plan.begin_generation(index)? {
            GenerationStart::AlreadyHasImage | GenerationStart::InFlight => {
                return Ok(ImageOutcome::Skipped);
            }
            GenerationStart::Started => {}
        }
        let request = state.image_request_for(index)?;
        let day = state.plan.item(index)?.day;
        (request, day)
    };

    match app.image_adapter.generate_image(&request).await {
        Ok(bytes) => {
            let url = format!("data:image/png;base64,{}", BASE64.encode(&bytes));
            let mut state = campaign.lock().await;
            state.plan.complete_generation(index, url)?;
            info!("Generated visual asset for day {}.", day);
            emit(&events, EngineEvent::ItemImageReady { day });
            Ok(ImageOutcome::Generated)
        }
        Err(e) => {
            warn!("Image generation for day {} failed: {}", day, e);
            let mut state = campaign.lock().await;
            state.plan.fail_generation(index)?;
            emit(&events, EngineEvent::ItemImageFailed { day });
            Ok(ImageOutcome::Failed)
        }
    }
}

/// The main asynchronous task for one batch asset-generation run.
///
/// Selects up to `max_items` eligible items in ascending day order and
/// processes them strictly one at a time. A single item's failure is
/// absorbed and the run continues; progress is published after every item.
/// The caller holds the single-flight guard for the duration of this call.
pub async fn batch_process(
    app: Arc<AppState>,
    campaign: Arc<Mutex<CampaignState>>,
    events: UnboundedSender<EngineEvent>,
    max_items: usize,
) -> EngineResult<BatchReport> {
    let selected = {
        let state = campaign.lock().await;
        state.plan.find_next_imageless(max_items)
    };
    let total = selected.len();
    info!("Batch generation started for {} items.", total);
    emit(&events, EngineEvent::BatchStarted { total });

    let mut completed = 0;
    for index in selected {
        match generate_single(app.clone(), campaign.clone(), events.clone(), index).await {
            Ok(_) => {}
            // Repository rejections are logged as a skip; the batch goes on.
            Err(e) => error!("Batch item {} was skipped: {}", index, e),
        }
        completed += 1;
        emit(&events, EngineEvent::BatchProgress { completed, total });
    }

    info!("Batch generation finished: {}/{} items processed.", completed, total);
    emit(&events, EngineEvent::BatchFinished { completed, total });
    Ok(BatchReport { completed, total })
}
