//! services/orchestrator/src/campaign/autopilot_task.rs
//!
//! This module contains the asynchronous "worker" function for the
//! auto-pilot scheduler.

use crate::campaign::{
    protocol::{emit, EngineEvent},
    state::{AppState, AutopilotStatus, CampaignState},
};
use crate::error::EngineResult;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc::UnboundedSender, Mutex};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// The main asynchronous task for autonomous publication.
///
/// While armed, every tick decrements the campaign clock's countdown; when
/// it expires, the lowest-day `Scheduled` item is published and simulated
/// time advances. Exactly one publish happens per expiry; missed ticks are
/// skipped, never replayed as a burst. The task auto-disarms once no
/// `Scheduled` item remains, and is cancelled through the token on manual
/// deactivation (the exact point of the countdown is discarded).
pub async fn autopilot_process(
    app: Arc<AppState>,
    campaign: Arc<Mutex<CampaignState>>,
    events: UnboundedSender<EngineEvent>,
    cancellation_token: CancellationToken,
) -> EngineResult<()> {
    info!("Auto-pilot engaged.");
    let interval_ticks = app.config.post_interval_ticks;

    if disarm_when_done(&campaign, &events).await {
        return Ok(());
    }

    let mut ticker = time::interval_at(
        time::Instant::now() + app.config.tick_interval,
        app.config.tick_interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Auto-pilot deactivated.");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        let mut state = campaign.lock().await;
        if !state.clock.tick() {
            continue;
        }

        match state.publish_next(Utc::now(), interval_ticks)? {
            Some(receipt) => {
                info!(
                    "Auto-pilot published day {} item; simulation advanced to day {}.",
                    receipt.day, state.clock.simulation_day
                );
                emit(
                    &events,
                    EngineEvent::ItemPosted { day: receipt.day, posted_at: receipt.posted_at },
                );
            }
            None => {
                state.clock.rewind(interval_ticks);
            }
        }
        drop(state);

        if disarm_when_done(&campaign, &events).await {
            return Ok(());
        }
    }
}

/// Disarms the scheduler when no `Scheduled` item remains. Returns true
/// when the mission is complete and the task should stop ticking.
async fn disarm_when_done(
    campaign: &Arc<Mutex<CampaignState>>,
    events: &UnboundedSender<EngineEvent>,
) -> bool {
    let mut state = campaign.lock().await;
    if state.plan.find_next_scheduled().is_some() {
        return false;
    }

    state.autopilot = AutopilotStatus::Idle;
    info!("No scheduled items remain; auto-pilot disarmed.");
    emit(events, EngineEvent::MissionComplete);
    emit(events, EngineEvent::AutopilotDisarmed);
    true
}
