//! services/orchestrator/src/bin/orchestrator.rs
//!
//! Runs one campaign end-to-end from the command line: research personas,
//! synthesize the plan, connect the (simulated) publishing target, backfill
//! visual assets for the first batch, then let the auto-pilot publish the
//! campaign while events stream to the log.

use async_openai::{config::OpenAIConfig, types::images::ImageModel, Client};
use orchestrator_lib::{
    adapters::{OpenAiImageAdapter, OpenAiPlanAdapter, OpenAiResearchAdapter},
    campaign::{CampaignEngine, EngineEvent},
    config::Config,
    error::EngineError,
};
use social_pilot_core::domain::CampaignGoal;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting campaign engine...");

    // --- 2. Read the Niche and Goal From the Command Line ---
    let mut args = std::env::args().skip(1);
    let niche = args
        .next()
        .ok_or_else(|| EngineError::Internal("usage: orchestrator <niche> [goal]".to_string()))?;
    let goal = match args.next() {
        Some(raw) => raw.parse::<CampaignGoal>().map_err(EngineError::Internal)?,
        None => CampaignGoal::ThemePage,
    };

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| EngineError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    let openai_client = Client::with_config(openai_config);

    let research_adapter = Arc::new(OpenAiResearchAdapter::new(
        openai_client.clone(),
        config.research_model.clone(),
    ));
    let plan_adapter = Arc::new(OpenAiPlanAdapter::new(
        openai_client.clone(),
        config.plan_model.clone(),
        config.shape,
    ));
    let image_model = match config.image_model.as_str() {
        "dall-e-2" => ImageModel::DallE2,
        "dall-e-3" => ImageModel::DallE3,
        other => ImageModel::Other(other.to_string()),
    };
    let image_adapter = Arc::new(OpenAiImageAdapter::new(openai_client, image_model));

    // --- 4. Build the Shared AppState and the Engine ---
    let app_state = Arc::new(orchestrator_lib::campaign::state::AppState {
        config: config.clone(),
        research_adapter,
        plan_adapter,
        image_adapter,
    });
    let (engine, mut events) = CampaignEngine::new(app_state);

    // --- 5. Run the Campaign ---
    engine.start_campaign(&niche, goal).await?;
    engine.connect_publishing_target().await;
    engine.request_batch(config.batch_limit).await?;
    engine.arm_autopilot().await?;

    // --- 6. Stream Engine Events Until the Mission Completes ---
    while let Some(event) = events.recv().await {
        info!("Engine event: {:?}", event);
        if event == EngineEvent::MissionComplete {
            break;
        }
    }

    let stats = engine.stats().await;
    info!(
        "Campaign finished: {} posted, {} remaining, average viral score {}.",
        stats.posted, stats.remaining, stats.average_viral_score
    );
    Ok(())
}
