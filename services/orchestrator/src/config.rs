//! services/orchestrator/src/config.rs
//!
//! Defines the engine's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The
//! `.env` file is used for local development.

use social_pilot_core::domain::CampaignShape;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub research_model: String,
    pub plan_model: String,
    pub image_model: String,
    /// Campaign length and funnel phase boundaries.
    pub shape: CampaignShape,
    /// Wall-clock duration of one scheduler tick.
    pub tick_interval: Duration,
    /// Number of ticks between automatic publishes.
    pub post_interval_ticks: u32,
    /// Default per-invocation cap for the batch asset pipeline.
    pub batch_limit: usize,
    /// Simulated publishing-target handshake delay.
    pub connect_delay: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for
    /// development, but this is skipped in test environments to keep tests
    /// hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Provider Settings ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let research_model =
            std::env::var("RESEARCH_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let plan_model = std::env::var("PLAN_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let image_model =
            std::env::var("IMAGE_MODEL").unwrap_or_else(|_| "dall-e-3".to_string());

        // --- Campaign Shape ---
        let days = parse_var("CAMPAIGN_DAYS", 30u32)?;
        let growth_until = parse_var("GROWTH_PHASE_END", 7u32)?;
        let trust_until = parse_var("TRUST_PHASE_END", 21u32)?;
        let shape = CampaignShape::new(days, growth_until, trust_until)
            .map_err(|e| ConfigError::InvalidValue("CAMPAIGN_DAYS".to_string(), e))?;

        // --- Scheduler and Pipeline Settings ---
        let tick_interval_ms = parse_var("TICK_INTERVAL_MS", 1_000u64)?;
        let post_interval_ticks = parse_var("POST_INTERVAL_TICKS", 60u32)?;
        if post_interval_ticks == 0 {
            return Err(ConfigError::InvalidValue(
                "POST_INTERVAL_TICKS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let batch_limit = parse_var("BATCH_LIMIT", 5usize)?;
        let connect_delay_ms = parse_var("CONNECT_DELAY_MS", 1_200u64)?;

        Ok(Self {
            log_level,
            openai_api_key,
            research_model,
            plan_model,
            image_model,
            shape,
            tick_interval: Duration::from_millis(tick_interval_ms),
            post_interval_ticks,
            batch_limit,
            connect_delay: Duration::from_millis(connect_delay_ms),
        })
    }
}

/// Reads an environment variable, falling back to a default when unset and
/// failing on an unparseable value.
fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
