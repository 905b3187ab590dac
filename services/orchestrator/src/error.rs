//! services/orchestrator/src/error.rs
//!
//! Defines the primary error type for the entire orchestrator service.

use crate::config::ConfigError;
use social_pilot_core::plan::PlanError;
use social_pilot_core::ports::PortError;

/// The primary error type for the `orchestrator` service.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents a rejected plan-repository operation.
    #[error("Plan Error: {0}")]
    Plan(#[from] PlanError),

    /// A batch generation run was requested while one is already active.
    /// Overlapping requests are coalesced, not queued.
    #[error("A batch generation run is already in progress")]
    BatchAlreadyRunning,

    /// The auto-pilot cannot be armed before the publishing target
    /// handshake has completed.
    #[error("The publishing target is not connected")]
    NotConnected,

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// A convenience type alias for `Result<T, EngineError>`.
pub type EngineResult<T> = Result<T, EngineError>;
