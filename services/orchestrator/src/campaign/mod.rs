pub mod autopilot_task;
pub mod batch_task;
pub mod engine;
pub mod protocol;
pub mod state;

// Re-export the facade and its event protocol to make them easily
// accessible to the binary and to presentation-layer consumers.
pub use engine::CampaignEngine;
pub use protocol::EngineEvent;
