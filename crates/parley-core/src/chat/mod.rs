//! Chat turn orchestration.
//!
//! The orchestrator composes the usage gate, message logging, agent
//! resolution, tool loading and sanitization around one streamed model call.

pub mod history;
pub mod intent;
pub mod logger;
pub mod orchestrator;
pub mod repository;
pub mod sanitize;
pub mod stream;

pub use orchestrator::{ChatOrchestrator, OrchestratorParts, TurnResponse};
pub use stream::{TurnEvent, TurnEventStream};
