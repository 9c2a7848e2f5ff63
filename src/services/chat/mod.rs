//! Chat Sessions
//!
//! - `orchestrator` - the session state machine front ends drive
//! - `state` - transient view state of the active session
//! - `turn` - background driver for one conversation turn
//! - `title` - session title derivation

pub mod orchestrator;
pub mod state;
pub mod title;
mod turn;

pub use orchestrator::{
    new_session_id, ChatOrchestrator, OrchestratorSettings, RejectReason, SubmitOutcome,
};
pub use state::{ChatState, TurnPhase};
pub use title::{generate_session_title, DEFAULT_SESSION_TITLE};
