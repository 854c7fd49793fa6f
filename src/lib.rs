//! Wealth Coach Agent
//!
//! A slot-filling financial chatbot core:
//! - Collects a financial profile turn-by-turn via a dialogue state machine
//! - Computes a two-phase compound-growth wealth projection once complete
//! - Gates every free-text turn through a rule-based guardrail before the
//!   external AI responder is consulted
//!
//! TURN FLOW:
//! INPUT → STAGE DISPATCH → (VALIDATE+MERGE | PROJECT | GUARDRAIL → RESPOND)

pub mod api;
pub mod dialogue;
pub mod error;
pub mod guardrail;
pub mod memory;
pub mod models;
pub mod projection;
pub mod report;
pub mod responder;

pub use error::{AgentError, ResponderError, Result};

// Re-export common types
pub use dialogue::DialogueManager;
pub use models::*;
