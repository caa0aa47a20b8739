//! Conversation module for Describo
//!
//! The state value and its pure transitions live in [`state`]; the engine
//! that drives them against a model provider lives in [`engine`].

pub mod engine;
pub mod state;

pub use engine::{ConversationEngine, StateObserver, TurnOutcome};
pub use state::{transition, ConversationState, Event, Phase, TurnKind};
