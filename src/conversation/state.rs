//! Conversation state and its transitions
//!
//! [`ConversationState`] is a plain value. Every change goes through
//! [`transition`], a pure function of the previous state and an [`Event`],
//! which keeps the engine's bookkeeping separate from how the state is shown.

use crate::providers::{Message, Role};
use crate::upload::ImageSummary;

/// Which kind of turn is in flight, or was last attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    /// Image-bearing opening turn
    First,
    /// Text-only turn on an existing session
    FollowUp,
}

/// Phase of the conversation, derived from the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No image
    Idle,
    /// Image present, no session
    ImageStaged,
    /// First message sent, session being created or streaming
    AwaitingFirstResponse,
    /// Session exists, idle between turns
    Conversing,
    /// Later message sent, streaming
    AwaitingResponse,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::ImageStaged => "image staged",
            Phase::AwaitingFirstResponse => "awaiting first response",
            Phase::Conversing => "conversing",
            Phase::AwaitingResponse => "awaiting response",
        };
        f.write_str(name)
    }
}

/// Snapshot of one conversation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    /// Staged image, if any
    pub image: Option<ImageSummary>,
    /// Id of the open session
    pub session_id: Option<String>,
    /// Transcript in send order
    pub messages: Vec<Message>,
    /// A turn is in flight
    pub loading: bool,
    /// Human-readable description of the last failure
    pub error: Option<String>,
    /// Kind of the current or last turn
    pub turn: Option<TurnKind>,
}

impl ConversationState {
    /// Derive the phase
    pub fn phase(&self) -> Phase {
        match (self.image.is_some(), self.loading, self.turn) {
            (false, _, _) => Phase::Idle,
            (true, true, Some(TurnKind::FollowUp)) => Phase::AwaitingResponse,
            (true, true, _) => Phase::AwaitingFirstResponse,
            (true, false, _) if self.session_id.is_some() => Phase::Conversing,
            (true, false, _) => Phase::ImageStaged,
        }
    }

    /// Text of the last model message, if it has any
    pub fn last_model_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Model)
            .map(|m| m.text.as_str())
            .filter(|t| !t.is_empty())
    }
}

/// Something that happened to the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A new image passed validation
    ImageStaged(ImageSummary),
    /// An upload was rejected
    ImageRejected(String),
    /// The user sent a message; starts a turn
    UserMessage(String),
    /// A session was created for the staged image
    SessionOpened(String),
    /// The request was accepted; an empty model message awaits chunks
    ModelPlaceholder,
    /// A streamed fragment arrived
    Chunk(String),
    /// The stream completed
    TurnCompleted,
    /// The turn failed
    TurnFailed(String),
    /// Back to idle
    Reset,
}

/// Apply an event, producing the next state
///
/// # Examples
///
/// ```
/// use describo::conversation::{transition, ConversationState, Event, Phase};
///
/// let state = transition(ConversationState::default(), Event::UserMessage("hi".into()));
/// // Without a staged image a message does not start a turn
/// assert_eq!(state.phase(), Phase::Idle);
/// assert!(state.messages.is_empty());
/// ```
pub fn transition(mut state: ConversationState, event: Event) -> ConversationState {
    match event {
        Event::ImageStaged(summary) => ConversationState {
            image: Some(summary),
            ..ConversationState::default()
        },
        Event::ImageRejected(message) => ConversationState {
            error: Some(message),
            ..ConversationState::default()
        },
        Event::UserMessage(text) => {
            if state.image.is_none() || state.loading {
                return state;
            }
            state.messages.push(Message::user(text));
            state.loading = true;
            state.error = None;
            state.turn = Some(if state.session_id.is_some() {
                TurnKind::FollowUp
            } else {
                TurnKind::First
            });
            state
        }
        Event::SessionOpened(id) => {
            if state.image.is_some() {
                state.session_id = Some(id);
            }
            state
        }
        Event::ModelPlaceholder => {
            if state.loading {
                state.messages.push(Message::model(""));
            }
            state
        }
        Event::Chunk(text) => {
            if let Some(last) = state.messages.len().checked_sub(1) {
                if state.messages[last].role == Role::Model {
                    state.messages[last].text.push_str(&text);
                }
            }
            state
        }
        Event::TurnCompleted => {
            // A first turn with no reply text leaves nothing for the session to build on
            if state.turn == Some(TurnKind::First) && state.last_model_text().is_none() {
                state.session_id = None;
            }
            state.loading = false;
            state
        }
        Event::TurnFailed(message) => {
            // An unfinished first turn leaves no usable session
            if state.turn == Some(TurnKind::First) {
                state.session_id = None;
            }
            state.loading = false;
            state.error = Some(message);
            state
        }
        Event::Reset => ConversationState::default(),
    }
}
