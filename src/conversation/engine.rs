//! Conversation engine
//!
//! Drives one image-anchored conversation against a [`ModelProvider`]. The
//! engine owns the image intake, the session handle and the state value; all
//! mutations happen under a `std::sync::Mutex` that is released before every
//! `.await`, so the only suspension points are the provider calls, the
//! stream and reading the staged image.
//!
//! Each reset bumps a generation counter. A turn remembers the generation it
//! started in and stops applying anything once the counter has moved, which
//! silently drops chunks that arrive after a reset or a new image.

use super::state::{transition, ConversationState, Event, Phase};
use crate::error::DescriboError;
use crate::providers::{ChatSession, ChunkStream, ModelProvider};
use crate::upload::{encode_image, ImageFile, ImageIntake, ImageSummary};

use futures::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Receives the new state after every transition
///
/// Called with the engine lock held; implementations must not call back
/// into the engine.
pub trait StateObserver: Send + Sync {
    /// Called after a transition with the resulting state
    fn on_state(&self, state: &ConversationState);
}

/// How a `send_message` call ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The reply streamed to completion
    Completed,
    /// The turn failed; the message is also in the state's `error`
    Failed(String),
    /// Nothing was sent (loading, no image, or blank text)
    Ignored,
    /// A reset happened while the turn was in flight
    Abandoned,
}

struct Inner {
    state: ConversationState,
    intake: ImageIntake,
    session: Option<Arc<dyn ChatSession>>,
    generation: u64,
}

/// Everything a turn needs, captured when it starts
struct TurnStart {
    generation: u64,
    session: Option<Arc<dyn ChatSession>>,
    image: Option<Arc<ImageFile>>,
    max_bytes: u64,
}

/// Why a turn did not produce a stream
enum StartError {
    Abandoned,
    Failed(anyhow::Error),
}

/// The conversation state machine
pub struct ConversationEngine {
    provider: Arc<dyn ModelProvider>,
    model: String,
    inner: Mutex<Inner>,
    observer: Option<Arc<dyn StateObserver>>,
}

impl ConversationEngine {
    /// Create an engine
    ///
    /// # Arguments
    ///
    /// * `provider` - Model collaborator used to open sessions
    /// * `model` - Model identifier passed to `create_session`
    /// * `intake` - Image intake holding the size ceiling
    pub fn new(provider: Arc<dyn ModelProvider>, model: impl Into<String>, intake: ImageIntake) -> Self {
        Self {
            provider,
            model: model.into(),
            inner: Mutex::new(Inner {
                state: ConversationState::default(),
                intake,
                session: None,
                generation: 0,
            }),
            observer: None,
        }
    }

    /// Attach an observer notified after every transition
    pub fn with_observer(mut self, observer: Arc<dyn StateObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Model identifier used for new sessions
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Name of the provider behind this engine
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn apply_locked(&self, inner: &mut Inner, event: Event) {
        let state = std::mem::take(&mut inner.state);
        inner.state = transition(state, event);
        if let Some(observer) = &self.observer {
            observer.on_state(&inner.state);
        }
    }

    /// Apply an event if the turn's generation is still current
    fn apply_if_current(&self, generation: u64, event: Event) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        self.apply_locked(&mut inner, event);
        true
    }

    fn reset_locked(&self, inner: &mut Inner) {
        inner.intake.reset();
        inner.session = None;
        inner.generation += 1;
        self.apply_locked(inner, Event::Reset);
    }

    /// Stage a new image
    ///
    /// Always resets first. On rejection the engine is left idle with the
    /// rejection message in `error`.
    ///
    /// # Errors
    ///
    /// Returns `DescriboError::InvalidType` or `DescriboError::TooLarge`
    pub fn submit_image(&self, file: ImageFile) -> Result<ImageSummary, DescriboError> {
        let mut inner = self.lock();
        self.reset_locked(&mut inner);

        match inner.intake.validate(file) {
            Ok(summary) => {
                self.apply_locked(&mut inner, Event::ImageStaged(summary.clone()));
                Ok(summary)
            }
            Err(e) => {
                self.apply_locked(&mut inner, Event::ImageRejected(e.to_string()));
                Err(e)
            }
        }
    }

    /// Send a user message and stream the reply into the transcript
    ///
    /// The text is trimmed. The first message of a staged image opens a
    /// session and carries the encoded image; later messages are text only.
    /// Failures never escape: they end up in the state's `error`.
    pub async fn send_message(&self, text: &str) -> TurnOutcome {
        let text = text.trim();
        if text.is_empty() {
            return TurnOutcome::Ignored;
        }

        let start = {
            let mut inner = self.lock();
            if inner.state.loading || inner.intake.staged().is_none() {
                tracing::debug!("Ignoring message in phase {}", inner.state.phase());
                return TurnOutcome::Ignored;
            }
            self.apply_locked(&mut inner, Event::UserMessage(text.to_string()));
            TurnStart {
                generation: inner.generation,
                session: inner.session.clone(),
                image: inner.intake.staged().map(|s| Arc::clone(s.file())),
                max_bytes: inner.intake.max_bytes(),
            }
        };
        let generation = start.generation;

        let stream = match self.start_turn(text, start).await {
            Ok(stream) => stream,
            Err(StartError::Abandoned) => return TurnOutcome::Abandoned,
            Err(StartError::Failed(e)) => return self.fail(generation, e),
        };

        if !self.apply_if_current(generation, Event::ModelPlaceholder) {
            return TurnOutcome::Abandoned;
        }

        self.consume(generation, stream).await
    }

    async fn start_turn(&self, text: &str, start: TurnStart) -> Result<ChunkStream, StartError> {
        if let Some(session) = start.session {
            return session.send_turn(text).await.map_err(StartError::Failed);
        }

        let image = start.image.ok_or_else(|| {
            StartError::Failed(DescriboError::Encoding("No image staged".to_string()).into())
        })?;
        let data = encode_image(&image, start.max_bytes)
            .await
            .map_err(|e| StartError::Failed(e.into()))?;

        let session = self
            .provider
            .create_session(&self.model)
            .await
            .map_err(StartError::Failed)?;

        {
            let mut inner = self.lock();
            if inner.generation != start.generation {
                return Err(StartError::Abandoned);
            }
            inner.session = Some(Arc::clone(&session));
            self.apply_locked(&mut inner, Event::SessionOpened(session.id().to_string()));
        }

        tracing::debug!(
            "Sending first turn on session {} ({}, {} base64 bytes)",
            session.id(),
            image.mime_type(),
            data.len()
        );
        session
            .send_first_turn(text, &data, image.mime_type())
            .await
            .map_err(StartError::Failed)
    }

    async fn consume(&self, generation: u64, mut stream: ChunkStream) -> TurnOutcome {
        let mut chunks = 0usize;
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    if !self.apply_if_current(generation, Event::Chunk(chunk)) {
                        tracing::debug!("Dropping late chunk from an abandoned turn");
                        return TurnOutcome::Abandoned;
                    }
                    chunks += 1;
                }
                Err(e) => return self.fail(generation, e),
            }
        }

        tracing::debug!("Turn completed after {} chunks", chunks);
        let mut inner = self.lock();
        if inner.generation != generation {
            return TurnOutcome::Abandoned;
        }
        self.apply_locked(&mut inner, Event::TurnCompleted);
        if inner.state.session_id.is_none() {
            tracing::warn!("First turn produced no reply; the image will be sent again");
            inner.session = None;
        }
        TurnOutcome::Completed
    }

    fn fail(&self, generation: u64, error: anyhow::Error) -> TurnOutcome {
        let message = format!("{:#}", error);
        let mut inner = self.lock();
        if inner.generation != generation {
            return TurnOutcome::Abandoned;
        }
        tracing::error!("Turn failed: {}", message);
        if inner.state.phase() == Phase::AwaitingFirstResponse {
            inner.session = None;
        }
        self.apply_locked(&mut inner, Event::TurnFailed(message.clone()));
        TurnOutcome::Failed(message)
    }

    /// Release the image, drop the session and clear the transcript
    pub fn reset(&self) {
        let mut inner = self.lock();
        self.reset_locked(&mut inner);
        tracing::debug!("Conversation reset");
    }

    /// Snapshot of the current state
    pub fn state(&self) -> ConversationState {
        self.lock().state.clone()
    }

    /// Id of the open session, if any
    pub fn session_id(&self) -> Option<String> {
        self.lock().session.as_ref().map(|s| s.id().to_string())
    }

    /// Text of the most recent non-empty model message
    pub fn last_model_message(&self) -> Option<String> {
        self.lock().state.last_model_text().map(str::to_string)
    }

    /// Live preview references held by this engine's intake
    pub fn live_previews(&self) -> usize {
        self.lock().intake.store().live_count()
    }
}
