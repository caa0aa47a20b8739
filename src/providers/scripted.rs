//! Scripted provider for tests and offline runs
//!
//! Replays queued replies and records every call it receives, so engine
//! behavior can be asserted without a network. Replies are consumed in FIFO
//! order across all sessions of one provider.

use crate::error::{DescriboError, Result};
use crate::providers::{ChatSession, ChunkStream, ModelProvider};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// A call observed by the scripted provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedCall {
    /// `create_session` was called
    CreateSession { model: String },
    /// `send_first_turn` was called
    FirstTurn {
        session_id: String,
        text: String,
        mime_type: String,
        image_base64: String,
    },
    /// `send_turn` was called
    Turn { session_id: String, text: String },
}

/// One queued reply
enum ScriptedReply {
    Chunks(Vec<String>),
    FailRequest(String),
    FailMidStream { chunks: Vec<String>, message: String },
    Gated(mpsc::UnboundedReceiver<Result<String>>),
}

/// Feeds a gated reply from the test body
///
/// Dropping the sender (or calling [`ChunkSender::finish`]) completes the
/// stream.
#[derive(Debug, Clone)]
pub struct ChunkSender {
    tx: mpsc::UnboundedSender<Result<String>>,
}

impl ChunkSender {
    /// Deliver a chunk; returns false once the stream consumer is gone
    pub fn send(&self, text: impl Into<String>) -> bool {
        self.tx.send(Ok(text.into())).is_ok()
    }

    /// Fail the stream with a stream error
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.tx
            .send(Err(DescriboError::Stream(message.into()).into()))
            .is_ok()
    }

    /// Complete the stream
    pub fn finish(self) {}
}

#[derive(Default)]
struct Shared {
    calls: Vec<ScriptedCall>,
    replies: VecDeque<ScriptedReply>,
    session_failures: VecDeque<String>,
    sessions_created: usize,
}

/// Provider that replays scripted replies
///
/// Cloning shares the script and the call log, so a test can keep a handle
/// while the engine owns another.
///
/// # Examples
///
/// ```
/// use describo::providers::{ModelProvider, ScriptedProvider};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let provider = ScriptedProvider::new();
/// provider.push_chunks(["Hola", " mundo"]);
///
/// let session = provider.create_session("test-model").await?;
/// let chunks: Vec<String> = session
///     .send_turn("hi")
///     .await?
///     .map(|c| c.unwrap())
///     .collect()
///     .await;
/// assert_eq!(chunks.concat(), "Hola mundo");
/// assert_eq!(provider.session_count(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    shared: Arc<Mutex<Shared>>,
}

impl ScriptedProvider {
    /// Create a provider with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    fn with_shared<T>(&self, f: impl FnOnce(&mut Shared) -> T) -> T {
        let mut shared = match self.shared.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut shared)
    }

    fn push(&self, reply: ScriptedReply) {
        self.with_shared(|s| s.replies.push_back(reply));
    }

    /// Queue a reply that streams the given chunks and completes
    pub fn push_chunks<I, S>(&self, chunks: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(ScriptedReply::Chunks(
            chunks.into_iter().map(Into::into).collect(),
        ));
    }

    /// Queue a reply whose request is rejected before streaming
    pub fn push_request_failure(&self, message: impl Into<String>) {
        self.push(ScriptedReply::FailRequest(message.into()));
    }

    /// Queue a reply that streams some chunks and then fails
    pub fn push_stream_failure<I, S>(&self, chunks: I, message: impl Into<String>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(ScriptedReply::FailMidStream {
            chunks: chunks.into_iter().map(Into::into).collect(),
            message: message.into(),
        });
    }

    /// Queue a reply driven by the returned sender
    pub fn push_gated(&self) -> ChunkSender {
        let (tx, rx) = mpsc::unbounded_channel();
        self.push(ScriptedReply::Gated(rx));
        ChunkSender { tx }
    }

    /// Make the next `create_session` call fail
    pub fn fail_next_session(&self, message: impl Into<String>) {
        self.with_shared(|s| s.session_failures.push_back(message.into()));
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<ScriptedCall> {
        self.with_shared(|s| s.calls.clone())
    }

    /// Number of `create_session` calls
    pub fn session_count(&self) -> usize {
        self.count(|c| matches!(c, ScriptedCall::CreateSession { .. }))
    }

    /// Number of `send_first_turn` calls
    pub fn first_turn_count(&self) -> usize {
        self.count(|c| matches!(c, ScriptedCall::FirstTurn { .. }))
    }

    /// Number of `send_turn` calls
    pub fn turn_count(&self) -> usize {
        self.count(|c| matches!(c, ScriptedCall::Turn { .. }))
    }

    fn count(&self, pred: impl Fn(&ScriptedCall) -> bool) -> usize {
        self.with_shared(|s| s.calls.iter().filter(|c| pred(c)).count())
    }

    fn next_stream(&self) -> Result<ChunkStream> {
        let reply = self.with_shared(|s| s.replies.pop_front());
        match reply {
            Some(ScriptedReply::Chunks(chunks)) => {
                let items: Vec<Result<String>> = chunks.into_iter().map(Ok).collect();
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Some(ScriptedReply::FailRequest(message)) => {
                Err(DescriboError::Request(message).into())
            }
            Some(ScriptedReply::FailMidStream { chunks, message }) => {
                let mut items: Vec<Result<String>> = chunks.into_iter().map(Ok).collect();
                items.push(Err(DescriboError::Stream(message).into()));
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Some(ScriptedReply::Gated(rx)) => Ok(Box::pin(UnboundedReceiverStream::new(rx))),
            None => Err(DescriboError::Request("No scripted reply queued".to_string()).into()),
        }
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn create_session(&self, model: &str) -> Result<Arc<dyn ChatSession>> {
        let outcome = self.with_shared(|s| {
            s.calls.push(ScriptedCall::CreateSession {
                model: model.to_string(),
            });
            match s.session_failures.pop_front() {
                Some(message) => Err(message),
                None => {
                    s.sessions_created += 1;
                    Ok(s.sessions_created)
                }
            }
        });

        match outcome {
            Ok(n) => Ok(Arc::new(ScriptedSession {
                id: format!("scripted-{}", n),
                provider: self.clone(),
            })),
            Err(message) => Err(DescriboError::Request(message).into()),
        }
    }
}

struct ScriptedSession {
    id: String,
    provider: ScriptedProvider,
}

#[async_trait]
impl ChatSession for ScriptedSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send_first_turn(
        &self,
        text: &str,
        image_base64: &str,
        mime_type: &str,
    ) -> Result<ChunkStream> {
        self.provider.with_shared(|s| {
            s.calls.push(ScriptedCall::FirstTurn {
                session_id: self.id.clone(),
                text: text.to_string(),
                mime_type: mime_type.to_string(),
                image_base64: image_base64.to_string(),
            })
        });
        self.provider.next_stream()
    }

    async fn send_turn(&self, text: &str) -> Result<ChunkStream> {
        self.provider.with_shared(|s| {
            s.calls.push(ScriptedCall::Turn {
                session_id: self.id.clone(),
                text: text.to_string(),
            })
        });
        self.provider.next_stream()
    }
}
