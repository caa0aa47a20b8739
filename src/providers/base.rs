//! Base provider traits and common types for Describo
//!
//! The conversation engine talks to the hosted model only through these
//! traits: a [`ModelProvider`] opens [`ChatSession`]s, and a session turns
//! each user turn into a [`ChunkStream`] of text fragments.

use crate::error::Result;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;

/// Lazy, finite, forward-only sequence of response fragments
///
/// A stream is consumed once and cannot be restarted. An `Err` item ends the
/// turn with a failure.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Role of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sent by the person at the keyboard
    User,
    /// Produced by the hosted model
    Model,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Model => write!(f, "model"),
        }
    }
}

/// Message structure for the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent it
    pub role: Role,
    /// Text content; grows in place while a model reply streams
    pub text: String,
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use describo::providers::{Message, Role};
    ///
    /// let msg = Message::user("What is in this picture?");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Creates a new model message
    ///
    /// # Examples
    ///
    /// ```
    /// use describo::providers::{Message, Role};
    ///
    /// let msg = Message::model("");
    /// assert_eq!(msg.role, Role::Model);
    /// assert!(msg.text.is_empty());
    /// ```
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Multi-turn exchange with the hosted model, anchored to one image
///
/// Implementations keep whatever history the provider needs. The first turn
/// carries the image; later turns are text only.
#[async_trait]
pub trait ChatSession: Send + Sync {
    /// Stable identifier of this session
    fn id(&self) -> &str;

    /// Send the opening turn: the user's text plus the inline image
    ///
    /// # Arguments
    ///
    /// * `text` - The user's question
    /// * `image_base64` - Image bytes as base64 without data-URI framing
    /// * `mime_type` - Declared MIME type of the image
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be issued or is rejected
    async fn send_first_turn(
        &self,
        text: &str,
        image_base64: &str,
        mime_type: &str,
    ) -> Result<ChunkStream>;

    /// Send a later, text-only turn
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be issued or is rejected
    async fn send_turn(&self, text: &str) -> Result<ChunkStream>;
}

/// Factory for chat sessions
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use describo::error::Result;
/// use describo::providers::{ChatSession, ChunkStream, ModelProvider};
/// use std::sync::Arc;
///
/// struct Echo;
///
/// #[async_trait]
/// impl ChatSession for Echo {
///     fn id(&self) -> &str {
///         "echo"
///     }
///
///     async fn send_first_turn(&self, text: &str, _b64: &str, _mime: &str) -> Result<ChunkStream> {
///         self.send_turn(text).await
///     }
///
///     async fn send_turn(&self, text: &str) -> Result<ChunkStream> {
///         let chunks: Vec<Result<String>> = vec![Ok(text.to_string())];
///         Ok(Box::pin(futures::stream::iter(chunks)))
///     }
/// }
///
/// struct EchoProvider;
///
/// #[async_trait]
/// impl ModelProvider for EchoProvider {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     async fn create_session(&self, _model: &str) -> Result<Arc<dyn ChatSession>> {
///         Ok(Arc::new(Echo))
///     }
/// }
/// ```
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Short provider name for logs and status output
    fn name(&self) -> &str;

    /// Open a new session against the given model
    ///
    /// # Errors
    ///
    /// Returns error if the session cannot be created
    async fn create_session(&self, model: &str) -> Result<Arc<dyn ChatSession>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::user("hi").role, Role::User);
        assert_eq!(Message::model("hello").text, "hello");
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Model.to_string(), "model");
    }

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_string(&Message::model("Hola")).unwrap();
        assert_eq!(json, r#"{"role":"model","text":"Hola"}"#);
    }
}
