//! Gemini provider implementation for Describo
//!
//! Streams replies from the Generative Language REST API
//! (`models/{model}:streamGenerateContent?alt=sse`). The API is stateless, so
//! each [`GeminiSession`] keeps the turn history and replays it with every
//! request. A turn joins the history only once its stream has completed.

use crate::config::GeminiConfig;
use crate::error::{DescriboError, Result};
use crate::providers::{sse, ChatSession, ChunkStream, ModelProvider};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Gemini content container used in both requests and history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    fn user(parts: Vec<Part>) -> Self {
        Self {
            role: "user".to_string(),
            parts,
        }
    }

    fn model(text: String) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part::Text { text }],
        }
    }
}

/// Text or inline media part. Variant order matters for untagged decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

/// Base64 inline payload for the image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
}

/// One streamed `GenerateContentResponse` event
#[derive(Debug, Default, Deserialize)]
struct StreamedResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl StreamedResponse {
    /// Concatenated visible text of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| p.thought != Some(true))
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Build a readable error from a non-success Gemini response
fn format_gemini_api_error(status: reqwest::StatusCode, body: &str) -> DescriboError {
    let detail = match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string(),
        _ => body.trim().to_string(),
    };
    DescriboError::Request(format!("Gemini returned {}: {}", status.as_u16(), detail))
}

/// Parse one SSE payload into the text it contributes
fn chunk_text(payload: &str) -> Result<String> {
    let event: StreamedResponse = serde_json::from_str(payload).map_err(|e| {
        DescriboError::Stream(format!("Malformed Gemini stream event: {}", e))
    })?;

    if let Some(error) = event.error {
        return Err(DescriboError::Stream(format!(
            "Gemini stream failed ({}{}): {}",
            error.code.map(|c| c.to_string()).unwrap_or_default(),
            error.status.map(|s| format!(" {}", s)).unwrap_or_default(),
            error.message
        ))
        .into());
    }

    Ok(event.text())
}

/// Gemini API provider
///
/// # Examples
///
/// ```
/// use describo::config::GeminiConfig;
/// use describo::providers::GeminiProvider;
///
/// let config = GeminiConfig {
///     api_key: Some("test-key".to_string()),
///     ..Default::default()
/// };
/// assert!(GeminiProvider::new(config).is_ok());
/// assert!(GeminiProvider::new(GeminiConfig::default()).is_err());
/// ```
pub struct GeminiProvider {
    client: Client,
    api_base: Url,
    api_key: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    ///
    /// # Errors
    ///
    /// Returns error if no API key is configured, the API base is not a
    /// valid URL, or the HTTP client cannot be built
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| DescriboError::MissingCredentials("gemini".to_string()))?;

        let mut base = config.api_base.trim_end_matches('/').to_string();
        base.push('/');
        let api_base = Url::parse(&base).map_err(|e| {
            DescriboError::Config(format!("Invalid Gemini api_base {}: {}", config.api_base, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("describo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DescriboError::Request(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized Gemini provider: api_base={}", api_base);

        Ok(Self {
            client,
            api_base,
            api_key,
        })
    }

    /// Streaming endpoint for a model
    fn stream_endpoint(&self, model: &str) -> Result<Url> {
        let model = model.trim().trim_start_matches("models/");
        let mut url = self
            .api_base
            .join(&format!("v1beta/models/{}:streamGenerateContent", model))
            .map_err(|e| DescriboError::Config(format!("Invalid model name {}: {}", model, e)))?;
        url.set_query(Some("alt=sse"));
        Ok(url)
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn create_session(&self, model: &str) -> Result<Arc<dyn ChatSession>> {
        let session = GeminiSession {
            id: uuid::Uuid::new_v4().to_string(),
            endpoint: self.stream_endpoint(model)?,
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            history: Arc::new(Mutex::new(Vec::new())),
        };
        tracing::info!("Created Gemini session {} for model {}", session.id, model);
        Ok(Arc::new(session))
    }
}

/// Chat session against one Gemini model
pub struct GeminiSession {
    id: String,
    endpoint: Url,
    client: Client,
    api_key: String,
    history: Arc<Mutex<Vec<Content>>>,
}

impl GeminiSession {
    /// Number of committed history entries (user and model contents)
    pub fn history_len(&self) -> usize {
        self.history.lock().map(|h| h.len()).unwrap_or_default()
    }

    async fn stream_turn(&self, user: Content) -> Result<ChunkStream> {
        let mut contents = self
            .history
            .lock()
            .map_err(|_| DescriboError::Request("Session history lock poisoned".to_string()))?
            .clone();
        contents.push(user.clone());

        tracing::debug!(
            "Sending Gemini request: session={}, {} contents",
            self.id,
            contents.len()
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateContentRequest {
                contents: &contents,
            })
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Gemini request failed: {}", e);
                DescriboError::Request(format!("Gemini request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Gemini returned error {}: {}", status, body);
            return Err(format_gemini_api_error(status, &body).into());
        }

        let events = sse::data_events(response.bytes_stream());
        Ok(Box::pin(turn_stream(
            events,
            user,
            Arc::clone(&self.history),
        )))
    }
}

struct TurnState<S> {
    events: Pin<Box<S>>,
    user: Option<Content>,
    reply: String,
    history: Arc<Mutex<Vec<Content>>>,
    finished: bool,
}

/// Map SSE payloads to text chunks, committing the turn on completion
fn turn_stream<S>(
    events: S,
    user: Content,
    history: Arc<Mutex<Vec<Content>>>,
) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = Result<String>> + Send + 'static,
{
    let state = TurnState {
        events: Box::pin(events),
        user: Some(user),
        reply: String::new(),
        history,
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }
        loop {
            let payload = match state.events.next().await {
                Some(Ok(payload)) => payload,
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.finished = true;
                    // Gemini rejects empty text parts, so a turn with no reply is not replayed
                    if state.reply.is_empty() {
                        tracing::warn!("Gemini returned no text; turn not kept in history");
                        return None;
                    }
                    if let (Some(user), Ok(mut history)) = (state.user.take(), state.history.lock())
                    {
                        history.push(user);
                        history.push(Content::model(std::mem::take(&mut state.reply)));
                    }
                    return None;
                }
            };

            match chunk_text(&payload) {
                Ok(text) if text.is_empty() => continue,
                Ok(text) => {
                    state.reply.push_str(&text);
                    return Some((Ok(text), state));
                }
                Err(e) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
            }
        }
    })
}

#[async_trait]
impl ChatSession for GeminiSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send_first_turn(
        &self,
        text: &str,
        image_base64: &str,
        mime_type: &str,
    ) -> Result<ChunkStream> {
        let user = Content::user(vec![
            Part::Text {
                text: text.to_string(),
            },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.to_string(),
                    data: image_base64.to_string(),
                },
            },
        ]);
        self.stream_turn(user).await
    }

    async fn send_turn(&self, text: &str) -> Result<ChunkStream> {
        let user = Content::user(vec![Part::Text {
            text: text.to_string(),
        }]);
        self.stream_turn(user).await
    }
}
