//! Transcript rendering
//!
//! [`view`] picks what to show for a state; [`TerminalRenderer`] is a
//! [`StateObserver`] that writes streamed text to the terminal as it arrives.

use crate::conversation::{ConversationState, StateObserver};
use crate::providers::{Message, Role};
use colored::Colorize;
use std::io::Write;
use std::sync::Mutex;

/// What the transcript area shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// A turn started before any message could be shown
    Skeleton,
    /// No image yet
    Welcome,
    /// Image staged, nothing asked yet
    ImagePrompt,
    /// The conversation so far
    Transcript {
        messages: Vec<Message>,
        /// A reply is in progress; show the typing indicator
        pending: bool,
    },
}

impl View {
    /// Error banner for a state, shown alongside any view
    pub fn error(state: &ConversationState) -> Option<&str> {
        state.error.as_deref()
    }
}

/// Select the view for a state
///
/// # Examples
///
/// ```
/// use describo::conversation::ConversationState;
/// use describo::render::{view, View};
///
/// assert_eq!(view(&ConversationState::default()), View::Welcome);
/// ```
pub fn view(state: &ConversationState) -> View {
    if state.loading && state.messages.is_empty() {
        View::Skeleton
    } else if state.image.is_none() {
        View::Welcome
    } else if state.messages.is_empty() {
        View::ImagePrompt
    } else {
        View::Transcript {
            messages: state.messages.clone(),
            pending: state.loading,
        }
    }
}

#[derive(Debug, Default)]
struct Progress {
    /// Messages fully printed
    printed_messages: usize,
    /// Bytes of the trailing model message already printed
    printed_bytes: usize,
    last_error: Option<String>,
}

/// Prints model text progressively to stdout and errors to stderr
///
/// User messages are not echoed; they were typed at the prompt.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    progress: Mutex<Progress>,
}

impl TerminalRenderer {
    /// Create a renderer with nothing printed
    pub fn new() -> Self {
        Self::default()
    }

    /// Text to print for a state, updating what counts as printed
    fn pending_output(&self, state: &ConversationState) -> (String, Option<String>) {
        let mut progress = match self.progress.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // Transcript was cleared or replaced
        if state.messages.len() < progress.printed_messages {
            *progress = Progress::default();
        }

        let mut out = String::new();
        while progress.printed_messages < state.messages.len() {
            let index = progress.printed_messages;
            let message = &state.messages[index];
            let is_last = index + 1 == state.messages.len();

            if message.role == Role::Model {
                let start = progress.printed_bytes.min(message.text.len());
                if let Some(suffix) = message.text.get(start..) {
                    out.push_str(suffix);
                }
                progress.printed_bytes = message.text.len();
            }

            if is_last && state.loading {
                break;
            }
            if message.role == Role::Model {
                out.push('\n');
            }
            progress.printed_messages += 1;
            progress.printed_bytes = 0;
        }

        let error = match (&state.error, &progress.last_error) {
            (Some(current), Some(last)) if current == last => None,
            (Some(current), _) => Some(current.clone()),
            (None, _) => None,
        };
        progress.last_error = state.error.clone();

        (out, error)
    }
}

impl StateObserver for TerminalRenderer {
    fn on_state(&self, state: &ConversationState) {
        let (out, error) = self.pending_output(state);
        if !out.is_empty() {
            let mut stdout = std::io::stdout();
            let _ = write!(stdout, "{}", out);
            let _ = stdout.flush();
        }
        if let Some(error) = error {
            eprintln!("{} {}", "Error:".red().bold(), error.red());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::ImageSummary;

    fn staged() -> ConversationState {
        ConversationState {
            image: Some(ImageSummary {
                name: "cat.png".to_string(),
                mime_type: "image/png".to_string(),
                size: 1,
                preview_url: "blob:describo/x".to_string(),
                dimensions: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_view_welcome_without_image() {
        assert_eq!(view(&ConversationState::default()), View::Welcome);
    }

    #[test]
    fn test_view_image_prompt() {
        assert_eq!(view(&staged()), View::ImagePrompt);
    }

    #[test]
    fn test_view_skeleton_when_loading_without_messages() {
        let state = ConversationState {
            loading: true,
            ..staged()
        };
        assert_eq!(view(&state), View::Skeleton);
    }

    #[test]
    fn test_view_transcript_pending() {
        let state = ConversationState {
            messages: vec![Message::user("hi"), Message::model("")],
            loading: true,
            ..staged()
        };
        assert_eq!(
            view(&state),
            View::Transcript {
                messages: vec![Message::user("hi"), Message::model("")],
                pending: true,
            }
        );
    }

    #[test]
    fn test_view_error_reported_separately() {
        let state = ConversationState {
            error: Some("Invalid file type".to_string()),
            ..Default::default()
        };
        assert_eq!(view(&state), View::Welcome);
        assert_eq!(View::error(&state), Some("Invalid file type"));
    }

    #[test]
    fn test_renderer_prints_only_new_suffix() {
        let renderer = TerminalRenderer::new();
        let mut state = ConversationState {
            messages: vec![Message::user("hi"), Message::model("Ho")],
            loading: true,
            ..staged()
        };
        assert_eq!(renderer.pending_output(&state).0, "Ho");

        state.messages[1].text.push_str("la");
        assert_eq!(renderer.pending_output(&state).0, "la");

        state.loading = false;
        assert_eq!(renderer.pending_output(&state).0, "\n");
        assert_eq!(renderer.pending_output(&state).0, "");
    }

    #[test]
    fn test_renderer_restarts_after_reset() {
        let renderer = TerminalRenderer::new();
        let state = ConversationState {
            messages: vec![Message::user("hi"), Message::model("Hola")],
            ..staged()
        };
        renderer.pending_output(&state);
        renderer.pending_output(&staged());

        let next = ConversationState {
            messages: vec![Message::user("again"), Message::model("Otra")],
            ..staged()
        };
        assert_eq!(renderer.pending_output(&next).0, "Otra\n");
    }

    #[test]
    fn test_renderer_reports_each_error_once() {
        let renderer = TerminalRenderer::new();
        let state = ConversationState {
            error: Some("Stream error: reset".to_string()),
            ..staged()
        };
        assert_eq!(renderer.pending_output(&state).1.as_deref(), Some("Stream error: reset"));
        assert_eq!(renderer.pending_output(&state).1, None);
    }
}
