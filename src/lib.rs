//! Describo - chat with a multimodal model about an image
//!
//! This library provides the core of Describo: image intake, the
//! conversation state machine, and the model provider abstraction.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `upload`: Image files, validation, base64 encoding and preview references
//! - `conversation`: Conversation state, transitions and the engine
//! - `providers`: Model collaborator traits and implementations (Gemini, scripted)
//! - `render`: Transcript view selection and terminal rendering
//! - `capabilities`: Optional clipboard and speech tools
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use describo::conversation::ConversationEngine;
//! use describo::providers::create_provider;
//! use describo::upload::{ImageFile, ImageIntake};
//! use describo::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let provider = create_provider(&config.provider)?;
//!     let engine = ConversationEngine::new(
//!         provider,
//!         config.provider.gemini.model.clone(),
//!         ImageIntake::new(config.intake.max_image_bytes),
//!     );
//!     engine.submit_image(ImageFile::from_path("cat.jpg")?)?;
//!     engine.send_message("What breed is this cat?").await;
//!     println!("{:?}", engine.last_model_message());
//!     Ok(())
//! }
//! ```

pub mod capabilities;
pub mod cli;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod error;
pub mod providers;
pub mod render;
pub mod upload;

// Re-export commonly used types
pub use config::Config;
pub use conversation::{ConversationEngine, ConversationState, TurnOutcome};
pub use error::{DescriboError, Result};

#[cfg(test)]
pub mod test_utils;
