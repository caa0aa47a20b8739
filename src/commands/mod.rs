/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `chat`  - Interactive conversation about an image
- `ask`   - One question, one streamed answer
- `check` - Image validation without contacting the model

The handlers stay small and lean on the library components: image intake,
the conversation engine and the providers.
*/

use crate::capabilities::{Clipboard, Speech};
use crate::config::Config;
use crate::conversation::{ConversationEngine, ConversationState, Phase, TurnOutcome};
use crate::error::{DescriboError, Result};
use crate::providers::create_provider;
use crate::render::TerminalRenderer;
use crate::upload::{ImageFile, ImageIntake, ImageSummary};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

// Special commands parser for the chat loop
pub mod special_commands;

/// Open an image file from disk for intake
fn open_image(path: &Path) -> Result<ImageFile> {
    ImageFile::from_path(path).map_err(|e| {
        DescriboError::Config(format!("Cannot open image {}: {}", path.display(), e)).into()
    })
}

/// Build an engine for the configured provider, rendering to the terminal
fn build_engine(config: &Config) -> Result<ConversationEngine> {
    let provider = create_provider(&config.provider)?;
    let intake = ImageIntake::new(config.intake.max_image_bytes);
    Ok(
        ConversationEngine::new(provider, config.provider.gemini.model.clone(), intake)
            .with_observer(Arc::new(TerminalRenderer::new())),
    )
}

/// One-line description of a staged image
fn describe_image(summary: &ImageSummary) -> String {
    let dimensions = summary
        .dimensions
        .map(|(w, h)| format!(", {}x{}", w, h))
        .unwrap_or_default();
    format!(
        "{} ({}, {} bytes{})",
        summary.name, summary.mime_type, summary.size, dimensions
    )
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Builds the provider and the conversation engine, then runs a
    //! readline-based loop: plain lines are sent to the model, slash
    //! commands act on the conversation.

    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `image` - Optional image to stage before the first prompt
    ///
    /// # Examples
    ///
    /// ```
    /// use describo::commands::chat;
    /// use describo::config::Config;
    ///
    /// // In application code:
    /// // chat::run_chat(Config::default(), None).await?;
    /// ```
    pub async fn run_chat(config: Config, image: Option<std::path::PathBuf>) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let engine = build_engine(&config)?;
        let clipboard = Clipboard::detect();
        let speech = Speech::detect();

        let mut rl = DefaultEditor::new()?;

        if config.chat.show_banner {
            print_welcome_banner(&engine);
        }

        if let Some(path) = image {
            stage_image(&engine, &path);
        }

        loop {
            let prompt = format_prompt(&engine.state());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(trimmed);

                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::Image(path)) => {
                            stage_image(&engine, &path);
                        }
                        Ok(SpecialCommand::Reset) => {
                            engine.reset();
                            println!("{}", "Image removed. Stage a new one with /image <path>".cyan());
                        }
                        Ok(SpecialCommand::Copy) => {
                            copy_last_reply(&engine, &clipboard).await;
                        }
                        Ok(SpecialCommand::Speak) => {
                            speak_last_reply(&engine, &speech, &config.chat.speech_language)
                                .await;
                        }
                        Ok(SpecialCommand::ShowStatus) => {
                            print_status_display(&engine, &clipboard, &speech);
                        }
                        Ok(SpecialCommand::Help) => {
                            print_help();
                        }
                        Ok(SpecialCommand::Exit) => break,
                        Ok(SpecialCommand::None) => {
                            send(&engine, trimmed).await;
                        }
                        Err(e) => {
                            eprintln!("{}", e.to_string().red());
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        engine.reset();
        println!("Goodbye!");
        Ok(())
    }

    fn stage_image(engine: &ConversationEngine, path: &Path) {
        let file = match open_image(path) {
            Ok(file) => file,
            Err(e) => {
                eprintln!("{}", format!("Error: {}", e).red());
                return;
            }
        };
        // Rejections are printed by the renderer
        if let Ok(summary) = engine.submit_image(file) {
            println!(
                "{} {}",
                "Staged".green(),
                describe_image(&summary)
            );
            println!("Ask a question about the image to start.\n");
        }
    }

    async fn send(engine: &ConversationEngine, text: &str) {
        if engine.state().image.is_none() {
            println!(
                "{}",
                "No image staged. Use /image <path> first.".yellow()
            );
            return;
        }
        match engine.send_message(text).await {
            TurnOutcome::Completed => println!(),
            TurnOutcome::Failed(_) => {}
            TurnOutcome::Ignored => {
                tracing::debug!("Message ignored in phase {}", engine.state().phase());
            }
            TurnOutcome::Abandoned => println!("{}", "(reply discarded)".dimmed()),
        }
    }

    async fn copy_last_reply(engine: &ConversationEngine, clipboard: &Clipboard) {
        let Some(text) = engine.last_model_message() else {
            println!("{}", "Nothing to copy yet.".yellow());
            return;
        };
        match clipboard.copy(&text).await {
            Ok(true) => println!("{}", "Copied to clipboard.".green()),
            Ok(false) => println!("{}", "No clipboard tool found.".yellow()),
            Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
        }
    }

    async fn speak_last_reply(engine: &ConversationEngine, speech: &Speech, language: &str) {
        let Some(text) = engine.last_model_message() else {
            println!("{}", "Nothing to read yet.".yellow());
            return;
        };
        match speech.speak(&text, language).await {
            Ok(true) => {}
            Ok(false) => println!("{}", "No speech tool found.".yellow()),
            Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
        }
    }

    /// Prompt showing whether an image is staged
    fn format_prompt(state: &ConversationState) -> String {
        match &state.image {
            Some(image) => format!("[{}] >> ", image.name.cyan()),
            None => format!("[{}] >> ", "no image".dimmed()),
        }
    }

    /// Display welcome banner at the start of interactive chat mode
    fn print_welcome_banner(engine: &ConversationEngine) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║        Describo Interactive Chat - Ask about an image        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!(
            "Model:  {} ({})",
            engine.model().cyan(),
            engine.provider_name()
        );
        println!("Stage an image with /image <path>, then ask anything about it.");
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

    /// Display detailed status information about the current conversation
    fn print_status_display(engine: &ConversationEngine, clipboard: &Clipboard, speech: &Speech) {
        let state = engine.state();

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                   Describo Session Status                    ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Phase:             {}", state.phase().to_string().cyan());
        println!(
            "Image:             {}",
            state
                .image
                .as_ref()
                .map(describe_image)
                .unwrap_or_else(|| "none".to_string())
        );
        if let Some(image) = &state.image {
            println!("Preview:           {}", image.preview_url);
        }
        println!(
            "Session:           {}",
            engine.session_id().unwrap_or_else(|| "not started".to_string())
        );
        println!("Conversation Size: {} messages", state.messages.len());
        println!(
            "Clipboard:         {}",
            if clipboard.is_available() { "available" } else { "unavailable" }
        );
        println!(
            "Speech:            {}",
            if speech.is_available() { "available" } else { "unavailable" }
        );
        if let Some(error) = &state.error {
            println!("Last Error:        {}", error.red());
        }
        if state.phase() == Phase::Idle {
            println!("\nStage an image with /image <path> to begin.");
        }
        println!();
    }
}

/// Ask command handler
pub mod ask {
    use super::*;

    /// Ask one question about an image and stream the answer to stdout
    ///
    /// # Errors
    ///
    /// Returns error if the image is rejected, the prompt is blank, or the
    /// turn fails
    pub async fn run_ask(config: Config, image: &Path, prompt: &str) -> Result<()> {
        tracing::info!("Asking about {}", image.display());

        if prompt.trim().is_empty() {
            return Err(DescriboError::Config("Prompt must not be empty".to_string()).into());
        }

        let engine = build_engine(&config)?;
        engine.submit_image(open_image(image)?)?;

        let outcome = engine.send_message(prompt).await;
        engine.reset();

        match outcome {
            TurnOutcome::Completed => Ok(()),
            // The message already carries its error kind
            TurnOutcome::Failed(message) => Err(anyhow::anyhow!(message)),
            TurnOutcome::Ignored | TurnOutcome::Abandoned => {
                Err(DescriboError::Request("No answer was produced".to_string()).into())
            }
        }
    }
}

/// Check command handler
pub mod check {
    use super::*;

    /// Validate an image the way chat would, without contacting the model
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or is rejected
    pub fn run_check(config: &Config, path: &Path) -> Result<ImageSummary> {
        let mut intake = ImageIntake::new(config.intake.max_image_bytes);
        let summary = intake.validate(open_image(path)?)?;
        println!("{} {}", "OK".green().bold(), describe_image(&summary));
        intake.reset();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_file, temp_dir, test_config};

    #[test]
    fn test_describe_image_with_dimensions() {
        let summary = ImageSummary {
            name: "cat.png".to_string(),
            mime_type: "image/png".to_string(),
            size: 42,
            preview_url: "blob:describo/x".to_string(),
            dimensions: Some((2, 1)),
        };
        assert_eq!(describe_image(&summary), "cat.png (image/png, 42 bytes, 2x1)");
    }

    #[test]
    fn test_run_check_rejects_text_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "notes.txt", "not an image");

        let err = check::run_check(&test_config(), &path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DescriboError>(),
            Some(DescriboError::InvalidType(_))
        ));
    }

    #[test]
    fn test_run_check_accepts_png_by_extension() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "pixel.png", "fake");

        let summary = check::run_check(&test_config(), &path).unwrap();
        assert_eq!(summary.mime_type, "image/png");
        assert_eq!(summary.size, 4);
    }

    #[test]
    fn test_run_check_missing_file() {
        let dir = temp_dir();
        let path = dir.path().join("missing.png");
        assert!(check::run_check(&test_config(), &path).is_err());
    }

    #[tokio::test]
    async fn test_run_ask_rejects_blank_prompt() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "pixel.png", "fake");
        assert!(ask::run_ask(test_config(), &path, "   ").await.is_err());
    }
}
