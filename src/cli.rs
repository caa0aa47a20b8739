//! Command-line interface definition for Describo
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot questions, and
//! image validation.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Describo - chat with a multimodal model about an image
#[derive(Parser, Debug, Clone)]
#[command(name = "describo")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Describo
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive conversation about an image
    Chat {
        /// Image to stage before the first prompt
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Override the model from config
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Ask a single question about an image and stream the answer
    Ask {
        /// Image to ask about
        #[arg(short, long)]
        image: PathBuf,

        /// Question to send with the image
        #[arg(short, long)]
        prompt: String,

        /// Override the model from config
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Validate an image without contacting the model
    Check {
        /// Image to validate
        path: PathBuf,
    },
}

impl Commands {
    /// Model override supplied on the command line, if any
    pub fn model_override(&self) -> Option<&str> {
        match self {
            Commands::Chat { model, .. } | Commands::Ask { model, .. } => model.as_deref(),
            Commands::Check { .. } => None,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            command: Commands::Chat {
                image: None,
                model: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Chat {
                image: None,
                model: None
            }
        ));
    }

    #[test]
    fn test_cli_parse_chat_command() {
        let cli = Cli::try_parse_from(["describo", "chat"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat { .. }));
        assert_eq!(cli.command.model_override(), None);
    }

    #[test]
    fn test_cli_parse_chat_with_image_and_model() {
        let cli = Cli::try_parse_from([
            "describo",
            "chat",
            "--image",
            "cat.png",
            "--model",
            "gemini-2.5-pro",
        ])
        .unwrap();
        if let Commands::Chat { image, model } = &cli.command {
            assert_eq!(image.as_deref(), Some(std::path::Path::new("cat.png")));
            assert_eq!(model.as_deref(), Some("gemini-2.5-pro"));
        } else {
            panic!("Expected Chat command");
        }
        assert_eq!(cli.command.model_override(), Some("gemini-2.5-pro"));
    }

    #[test]
    fn test_cli_parse_ask() {
        let cli =
            Cli::try_parse_from(["describo", "ask", "-i", "dog.jpg", "-p", "What breed?"]).unwrap();
        if let Commands::Ask {
            image,
            prompt,
            model,
        } = cli.command
        {
            assert_eq!(image, PathBuf::from("dog.jpg"));
            assert_eq!(prompt, "What breed?");
            assert_eq!(model, None);
        } else {
            panic!("Expected Ask command");
        }
    }

    #[test]
    fn test_cli_parse_ask_requires_prompt() {
        assert!(Cli::try_parse_from(["describo", "ask", "--image", "dog.jpg"]).is_err());
    }

    #[test]
    fn test_cli_parse_check() {
        let cli = Cli::try_parse_from(["describo", "check", "photo.webp"]).unwrap();
        if let Commands::Check { path } = &cli.command {
            assert_eq!(path, &PathBuf::from("photo.webp"));
        } else {
            panic!("Expected Check command");
        }
        assert_eq!(cli.command.model_override(), None);
    }

    #[test]
    fn test_cli_parse_with_config_and_verbose() {
        let cli = Cli::try_parse_from(["describo", "--config", "custom.yaml", "-v", "chat"]).unwrap();
        assert_eq!(cli.config, Some("custom.yaml".to_string()));
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parse_missing_command() {
        assert!(Cli::try_parse_from(["describo"]).is_err());
    }

    #[test]
    fn test_cli_parse_invalid_command() {
        assert!(Cli::try_parse_from(["describo", "invalid"]).is_err());
    }
}
