//! Special commands parser for interactive chat mode
//!
//! This module parses and handles special commands that can be entered during
//! interactive chat sessions. Special commands allow users to:
//! - Stage or remove the image under discussion
//! - Copy or speak the latest model reply
//! - View conversation status
//! - Display help information
//! - Exit the session
//!
//! Commands are prefixed with `/` and are case-insensitive. Arguments keep
//! their original case, since they are usually paths.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
///
/// These commands act on the conversation or the host, rather than being
/// sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Stage a new image, resetting the conversation
    Image(PathBuf),

    /// Remove the image and clear the conversation
    Reset,

    /// Copy the latest model reply to the clipboard
    Copy,

    /// Read the latest model reply aloud
    Speak,

    /// Display conversation status
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command - regular user input
    None,
}

/// Parse user input to detect special commands
///
/// Supported commands:
/// - `/image <path>` - Stage an image
/// - `/reset` or `/remove` - Remove the image and clear the conversation
/// - `/copy` - Copy the latest reply
/// - `/speak` - Speak the latest reply
/// - `/status` - Show conversation status
/// - `/help` or `/?` - Show help information
/// - `exit`, `quit`, `/exit` or `/quit` - Exit the session
///
/// # Examples
///
/// ```
/// use describo::commands::special_commands::{parse_special_command, SpecialCommand};
/// use std::path::PathBuf;
///
/// let cmd = parse_special_command("/IMAGE photos/Cat.png").unwrap();
/// assert_eq!(cmd, SpecialCommand::Image(PathBuf::from("photos/Cat.png")));
///
/// let cmd = parse_special_command("what breed is it?").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// // Invalid command returns error
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    // If input doesn't start with "/", it's not a command (except exit/quit)
    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let (name, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((name, arg)) => (name.to_lowercase(), arg.trim()),
        None => (lower.clone(), ""),
    };

    match name.as_str() {
        "/image" if arg.is_empty() => Err(CommandError::MissingArgument {
            command: "/image".to_string(),
            usage: "/image <path>".to_string(),
        }),
        "/image" => Ok(SpecialCommand::Image(PathBuf::from(arg))),

        "/reset" | "/remove" | "/copy" | "/speak" | "/status" | "/help" | "/?" | "/exit"
        | "/quit" | "exit" | "quit"
            if !arg.is_empty() =>
        {
            Err(CommandError::UnsupportedArgument {
                command: name.clone(),
                arg: arg.to_string(),
            })
        }

        "/reset" | "/remove" => Ok(SpecialCommand::Reset),
        "/copy" => Ok(SpecialCommand::Copy),
        "/speak" => Ok(SpecialCommand::Speak),
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "exit" | "quit" | "/exit" | "/quit" => Ok(SpecialCommand::Exit),

        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Display help text for special commands
///
/// # Examples
///
/// ```
/// use describo::commands::special_commands::print_help;
///
/// print_help();
/// ```
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

IMAGE:
  /image <path>   - Stage an image (starts a new conversation)
  /reset          - Remove the image and clear the conversation
  /remove         - Same as /reset

LATEST REPLY:
  /copy           - Copy the latest reply to the clipboard
  /speak          - Read the latest reply aloud

SESSION INFORMATION:
  /status         - Show image, session and transcript status
  /help           - Show this help message
  /?              - Same as /help

SESSION CONTROL:
  exit            - Exit interactive mode
  quit            - Same as exit

NOTES:
  - Commands are case-insensitive
  - Regular text (not starting with /) is sent to the model
  - The first message sends the image; later messages are text only
  - /copy and /speak do nothing when no clipboard or speech tool is installed
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_image_keeps_path_case() {
        let cmd = parse_special_command("/image ./Photos/My Cat.PNG").unwrap();
        assert_eq!(cmd, SpecialCommand::Image(PathBuf::from("./Photos/My Cat.PNG")));
    }

    #[test]
    fn test_parse_image_without_path_returns_error() {
        let err = parse_special_command("/image").unwrap_err();
        assert!(matches!(err, CommandError::MissingArgument { .. }));
        assert!(err.to_string().contains("/image <path>"));
    }

    #[test]
    fn test_parse_reset_and_remove() {
        assert_eq!(parse_special_command("/reset").unwrap(), SpecialCommand::Reset);
        assert_eq!(parse_special_command("/remove").unwrap(), SpecialCommand::Reset);
    }

    #[test]
    fn test_parse_copy_and_speak() {
        assert_eq!(parse_special_command("/copy").unwrap(), SpecialCommand::Copy);
        assert_eq!(parse_special_command("/speak").unwrap(), SpecialCommand::Speak);
    }

    #[test]
    fn test_parse_show_status() {
        assert_eq!(
            parse_special_command("/status").unwrap(),
            SpecialCommand::ShowStatus
        );
    }

    #[test]
    fn test_parse_help_and_shorthand() {
        assert_eq!(parse_special_command("/help").unwrap(), SpecialCommand::Help);
        assert_eq!(parse_special_command("/?").unwrap(), SpecialCommand::Help);
    }

    #[test]
    fn test_parse_exit_variants() {
        for input in ["exit", "quit", "/exit", "/quit", "EXIT"] {
            assert_eq!(parse_special_command(input).unwrap(), SpecialCommand::Exit);
        }
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(parse_special_command("/RESET").unwrap(), SpecialCommand::Reset);
        assert_eq!(parse_special_command("/Copy").unwrap(), SpecialCommand::Copy);
        assert_eq!(parse_special_command("/HeLp").unwrap(), SpecialCommand::Help);
    }

    #[test]
    fn test_parse_with_whitespace() {
        assert_eq!(
            parse_special_command("  /status  ").unwrap(),
            SpecialCommand::ShowStatus
        );
    }

    #[test]
    fn test_parse_regular_text_returns_none() {
        let cmd = parse_special_command("describe the colors").unwrap();
        assert_eq!(cmd, SpecialCommand::None);
    }

    #[test]
    fn test_parse_text_starting_with_exit_word_returns_none() {
        let cmd = parse_special_command("exit signs in the picture?").unwrap();
        assert_eq!(cmd, SpecialCommand::None);
    }

    #[test]
    fn test_parse_empty_string_returns_none() {
        assert_eq!(parse_special_command("").unwrap(), SpecialCommand::None);
        assert_eq!(parse_special_command("   ").unwrap(), SpecialCommand::None);
    }

    #[test]
    fn test_parse_unknown_command_returns_error() {
        let err = parse_special_command("/mode planning").unwrap_err();
        assert_eq!(
            err,
            CommandError::UnknownCommand("/mode planning".to_string())
        );
    }

    #[test]
    fn test_parse_unexpected_argument_returns_error() {
        let err = parse_special_command("/reset now").unwrap_err();
        assert_eq!(
            err,
            CommandError::UnsupportedArgument {
                command: "/reset".to_string(),
                arg: "now".to_string(),
            }
        );
    }
}
