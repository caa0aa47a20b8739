//! Host capabilities: clipboard and speech
//!
//! Both are optional. Detection looks for a known tool on `PATH`; when none
//! is found the capability is a no-op and its action returns `Ok(false)`.

use crate::error::{DescriboError, Result};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Clipboard tools in order of preference, with their arguments
const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("clip", &[]),
];

/// Speech tools in order of preference
const SPEECH_TOOLS: &[&str] = &["say", "espeak"];

/// Returns true if `program` resolves on `PATH`
pub fn is_available(program: &str) -> bool {
    #[cfg(unix)]
    let check_cmd = "which";
    #[cfg(windows)]
    let check_cmd = "where";

    std::process::Command::new(check_cmd)
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// External program plus fixed leading arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    program: String,
    args: Vec<String>,
}

impl Tool {
    /// Describe a tool invocation
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Program name
    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
        cmd
    }
}

/// Clipboard writer
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    tool: Option<Tool>,
}

impl Clipboard {
    /// Find the first available clipboard tool
    pub fn detect() -> Self {
        let tool = CLIPBOARD_TOOLS
            .iter()
            .find(|(program, _)| is_available(program))
            .map(|(program, args)| Tool::new(*program, args));
        tracing::debug!("Clipboard tool: {:?}", tool.as_ref().map(Tool::program));
        Self { tool }
    }

    /// Use a specific tool, or none
    pub fn with_tool(tool: Option<Tool>) -> Self {
        Self { tool }
    }

    /// Whether copying does anything
    pub fn is_available(&self) -> bool {
        self.tool.is_some()
    }

    /// Copy text to the clipboard
    ///
    /// Returns `Ok(false)` when no clipboard tool is available.
    ///
    /// # Errors
    ///
    /// Returns `DescriboError::Capability` if the tool fails
    pub async fn copy(&self, text: &str) -> Result<bool> {
        let Some(tool) = &self.tool else {
            return Ok(false);
        };

        pipe_text(tool, tool.command(), text).await?;
        Ok(true)
    }
}

/// Speech synthesizer
#[derive(Debug, Clone, Default)]
pub struct Speech {
    tool: Option<Tool>,
}

impl Speech {
    /// Find the first available speech tool
    pub fn detect() -> Self {
        let tool = SPEECH_TOOLS
            .iter()
            .find(|program| is_available(program))
            .map(|program| Tool::new(*program, &[]));
        tracing::debug!("Speech tool: {:?}", tool.as_ref().map(Tool::program));
        Self { tool }
    }

    /// Use a specific tool, or none
    pub fn with_tool(tool: Option<Tool>) -> Self {
        Self { tool }
    }

    /// Whether speaking does anything
    pub fn is_available(&self) -> bool {
        self.tool.is_some()
    }

    /// Read text aloud in the given language (a BCP 47 tag such as `es-ES`)
    ///
    /// Returns `Ok(false)` when no speech tool is available.
    ///
    /// # Errors
    ///
    /// Returns `DescriboError::Capability` if the tool fails
    pub async fn speak(&self, text: &str, language: &str) -> Result<bool> {
        let Some(tool) = &self.tool else {
            return Ok(false);
        };

        // Text goes through stdin so a leading '-' is never read as an option
        let mut cmd = tool.command();
        match tool.program.as_str() {
            // espeak voices are named by language
            "espeak" => {
                cmd.arg("-v").arg(language.to_lowercase()).arg("--stdin");
            }
            _ => {
                tracing::debug!("{} picks its voice from system settings", tool.program);
            }
        }

        pipe_text(tool, cmd, text).await?;
        Ok(true)
    }
}

/// Run `cmd`, write `text` to its stdin and wait for it to succeed
async fn pipe_text(tool: &Tool, mut cmd: Command, text: &str) -> Result<()> {
    let mut child = cmd
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|e| capability_error(tool, e))?;

    let mut stdin = child.stdin.take().ok_or_else(|| {
        DescriboError::Capability(format!("{} stdin unavailable after spawn", tool.program))
    })?;
    stdin
        .write_all(text.as_bytes())
        .await
        .map_err(|e| capability_error(tool, e))?;
    drop(stdin);

    let status = child.wait().await.map_err(|e| capability_error(tool, e))?;
    if !status.success() {
        return Err(DescriboError::Capability(format!(
            "{} exited with {}",
            tool.program, status
        ))
        .into());
    }
    Ok(())
}

fn capability_error(tool: &Tool, e: std::io::Error) -> DescriboError {
    DescriboError::Capability(format!("failed to run `{}`: {}", tool.program, e))
}
