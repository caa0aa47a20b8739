//! Configuration management for Describo
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{DescriboError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default image size ceiling: 4 MiB
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 4 * 1024 * 1024;

/// Main configuration structure for Describo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model provider configuration
    pub provider: ProviderConfig,
    /// Image intake limits
    #[serde(default)]
    pub intake: IntakeConfig,
    /// Interactive chat settings
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Provider configuration
///
/// Specifies which hosted model provider to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Gemini configuration
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Model identifier used when a session is created
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// API base URL (useful for tests and local mocks)
    #[serde(default = "default_gemini_api_base")]
    pub api_base: String,

    /// API key; usually supplied through `GEMINI_API_KEY` instead
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// HTTP timeout for a whole streamed turn (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_gemini_model(),
            api_base: default_gemini_api_base(),
            api_key: None,
            timeout_seconds: default_timeout(),
        }
    }
}

/// Image intake configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Largest accepted image in bytes
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
}

fn default_max_image_bytes() -> u64 {
    DEFAULT_MAX_IMAGE_BYTES
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

/// Chat mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Language tag passed to the speech tool by `/speak`
    #[serde(default = "default_speech_language")]
    pub speech_language: String,

    /// Print the welcome banner when chat starts
    #[serde(default = "default_show_banner")]
    pub show_banner: bool,
}

fn default_speech_language() -> String {
    "es-ES".to_string()
}

fn default_show_banner() -> bool {
    true
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            speech_language: default_speech_language(),
            show_banner: default_show_banner(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default_config()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn default_config() -> Self {
        Self {
            provider: ProviderConfig {
                provider_type: "gemini".to_string(),
                gemini: GeminiConfig::default(),
            },
            intake: IntakeConfig::default(),
            chat: ChatConfig::default(),
        }
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DescriboError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| DescriboError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider_type) = std::env::var("DESCRIBO_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(model) = std::env::var("DESCRIBO_MODEL") {
            self.provider.gemini.model = model;
        }

        if let Ok(api_base) = std::env::var("DESCRIBO_API_BASE") {
            self.provider.gemini.api_base = api_base;
        }

        if let Ok(api_key) = std::env::var("GEMINI_API_KEY") {
            if !api_key.trim().is_empty() {
                self.provider.gemini.api_key = Some(api_key);
            }
        }

        if let Ok(max_bytes) = std::env::var("DESCRIBO_MAX_IMAGE_BYTES") {
            if let Ok(value) = max_bytes.parse() {
                self.intake.max_image_bytes = value;
            } else {
                tracing::warn!("Invalid DESCRIBO_MAX_IMAGE_BYTES: {}", max_bytes);
            }
        }

        if let Ok(timeout) = std::env::var("DESCRIBO_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.provider.gemini.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid DESCRIBO_TIMEOUT_SECONDS: {}", timeout);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(model) = cli.command.model_override() {
            tracing::debug!("Using model override from CLI: {}", model);
            self.provider.gemini.model = model.to_string();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.provider.provider_type.is_empty() {
            return Err(DescriboError::Config("Provider type cannot be empty".to_string()).into());
        }

        let valid_providers = ["gemini"];
        if !valid_providers.contains(&self.provider.provider_type.as_str()) {
            return Err(DescriboError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                valid_providers.join(", ")
            ))
            .into());
        }

        if self.provider.gemini.model.trim().is_empty() {
            return Err(
                DescriboError::Config("gemini.model cannot be empty".to_string()).into(),
            );
        }

        if self.provider.gemini.timeout_seconds == 0 {
            return Err(DescriboError::Config(
                "gemini.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.intake.max_image_bytes == 0 {
            return Err(DescriboError::Config(
                "intake.max_image_bytes must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_file, temp_dir, test_config, test_config_yaml};
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.provider_type, "gemini");
        assert_eq!(config.provider.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.intake.max_image_bytes, 4 * 1024 * 1024);
        assert_eq!(config.chat.speech_language, "es-ES");
    }

    #[test]
    fn test_config_validation_success() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_provider() {
        let mut config = Config::default();
        config.provider.provider_type = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_provider() {
        let mut config = Config::default();
        config.provider.provider_type = "copilot".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_empty_model() {
        let mut config = Config::default();
        config.provider.gemini.model = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.provider.gemini.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_image_ceiling() {
        let mut config = Config::default();
        config.intake.max_image_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
provider:
  type: gemini
  gemini:
    model: gemini-2.5-pro
    api_base: http://localhost:8080
    timeout_seconds: 30

intake:
  max_image_bytes: 1048576

chat:
  speech_language: en-US
  show_banner: false
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider.gemini.model, "gemini-2.5-pro");
        assert_eq!(config.provider.gemini.api_base, "http://localhost:8080");
        assert_eq!(config.provider.gemini.timeout_seconds, 30);
        assert_eq!(config.intake.max_image_bytes, 1_048_576);
        assert_eq!(config.chat.speech_language, "en-US");
        assert!(!config.chat.show_banner);
    }

    #[test]
    fn test_config_from_minimal_yaml_uses_defaults() {
        let yaml = "provider:\n  type: gemini\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.intake.max_image_bytes, DEFAULT_MAX_IMAGE_BYTES);
        assert!(config.chat.show_banner);
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let mut config = Config::default();
        config.provider.gemini.api_key = Some("secret".to_string());
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("secret"));
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        let cli = crate::cli::Cli::default();
        let config = Config::load("nonexistent.yaml", &cli).unwrap();
        assert_eq!(config.provider.provider_type, "gemini");
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "config.yaml", &test_config_yaml());
        let cli = crate::cli::Cli::default();

        let config = Config::load(path.to_str().unwrap(), &cli).unwrap();
        assert_eq!(config.provider.gemini.model, "gemini-2.5-pro");
        assert_eq!(config.provider.gemini.api_base, "http://localhost:8080");
        assert_eq!(config.intake.max_image_bytes, 1048576);
        assert_eq!(config.chat.speech_language, "en-US");
        assert!(!config.chat.show_banner);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_overrides() {
        std::env::set_var("DESCRIBO_MODEL", "gemini-env-model");
        std::env::set_var("DESCRIBO_MAX_IMAGE_BYTES", "1024");
        std::env::set_var("GEMINI_API_KEY", "env-key");

        let mut config = Config::default();
        config.apply_env_vars();

        std::env::remove_var("DESCRIBO_MODEL");
        std::env::remove_var("DESCRIBO_MAX_IMAGE_BYTES");
        std::env::remove_var("GEMINI_API_KEY");

        assert_eq!(config.provider.gemini.model, "gemini-env-model");
        assert_eq!(config.intake.max_image_bytes, 1024);
        assert_eq!(config.provider.gemini.api_key.as_deref(), Some("env-key"));
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_ignores_invalid_numbers() {
        std::env::set_var("DESCRIBO_MAX_IMAGE_BYTES", "lots");

        let mut config = Config::default();
        config.apply_env_vars();

        std::env::remove_var("DESCRIBO_MAX_IMAGE_BYTES");

        assert_eq!(config.intake.max_image_bytes, DEFAULT_MAX_IMAGE_BYTES);
    }

    #[test]
    #[serial]
    fn test_cli_model_override_wins() {
        use clap::Parser;

        let cli = crate::cli::Cli::try_parse_from(["describo", "chat", "--model", "gemini-2.5-pro"])
            .unwrap();
        let config = Config::load("nonexistent.yaml", &cli).unwrap();
        assert_eq!(config.provider.gemini.model, "gemini-2.5-pro");
    }
}
