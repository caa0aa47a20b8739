//! Provider module for Describo
//!
//! This module contains the model collaborator abstraction and its
//! implementations: the Gemini REST client and a scripted provider used by
//! tests.

pub mod base;
pub mod gemini;
pub mod scripted;
pub mod sse;

pub use base::{ChatSession, ChunkStream, Message, ModelProvider, Role};
pub use gemini::{GeminiProvider, GeminiSession};
pub use scripted::{ChunkSender, ScriptedCall, ScriptedProvider};

use crate::config::ProviderConfig;
use crate::error::{DescriboError, Result};
use std::sync::Arc;

/// Create a provider instance based on configuration
///
/// # Arguments
///
/// * `config` - Provider configuration; `type` selects the implementation
///
/// # Errors
///
/// Returns error if the provider type is unknown or initialization fails
///
/// # Examples
///
/// ```
/// use describo::config::{GeminiConfig, ProviderConfig};
/// use describo::providers::create_provider;
///
/// let config = ProviderConfig {
///     provider_type: "gemini".to_string(),
///     gemini: GeminiConfig {
///         api_key: Some("key".to_string()),
///         ..Default::default()
///     },
/// };
/// assert_eq!(create_provider(&config).unwrap().name(), "gemini");
/// ```
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn ModelProvider>> {
    match config.provider_type.as_str() {
        "gemini" => Ok(Arc::new(GeminiProvider::new(config.gemini.clone())?)),
        other => Err(DescriboError::Config(format!("Unknown provider type: {}", other)).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeminiConfig;

    #[test]
    fn test_create_provider_unknown_type() {
        let config = ProviderConfig {
            provider_type: "copilot".to_string(),
            gemini: GeminiConfig::default(),
        };
        let err = create_provider(&config).err().unwrap();
        assert!(err.to_string().contains("Unknown provider type: copilot"));
    }

    #[test]
    fn test_create_provider_gemini_requires_key() {
        let config = ProviderConfig {
            provider_type: "gemini".to_string(),
            gemini: GeminiConfig::default(),
        };
        assert!(create_provider(&config).is_err());
    }
}
