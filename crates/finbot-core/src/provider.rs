//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for completion backends (Perplexity, Ollama, ...)
//! so the analysis gateway works with any of them without code changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use finbot_core::provider::{GenerationOptions, LlmProvider};
//!
//! let provider = PerplexityProvider::from_env()?;
//! let completion = provider.complete(&messages, &GenerationOptions::default()).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "sonar", "sonar-pro", "llama3.2")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Top-p nucleus sampling
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Search recency window for providers that search the web ("day", "week")
    #[serde(default)]
    pub search_recency: Option<String>,
}

const fn default_temperature() -> f32 { 0.2 }
const fn default_max_tokens() -> u32 { 4000 }
const fn default_top_p() -> f32 { 0.9 }

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "sonar".into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            search_recency: Some("day".into()),
        }
    }
}

/// Response from an LLM completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text
    pub content: String,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,

    /// Source URLs returned by search-backed providers
    #[serde(default)]
    pub citations: Vec<String>,
}

/// Token usage statistics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Information about a model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub context_length: Option<u32>,
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new completion backends.
/// The analysis gateway works exclusively through this interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider display name (e.g., "Perplexity")
    fn name(&self) -> &str;

    /// Check if the provider is available and configured correctly
    async fn health_check(&self) -> Result<bool>;

    /// Generate a completion from messages
    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion>;

    /// List available models
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;

    struct EchoProvider;

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            "Echo"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            messages: &[Message],
            options: &GenerationOptions,
        ) -> Result<Completion> {
            let last = messages
                .last()
                .ok_or_else(|| AgentError::Provider("empty prompt".into()))?;
            Ok(Completion {
                content: last.content.clone(),
                model: options.model.clone(),
                usage: None,
                citations: Vec::new(),
            })
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert!((opts.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(opts.max_tokens, 4000);
        assert_eq!(opts.search_recency.as_deref(), Some("day"));
    }

    #[tokio::test]
    async fn test_provider_through_trait_object() {
        let provider: Box<dyn LlmProvider> = Box::new(EchoProvider);
        let messages = vec![Message::system("rules"), Message::user("Gold outlook")];

        let completion = provider
            .complete(&messages, &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(completion.content, "Gold outlook");
        assert_eq!(completion.model, "sonar");

        let err = provider.complete(&[], &GenerationOptions::default()).await;
        assert!(err.is_err());
    }
}
