//! # finbot-runtime
//!
//! Completion providers for finbot.
//!
//! ## Providers
//!
//! - **Perplexity** (default): hosted search-augmented chat completions
//! - **Ollama** (`ollama` feature): local inference via Ollama
//!
//! ## Usage
//!
//! ```rust,ignore
//! use finbot_runtime::PerplexityProvider;
//!
//! let provider = Arc::new(PerplexityProvider::from_env()?);
//! let gateway = AnalysisGateway::new(provider, GatewayConfig::default());
//! ```

pub mod perplexity;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use perplexity::{PerplexityConfig, PerplexityProvider};

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};

// Re-export core types for convenience
pub use finbot_core::{AgentError, LlmProvider, Message, Result, Role};
