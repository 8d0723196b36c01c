//! # finbot-core
//!
//! Provider-agnostic LLM abstraction shared by the finbot crates.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      finbot-advisor                          │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────┐  │
//! │  │  Classifier  │──│   Composer   │──│  AnalysisGateway   │  │
//! │  └──────────────┘  └──────────────┘  └─────────┬──────────┘  │
//! └────────────────────────────────────────────────┼─────────────┘
//!                                                  │
//!                                   ┌──────────────▼─────────────┐
//!                                   │   LlmProvider (Strategy)   │
//!                                   │   Perplexity │ Ollama      │
//!                                   └────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait lets the advisor swap between hosted search
//! APIs and local inference without touching classification or
//! composition logic.

pub mod error;
pub mod message;
pub mod provider;

pub use error::{AgentError, Result};
pub use message::{Message, Role};
pub use provider::{Completion, GenerationOptions, LlmProvider};
