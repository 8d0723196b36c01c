//! External Analysis Gateway
//!
//! Asks the configured `LlmProvider` for a short analysis of one asset.
//! One attempt per request, bounded by a timeout; any failure surfaces as
//! `ServiceUnavailable` so the caller can show a "try again" message.

use std::sync::Arc;
use std::time::Duration;

use finbot_core::{GenerationOptions, LlmProvider, Message};

use crate::classifier::Complexity;
use crate::error::{AdvisorError, Result};

/// Gateway settings
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Upper bound on one provider call
    pub timeout: Duration,

    /// Model for low and medium complexity
    pub model: String,

    /// Model for high complexity
    pub deep_model: String,

    pub max_tokens: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            model: "sonar".into(),
            deep_model: "sonar-pro".into(),
            max_tokens: 4000,
        }
    }
}

impl GatewayConfig {
    pub fn model_for(&self, complexity: Complexity) -> &str {
        match complexity {
            Complexity::High => &self.deep_model,
            Complexity::Low | Complexity::Medium => &self.model,
        }
    }
}

fn system_prompt(topic: &str) -> String {
    format!(
        r#"You are Max, a friendly and knowledgeable financial advisor who loves talking about {topic}!

Your personality:
- Conversational and approachable, like chatting with a smart financial buddy
- Enthusiastic about finance but easy to understand
- Keep responses concise but informative
- Friendly warnings about risks, not scary lectures

IMPORTANT RULES:
1. Focus ONLY on {topic} - politely redirect if asked about other assets
2. Keep responses under 200 words unless specifically asked for details
3. Use bullet points and clear section headings
4. Include specific prices and percentages
5. If someone asks about non-financial topics, be friendly but redirect to finance"#
    )
}

fn user_prompt(topic: &str, complexity: Complexity) -> String {
    let depth = match complexity {
        Complexity::Low => "Keep it to a quick overview.",
        Complexity::Medium => "Keep it concise but actionable.",
        Complexity::High => "Go deeper on the technical picture and the risks.",
    };

    format!(
        "Give me a friendly but insightful analysis of {topic}. I want:
- Current price and recent changes
- Key levels to watch (support and resistance)
- What's driving the price
- Quick entry/exit thoughts
- Main risks to know

{depth}"
    )
}

/// Remote analysis client
pub struct AnalysisGateway {
    provider: Arc<dyn LlmProvider>,
    config: GatewayConfig,
}

impl AnalysisGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, config: GatewayConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Analysis text for `topic`. Never retries.
    pub async fn get_analysis(&self, topic: &str, complexity: Complexity) -> Result<String> {
        let messages = [
            Message::system(system_prompt(topic)),
            Message::user(user_prompt(topic, complexity)),
        ];
        let options = GenerationOptions {
            model: self.config.model_for(complexity).to_string(),
            max_tokens: self.config.max_tokens,
            ..GenerationOptions::default()
        };

        tracing::debug!(
            provider = self.provider.name(),
            model = %options.model,
            topic,
            "Requesting analysis"
        );

        let completion = tokio::time::timeout(self.config.timeout, self.provider.complete(&messages, &options))
            .await
            .map_err(|_| {
                tracing::warn!(topic, timeout_secs = self.config.timeout.as_secs(), "Analysis timed out");
                AdvisorError::ServiceUnavailable(format!(
                    "analysis timed out after {}s",
                    self.config.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                tracing::warn!(topic, error = %e, "Analysis provider failed");
                AdvisorError::from(e)
            })?;

        Ok(completion.content)
    }
}
