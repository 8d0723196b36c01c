//! Perplexity Provider
//!
//! Implementation of `LlmProvider` for Perplexity's OpenAI-compatible
//! chat completions endpoint. Requests are restricted to financial news
//! domains and carry a search recency filter.

use std::time::Duration;

use async_trait::async_trait;
use finbot_core::{
    error::{AgentError, Result},
    message::Message,
    provider::{Completion, GenerationOptions, LlmProvider, ModelInfo, TokenUsage},
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai/chat/completions";

/// Domains the search backend is allowed to cite
const SEARCH_DOMAINS: &[&str] = &[
    "finance.yahoo.com",
    "bloomberg.com",
    "reuters.com",
    "marketwatch.com",
    "tradingview.com",
];

/// Perplexity provider configuration
#[derive(Clone, Debug)]
pub struct PerplexityConfig {
    /// API key (sent as a bearer token)
    pub api_key: String,

    /// Completions endpoint
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl PerplexityConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 30,
        }
    }

    /// Read `PERPLEXITY_API_KEY`, `PERPLEXITY_BASE_URL` and `PERPLEXITY_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("PERPLEXITY_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AgentError::Config("PERPLEXITY_API_KEY not set".into()))?;
        let base_url = std::env::var("PERPLEXITY_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let timeout_secs = std::env::var("PERPLEXITY_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            api_key,
            base_url,
            timeout_secs,
        })
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    return_citations: bool,
    search_domain_filter: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    search_recency_filter: Option<&'a str>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    citations: Vec<String>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

/// Perplexity chat completions provider
pub struct PerplexityProvider {
    client: reqwest::Client,
    config: PerplexityConfig,
}

impl PerplexityProvider {
    /// Create from configuration
    pub fn from_config(config: PerplexityConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(PerplexityConfig::from_env()?)
    }

    fn build_request<'a>(
        messages: &'a [Message],
        options: &'a GenerationOptions,
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &options.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            return_citations: true,
            search_domain_filter: SEARCH_DOMAINS,
            search_recency_filter: options.search_recency.as_deref(),
        }
    }

    /// Map a non-success HTTP status to an error
    fn status_error(status: StatusCode, body: &str) -> AgentError {
        let snippet: String = body.chars().take(200).collect();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(snippet),
            StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(snippet),
            s if s.is_server_error() => {
                AgentError::ProviderUnavailable(format!("{s}: {snippet}"))
            }
            s => AgentError::Provider(format!("{s}: {snippet}")),
        }
    }

    fn transport_error(&self, err: &reqwest::Error) -> AgentError {
        if err.is_timeout() {
            AgentError::Timeout(self.config.timeout_secs)
        } else {
            AgentError::ProviderUnavailable(err.to_string())
        }
    }

    fn convert_completion(response: ChatCompletionResponse, model: &str) -> Result<Completion> {
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AgentError::Parse("completion contained no text".into()))?;

        Ok(Completion {
            content,
            model: response.model.unwrap_or_else(|| model.to_string()),
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            citations: response.citations,
        })
    }
}

#[async_trait]
impl LlmProvider for PerplexityProvider {
    fn name(&self) -> &str {
        "Perplexity"
    }

    async fn health_check(&self) -> Result<bool> {
        // No free status endpoint; a configured key is the best signal
        Ok(!self.config.api_key.is_empty())
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let request = Self::build_request(messages, options);

        let response = self
            .client
            .post(&self.config.base_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Perplexity request failed");
            return Err(Self::status_error(status, &body));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Parse(e.to_string()))?;

        Self::convert_completion(body, &options.model)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(["sonar", "sonar-pro"]
            .into_iter()
            .map(|id| ModelInfo {
                id: id.into(),
                name: id.into(),
                context_length: Some(127_072),
            })
            .collect())
    }
}
