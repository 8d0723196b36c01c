//! Error Types

use thiserror::Error;

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Provider-level error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider returned an error response
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unreachable (network failure, DNS, refused connection)
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Provider did not answer within the configured deadline
    #[error("Provider timed out after {0}s")]
    Timeout(u64),

    /// Response body could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error (missing API key, bad host)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited by the upstream API
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Whether the failure means the upstream service is unusable right now.
    ///
    /// Callers surface these as "temporarily unavailable" instead of a
    /// generic failure. Nothing in finbot retries on them.
    pub const fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_) | Self::Timeout(_) | Self::RateLimited(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The analysis service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) | Self::Timeout(_) => {
                "Analysis temporarily unavailable. Please try again.".into()
            }
            Self::RateLimited(_) => "The analysis service is busy. Please wait a moment.".into(),
            Self::Auth(_) | Self::Config(_) => "The analysis service is not configured correctly.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
