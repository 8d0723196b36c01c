//! Error Types for the Advisor

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),

    #[error("Could not parse portfolio: {reason}")]
    ParseFailure {
        reason: String,
        details: Vec<String>,
    },

    #[error("Insufficient context: {0}")]
    InsufficientContext(String),

    #[error("Analysis service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl AdvisorError {
    pub fn parse_failure(reason: impl Into<String>) -> Self {
        Self::ParseFailure {
            reason: reason.into(),
            details: Vec::new(),
        }
    }

    /// Machine-readable code carried in error responses
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::UnsupportedMedia(_) => "UNSUPPORTED_MEDIA",
            Self::ParseFailure { .. } | Self::Csv(_) => "PARSE_FAILURE",
            Self::InsufficientContext(_) => "INSUFFICIENT_CONTEXT",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::RateLimited => "RATE_LIMITED",
        }
    }

    /// Message safe to show to end users
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => msg.clone(),
            Self::UnsupportedMedia(_) => "Only CSV portfolio files are supported.".into(),
            Self::ParseFailure { .. } | Self::Csv(_) => "Could not parse portfolio data.".into(),
            Self::InsufficientContext(_) => {
                "I could not determine which asset you mean. Try naming a stock, crypto or commodity.".into()
            }
            Self::ServiceUnavailable(_) => "Analysis temporarily unavailable. Please try again.".into(),
            Self::RateLimited => "You've made too many requests. Please wait a moment.".into(),
        }
    }
}

impl From<finbot_core::AgentError> for AdvisorError {
    fn from(err: finbot_core::AgentError) -> Self {
        Self::ServiceUnavailable(err.to_string())
    }
}
