//! Application State

use std::sync::Arc;
use std::time::Instant;

use finbot_advisor::{AdvisorError, ChatPipeline, SessionStore};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::rate_limit::RateLimiter;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Classifier, composer, charts and the analysis gateway
    pub pipeline: Arc<ChatPipeline>,

    pub sessions: Arc<dyn SessionStore>,

    pub limiter: Arc<RateLimiter>,

    pub config: Arc<ServerConfig>,

    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        pipeline: ChatPipeline,
        sessions: Arc<dyn SessionStore>,
        config: ServerConfig,
    ) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            sessions,
            limiter: Arc::new(RateLimiter::per_minute(config.rate_limit_per_minute)),
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// Wrap a domain error for the response, honoring the environment
    pub fn reject(&self, err: AdvisorError) -> ApiError {
        ApiError::new(err, !self.config.production)
    }
}
