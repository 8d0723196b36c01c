//! Server Configuration
//!
//! Every setting comes from the environment and has a default, so the
//! server starts with no `.env` at all.

use std::time::Duration;

/// Which completion provider backs topic analysis
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Perplexity,
    Ollama,
}

impl ProviderKind {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "ollama" => Self::Ollama,
            _ => Self::Perplexity,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Perplexity => "perplexity",
            Self::Ollama => "ollama",
        }
    }

    /// Default (standard, deep) model names for the provider
    const fn default_models(self) -> (&'static str, &'static str) {
        match self {
            Self::Perplexity => ("sonar", "sonar-pro"),
            Self::Ollama => ("llama3.2", "llama3.2"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,

    /// Production hides error details from responses
    pub production: bool,

    pub provider: ProviderKind,

    /// Model for low and medium complexity questions
    pub model: String,

    /// Model for high complexity questions
    pub deep_model: String,

    pub cache_ttl: Duration,

    pub session_ttl: Duration,

    pub session_capacity: u64,

    /// Requests per client per minute on `/api/*`
    pub rate_limit_per_minute: u32,

    /// Longest accepted chat message, in characters
    pub max_message_len: usize,

    pub static_dir: String,

    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            production: false,
            provider: ProviderKind::Perplexity,
            model: ProviderKind::Perplexity.default_models().0.into(),
            deep_model: ProviderKind::Perplexity.default_models().1.into(),
            cache_ttl: Duration::from_secs(5 * 60),
            session_ttl: Duration::from_secs(60 * 60),
            session_capacity: 10_000,
            rate_limit_per_minute: 60,
            max_message_len: 1000,
            static_dir: "static".into(),
            request_timeout: Duration::from_secs(45),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let provider = std::env::var("FINBOT_PROVIDER")
            .map(|v| ProviderKind::parse(&v))
            .unwrap_or(defaults.provider);
        let (model, deep_model) = provider.default_models();

        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            production: std::env::var("FINBOT_ENV")
                .is_ok_and(|v| v.eq_ignore_ascii_case("production")),
            provider,
            model: std::env::var("FINBOT_MODEL").unwrap_or_else(|_| model.into()),
            deep_model: std::env::var("FINBOT_DEEP_MODEL").unwrap_or_else(|_| deep_model.into()),
            cache_ttl: env_secs("FINBOT_CACHE_TTL_SECS").unwrap_or(defaults.cache_ttl),
            session_ttl: env_secs("FINBOT_SESSION_TTL_SECS").unwrap_or(defaults.session_ttl),
            session_capacity: env_parse("FINBOT_SESSION_CAPACITY")
                .unwrap_or(defaults.session_capacity),
            rate_limit_per_minute: env_parse("FINBOT_RATE_LIMIT_PER_MINUTE")
                .unwrap_or(defaults.rate_limit_per_minute),
            max_message_len: env_parse("FINBOT_MAX_MESSAGE_LEN")
                .unwrap_or(defaults.max_message_len),
            static_dir: std::env::var("STATIC_DIR").unwrap_or(defaults.static_dir),
            request_timeout: env_secs("FINBOT_REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_secs(key: &str) -> Option<Duration> {
    env_parse::<u64>(key).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse_defaults_to_perplexity() {
        assert_eq!(ProviderKind::parse("Ollama"), ProviderKind::Ollama);
        assert_eq!(ProviderKind::parse("perplexity"), ProviderKind::Perplexity);
        assert_eq!(ProviderKind::parse("unknown"), ProviderKind::Perplexity);
        assert_eq!(ProviderKind::Ollama.default_models().0, "llama3.2");
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.max_message_len, 1000);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert!(!config.production);
    }
}
