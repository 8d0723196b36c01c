//! Chat Pipeline
//!
//! One chat turn: classify the message, fetch whatever backs the reply,
//! compose it and attach a chart when the intent asks for one.
//!
//! ```text
//! message ─► QueryClassifier ─┬─► portfolio ─► analyze ─────────┐
//!                             ├─► topic ─► reply cache ─► gateway ─► ResponseComposer ─► ChatOutcome
//!                             └─► static copy ──────────────────┘        ▲
//!                                                     ChartSpecBuilder ──┘
//! ```
//!
//! The reply cache has no stampede protection: two concurrent misses for
//! the same (topic, complexity) both call the gateway and the last insert
//! wins.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::classifier::{ChartStyle, Complexity, QueryClassifier, QueryIntent, QueryKind};
use crate::composer::{ReplySource, ResponseComposer, StructuredReply};
use crate::error::{AdvisorError, Result};
use crate::gateway::AnalysisGateway;
use crate::market::{PriceSource, SyntheticPriceSource};
use crate::model::Holding;
use crate::svckit::{ChartSpec, ChartSpecBuilder, analyze};

/// Pipeline tuning
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// How long a composed analysis is reused
    pub cache_ttl: Duration,

    pub cache_capacity: u64,

    /// Points in price and comparison charts
    pub chart_hours: usize,

    pub candle_count: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(5 * 60),
            cache_capacity: 500,
            chart_hours: 24,
            candle_count: 24,
        }
    }
}

/// Result of one chat turn
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub intent: QueryIntent,
    pub reply: Arc<StructuredReply>,
    pub chart: Option<ChartSpec>,
    /// Whether the reply came from the analysis cache
    pub cached: bool,
}

type ReplyKey = (String, Complexity);

pub struct ChatPipeline {
    classifier: QueryClassifier,
    composer: ResponseComposer,
    charts: ChartSpecBuilder,
    gateway: Option<AnalysisGateway>,
    prices: Arc<dyn PriceSource>,
    replies: Cache<ReplyKey, Arc<StructuredReply>>,
    config: PipelineConfig,
}

impl ChatPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            classifier: QueryClassifier::default(),
            composer: ResponseComposer::default(),
            charts: ChartSpecBuilder::default(),
            gateway: None,
            prices: Arc::new(SyntheticPriceSource::new()),
            replies: Cache::builder()
                .max_capacity(config.cache_capacity)
                .time_to_live(config.cache_ttl)
                .build(),
            config,
        }
    }

    #[must_use]
    pub fn with_gateway(mut self, gateway: AnalysisGateway) -> Self {
        self.gateway = Some(gateway);
        self
    }

    #[must_use]
    pub fn with_price_source(mut self, prices: Arc<dyn PriceSource>) -> Self {
        self.prices = prices;
        self
    }

    #[must_use]
    pub fn with_composer(mut self, composer: ResponseComposer) -> Self {
        self.composer = composer;
        self
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: QueryClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn has_gateway(&self) -> bool {
        self.gateway.is_some()
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.gateway.as_ref().map(AnalysisGateway::provider_name)
    }

    /// Replies currently cached
    pub fn cached_replies(&self) -> u64 {
        self.replies.entry_count()
    }

    pub fn classifier(&self) -> &QueryClassifier {
        &self.classifier
    }

    /// Answer one chat message
    pub async fn respond(&self, message: &str, portfolio: Option<&[Holding]>) -> Result<ChatOutcome> {
        let has_portfolio = portfolio.is_some_and(|p| !p.is_empty());
        let intent = self.classifier.classify(message, has_portfolio);

        match (intent.kind, portfolio, intent.topic.clone()) {
            (QueryKind::Portfolio, Some(holdings), _) => {
                let analysis = analyze(holdings)?;
                let reply = self.composer.compose(&intent, ReplySource::Portfolio(&analysis));
                let chart = self
                    .charts
                    .portfolio_donut(&analysis.top_holdings, analysis.total_value);

                Ok(ChatOutcome {
                    intent,
                    reply: Arc::new(reply),
                    chart,
                    cached: false,
                })
            }
            (_, _, Some(topic)) => {
                let (reply, cached) = self.analysis_reply(&intent, &topic).await?;
                let chart = if intent.needs_chart {
                    self.topic_chart(&intent, &topic).await?
                } else {
                    None
                };

                Ok(ChatOutcome {
                    intent,
                    reply,
                    chart,
                    cached,
                })
            }
            _ => {
                let reply = self.composer.compose(&intent, ReplySource::None);
                Ok(ChatOutcome {
                    intent,
                    reply: Arc::new(reply),
                    chart: None,
                    cached: false,
                })
            }
        }
    }

    async fn analysis_reply(&self, intent: &QueryIntent, topic: &str) -> Result<(Arc<StructuredReply>, bool)> {
        let key = (topic.to_string(), intent.complexity);
        if let Some(reply) = self.replies.get(&key).await {
            tracing::debug!(topic, complexity = intent.complexity.as_str(), "Reply cache hit");
            return Ok((reply, true));
        }

        let gateway = self.gateway.as_ref().ok_or_else(|| {
            AdvisorError::ServiceUnavailable("no analysis provider configured".into())
        })?;
        let text = gateway.get_analysis(topic, intent.complexity).await?;

        let reply = Arc::new(self.composer.compose(intent, ReplySource::Analysis(&text)));
        self.replies.insert(key, Arc::clone(&reply)).await;
        Ok((reply, false))
    }

    async fn topic_chart(&self, intent: &QueryIntent, topic: &str) -> Result<Option<ChartSpec>> {
        if intent.is_comparison() {
            let series = self
                .prices
                .compare(&intent.comparison, self.config.chart_hours)
                .await?;
            return Ok(self.charts.comparison_chart(&series, "24H"));
        }

        match intent.chart_style {
            ChartStyle::Candlestick => {
                let candles = self.prices.candles(topic, self.config.candle_count).await?;
                Ok(self
                    .charts
                    .candlestick_chart(&candles, &format!("{topic} Candlestick Chart")))
            }
            ChartStyle::Line => {
                let points = self.prices.price_series(topic, self.config.chart_hours).await?;
                Ok(self
                    .charts
                    .price_chart(&points, &format!("{topic} Price Movement"), topic))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::ReplyKind;
    use crate::gateway::GatewayConfig;
    use crate::svckit::{ChartKind, parse_csv};
    use async_trait::async_trait;
    use finbot_core::{Completion, GenerationOptions, LlmProvider, Message, provider::ModelInfo};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ANALYSIS: &str = "Bitcoin is trading at $43,250.\n\n## Key Levels\n- Support near $41,800\n- Resistance at $45,000";

    struct CountingProvider {
        calls: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl LlmProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        async fn health_check(&self) -> finbot_core::Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            _messages: &[Message],
            options: &GenerationOptions,
        ) -> finbot_core::Result<Completion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(Completion {
                content: ANALYSIS.to_string(),
                model: options.model.clone(),
                usage: None,
                citations: Vec::new(),
            })
        }

        async fn list_models(&self) -> finbot_core::Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }
    }

    fn pipeline_with(delay: Duration, timeout: Duration) -> (ChatPipeline, Arc<CountingProvider>) {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            delay,
        });
        let gateway = AnalysisGateway::new(
            provider.clone(),
            GatewayConfig {
                timeout,
                ..GatewayConfig::default()
            },
        );
        let pipeline = ChatPipeline::new(PipelineConfig::default())
            .with_gateway(gateway)
            .with_price_source(Arc::new(SyntheticPriceSource::seeded(9)));
        (pipeline, provider)
    }

    fn pipeline() -> (ChatPipeline, Arc<CountingProvider>) {
        pipeline_with(Duration::ZERO, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_uploaded_portfolio_round_trip() {
        let (pipeline, provider) = pipeline();
        let parsed = parse_csv(b"symbol,value\nAAPL,10000\nGOOGL,8000\n").unwrap();

        let outcome = pipeline
            .respond("analyze my portfolio", Some(parsed.holdings.as_slice()))
            .await
            .unwrap();

        assert_eq!(outcome.intent.kind, QueryKind::Portfolio);
        assert_eq!(outcome.reply.kind, ReplyKind::Portfolio);

        let snapshot = outcome.reply.portfolio.as_ref().unwrap();
        assert_eq!(snapshot.total_value, dec!(18000));
        assert_eq!(snapshot.top_holdings[0].symbol, "AAPL");
        assert_eq!(snapshot.top_holdings[0].percentage, dec!(55.6));

        let chart = outcome.chart.unwrap();
        assert_eq!(chart.kind, ChartKind::Doughnut);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_topic_reply_is_cached() {
        let (pipeline, provider) = pipeline();

        let first = pipeline.respond("Show me Bitcoin price trends", None).await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.reply.title, "Bitcoin Analysis");
        assert_eq!(first.reply.key_metrics.support, Some(dec!(41800)));
        let chart = first.chart.unwrap();
        assert_eq!(chart.kind, ChartKind::Line);
        assert_eq!(chart.labels().len(), 24);

        let second = pipeline.respond("bitcoin price chart", None).await.unwrap();
        assert!(second.cached);
        assert!(Arc::ptr_eq(&first.reply, &second.reply));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_key_includes_complexity() {
        let (pipeline, provider) = pipeline();

        pipeline.respond("Gold outlook", None).await.unwrap();
        pipeline.respond("Detailed gold outlook", None).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_comparison_and_candlestick_charts() {
        let (pipeline, _) = pipeline();

        let compared = pipeline.respond("compare ethereum vs bitcoin", None).await.unwrap();
        let chart = compared.chart.unwrap();
        assert_eq!(chart.title, "Asset Comparison");
        assert_eq!(chart.datasets().len(), 2);
        assert_eq!(chart.datasets()[0].label.as_deref(), Some("Bitcoin"));

        let candles = pipeline.respond("Tesla candlestick chart", None).await.unwrap();
        assert_eq!(candles.chart.unwrap().kind, ChartKind::Candlestick);
    }

    #[tokio::test]
    async fn test_static_replies_skip_gateway() {
        let (pipeline, provider) = pipeline();

        let outcome = pipeline.respond("how do I make pizza", None).await.unwrap();
        assert_eq!(outcome.intent.kind, QueryKind::NonFinancial);
        assert_eq!(outcome.reply.kind, ReplyKind::Guardrail);
        assert!(outcome.chart.is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_gateway_timeout_is_service_unavailable() {
        let (pipeline, _) = pipeline_with(Duration::from_secs(5), Duration::from_millis(50));

        let err = pipeline.respond("Oil price", None).await.unwrap_err();
        assert!(matches!(err, AdvisorError::ServiceUnavailable(_)));
        assert_eq!(pipeline.cached_replies(), 0);
    }

    #[tokio::test]
    async fn test_topic_without_gateway() {
        let pipeline = ChatPipeline::new(PipelineConfig::default());
        assert!(!pipeline.has_gateway());

        let err = pipeline.respond("Apple stock", None).await.unwrap_err();
        assert_eq!(err.code(), "SERVICE_UNAVAILABLE");

        let welcome = pipeline.respond("what can you do", None).await.unwrap();
        assert_eq!(welcome.reply.kind, ReplyKind::Welcome);
    }
}
