//! finbot HTTP Server
//!
//! Axum-based server for the finance chat assistant: chat, portfolio
//! upload, session bootstrap and health, plus the static frontend.

mod config;
mod error;
mod handlers;
mod rate_limit;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finbot_advisor::{
    AnalysisGateway, ChatPipeline, GatewayConfig, MemorySessionStore, PipelineConfig,
};
use finbot_core::LlmProvider;
use finbot_runtime::{OllamaProvider, PerplexityProvider};

use crate::config::{ProviderKind, ServerConfig};
use crate::handlers::{MAX_FILE_BYTES, MAX_FILES, chat, health, session_init, upload};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env();

    let mut pipeline = ChatPipeline::new(PipelineConfig {
        cache_ttl: config.cache_ttl,
        ..PipelineConfig::default()
    });
    if let Some(provider) = connect_provider(config.provider).await {
        let gateway_config = GatewayConfig {
            model: config.model.clone(),
            deep_model: config.deep_model.clone(),
            ..GatewayConfig::default()
        };
        pipeline = pipeline.with_gateway(AnalysisGateway::new(provider, gateway_config));
    }

    let sessions = Arc::new(MemorySessionStore::new(
        config.session_capacity,
        config.session_ttl,
    ));
    let addr = config.bind_addr.clone();
    let state = AppState::new(pipeline, sessions, config);
    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 finbot server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /api/health       - Health check");
    tracing::info!("  GET  /api/session/init - Issue a session id");
    tracing::info!("  POST /api/chat         - Send message");
    tracing::info!("  POST /api/upload       - Upload portfolio CSV");
    tracing::info!("");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Build the configured provider; `None` leaves topic analysis disabled
async fn connect_provider(kind: ProviderKind) -> Option<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match kind {
        ProviderKind::Perplexity => match PerplexityProvider::from_env() {
            Ok(provider) => Arc::new(provider),
            Err(e) => {
                tracing::warn!("⚠ Perplexity not configured - topic analysis disabled");
                tracing::warn!("  {}", e);
                tracing::warn!("  Set PERPLEXITY_API_KEY in .env");
                return None;
            }
        },
        ProviderKind::Ollama => Arc::new(OllamaProvider::from_env()),
    };

    match provider.health_check().await {
        Ok(true) => {
            tracing::info!("✓ Connected to {}", provider.name());
            if let Ok(models) = provider.list_models().await {
                for model in models {
                    tracing::info!("  Model: {}", model.id);
                }
            }
        }
        Ok(false) | Err(_) => {
            tracing::warn!(
                "⚠ {} not reachable - analysis requests will fail until it is",
                provider.name()
            );
            if kind == ProviderKind::Ollama {
                tracing::warn!("  Make sure Ollama is running: ollama serve");
            }
        }
    }

    Some(provider)
}

fn build_router(state: AppState) -> Router {
    let frontend = ServeDir::new(&state.config.static_dir);
    let timeout = TimeoutLayer::new(state.config.request_timeout);

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/health", get(health))
        .route("/session/init", get(session_init))
        .route("/chat", post(chat))
        .route("/upload", post(upload))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit_requests,
        ));

    Router::new()
        .nest("/api", api)
        .route("/health", get(health))
        .fallback_service(frontend)
        .layer(DefaultBodyLimit::max(MAX_FILES * MAX_FILE_BYTES + 64 * 1024))
        .layer(cors)
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "finbot-test-boundary";

    fn app_with(config: ServerConfig) -> Router {
        let sessions = Arc::new(MemorySessionStore::default());
        build_router(AppState::new(
            ChatPipeline::new(PipelineConfig::default()),
            sessions,
            config,
        ))
    }

    fn app() -> Router {
        app_with(ServerConfig::default())
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn chat_request(body: Value) -> Request<Body> {
        Request::post("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn upload_request(session_id: &str, files: &[(&str, &str, &str)]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"sessionId\"\r\n\r\n{session_id}\r\n"
        );
        for (name, content_type, content) in files {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: {content_type}\r\n\r\n{content}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        Request::post("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["features"]["configuredProvider"], "perplexity");
        assert!(body["features"]["analysisProvider"].is_null());
        assert_eq!(body["system"]["environment"], "development");
    }

    #[tokio::test]
    async fn test_session_init_issues_id() {
        let response = app()
            .oneshot(Request::get("/api/session/init").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert!(body["sessionId"].as_str().unwrap().starts_with("session_"));
    }

    #[tokio::test]
    async fn test_empty_message_is_bad_request() {
        let response = app()
            .oneshot(chat_request(serde_json::json!({ "message": "   " })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_off_topic_message_is_redirected() {
        let response = app()
            .oneshot(chat_request(serde_json::json!({ "message": "how do I make pizza" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["data"]["type"], "guardrail");
        assert_eq!(body["metadata"]["queryType"], "non_financial");
        assert_eq!(body["metadata"]["hasChart"], false);
        assert!(body.get("chart").is_none());
    }

    #[tokio::test]
    async fn test_topic_without_provider_is_unavailable() {
        let response = app()
            .oneshot(chat_request(serde_json::json!({ "message": "Bitcoin outlook" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = json_body(response).await;
        assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
        assert!(body["details"].is_array());
    }

    #[tokio::test]
    async fn test_production_omits_details() {
        let app = app_with(ServerConfig {
            production: true,
            ..ServerConfig::default()
        });
        let response = app
            .oneshot(chat_request(serde_json::json!({ "message": "Bitcoin outlook" })))
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_non_csv_upload_is_unsupported() {
        let response = app()
            .oneshot(upload_request(
                "session_abc",
                &[("notes.txt", "text/plain", "hello")],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let body = json_body(response).await;
        assert_eq!(body["code"], "UNSUPPORTED_MEDIA");
    }

    #[tokio::test]
    async fn test_unparseable_csv_is_unprocessable() {
        let response = app()
            .oneshot(upload_request(
                "session_abc",
                &[("bad.csv", "text/csv", "colour,flavour\nred,sweet\n")],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = json_body(response).await;
        assert_eq!(body["code"], "PARSE_FAILURE");
        assert!(body["hint"].is_string());
    }

    #[tokio::test]
    async fn test_oversized_csv_values_are_unprocessable() {
        let response = app()
            .oneshot(upload_request(
                "session_abc",
                &[(
                    "big.csv",
                    "text/csv",
                    "symbol,shares,current_price\nBIG,100000000000000000,1000000000000\n",
                )],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["code"], "PARSE_FAILURE");
    }

    #[tokio::test]
    async fn test_upload_then_ask_about_portfolio() {
        let app = app();
        let session = "session_portfolio_flow";

        let response = app
            .clone()
            .oneshot(upload_request(
                session,
                &[(
                    "portfolio.csv",
                    "text/csv",
                    "symbol,value\nAAPL,10000\nGOOGL,8000\n",
                )],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["hasPortfolio"], true);
        assert_eq!(body["sessionId"], session);
        assert_eq!(body["summary"]["holdings"], 2);
        assert_eq!(body["summary"]["totalValue"].as_f64(), Some(18000.0));
        assert_eq!(body["summary"]["topHoldings"][0]["symbol"], "AAPL");

        let response = app
            .oneshot(chat_request(serde_json::json!({
                "message": "analyze my portfolio",
                "sessionId": session,
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["data"]["type"], "portfolio");
        assert_eq!(body["metadata"]["queryType"], "portfolio");
        assert_eq!(body["data"]["portfolio"]["totalValue"].as_f64(), Some(18000.0));
        assert_eq!(body["chart"]["type"], "doughnut");
    }

    #[tokio::test]
    async fn test_rate_limit() {
        let app = app_with(ServerConfig {
            rate_limit_per_minute: 2,
            ..ServerConfig::default()
        });

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json_body(response).await["code"], "RATE_LIMITED");
    }
}
