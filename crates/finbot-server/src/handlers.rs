//! HTTP Handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use finbot_advisor::{
    AdvisorError, ChartSpec, RankedHolding, SessionId, StructuredReply,
    model::Holding,
    svckit::{analyze, parse_csv, validate},
};

use crate::error::ApiResult;
use crate::state::AppState;

/// Files accepted per upload
pub const MAX_FILES: usize = 5;

/// Largest accepted file
pub const MAX_FILE_BYTES: usize = 5 * 1024 * 1024;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMetadata {
    pub query_type: &'static str,
    pub topic: Option<String>,
    pub complexity: &'static str,
    pub has_chart: bool,
    pub cached: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub data: StructuredReply,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartSpec>,
    pub metadata: ChatMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub holdings: usize,
    pub total_value: Decimal,
    pub total_gain_loss: Decimal,
    pub top_holdings: Vec<RankedHolding>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub session_id: String,
    pub has_portfolio: bool,
    pub summary: UploadSummary,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInitResponse {
    pub success: bool,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthFeatures {
    /// Provider named by configuration
    pub configured_provider: &'static str,
    /// Provider actually connected, if any
    pub analysis_provider: Option<String>,
    pub portfolio_upload: bool,
    pub charts: bool,
    pub rate_limit_per_minute: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSystem {
    pub uptime_secs: u64,
    pub environment: &'static str,
    pub sessions: u64,
    pub cached_replies: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub features: HealthFeatures,
    pub system: HealthSystem,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        features: HealthFeatures {
            configured_provider: state.config.provider.as_str(),
            analysis_provider: state.pipeline.provider_name().map(ToString::to_string),
            portfolio_upload: true,
            charts: true,
            rate_limit_per_minute: state.config.rate_limit_per_minute,
        },
        system: HealthSystem {
            uptime_secs: state.started_at.elapsed().as_secs(),
            environment: if state.config.production { "production" } else { "development" },
            sessions: state.sessions.len(),
            cached_replies: state.pipeline.cached_replies(),
        },
    })
}

pub async fn session_init() -> Json<SessionInitResponse> {
    let id = SessionId::new();
    tracing::debug!(session = %id, "Session issued");

    Json(SessionInitResponse {
        success: true,
        session_id: id.to_string(),
    })
}

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let message = sanitize(&request.message, state.config.max_message_len)
        .map_err(|e| state.reject(e))?;

    let session = match request.session_id.as_deref().filter(|s| !s.is_empty()) {
        Some(id) => state
            .sessions
            .load(&SessionId::from_string(id))
            .map_err(|e| state.reject(e))?,
        None => None,
    };
    let portfolio = session.as_ref().and_then(|s| s.portfolio.clone());

    let outcome = state
        .pipeline
        .respond(&message, portfolio.as_deref().map(Vec::as_slice))
        .await
        .map_err(|e| state.reject(e))?;

    let metadata = ChatMetadata {
        query_type: outcome.intent.kind.as_str(),
        topic: outcome.intent.topic.clone(),
        complexity: outcome.intent.complexity.as_str(),
        has_chart: outcome.chart.is_some(),
        cached: outcome.cached,
        timestamp: Utc::now(),
    };

    Ok(Json(ChatResponse {
        success: true,
        data: Arc::unwrap_or_clone(outcome.reply),
        chart: outcome.chart,
        metadata,
    }))
}

pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut session_id = None;
    let mut files = Vec::new();
    let mut skipped = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| state.reject(AdvisorError::InvalidInput(format!("Malformed upload: {e}"))))?
    {
        let field_name = field.name().map(ToString::to_string);
        match field_name.as_deref() {
            Some("sessionId") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| state.reject(AdvisorError::InvalidInput(e.to_string())))?;
                session_id = Some(text.trim().to_string()).filter(|s| !s.is_empty());
            }
            Some("files" | "file") => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(ToString::to_string);

                if !is_csv(&name, content_type.as_deref()) {
                    skipped.push(name);
                    continue;
                }
                if files.len() == MAX_FILES {
                    return Err(state.reject(AdvisorError::InvalidInput(format!(
                        "At most {MAX_FILES} files per upload"
                    ))));
                }

                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| state.reject(AdvisorError::InvalidInput(e.to_string())))?;
                if bytes.len() > MAX_FILE_BYTES {
                    return Err(state.reject(AdvisorError::InvalidInput(format!(
                        "{name} exceeds the 5 MB limit"
                    ))));
                }
                files.push((name, bytes));
            }
            _ => {}
        }
    }

    if files.is_empty() {
        return Err(state.reject(if skipped.is_empty() {
            AdvisorError::InvalidInput("No files uploaded".into())
        } else {
            AdvisorError::UnsupportedMedia(skipped.join(", "))
        }));
    }

    let mut warnings: Vec<String> = skipped
        .iter()
        .map(|name| format!("{name}: skipped, not a CSV file"))
        .collect();
    let mut failures = Vec::new();
    let mut latest: Option<(String, Vec<Holding>)> = None;

    for (name, bytes) in &files {
        match parse_csv(bytes) {
            Ok(parsed) => {
                tracing::info!(file = %name, rows = parsed.row_count, holdings = parsed.holdings.len(), "Parsed portfolio file");
                let check = validate(&parsed.holdings);
                if !check.valid {
                    warnings.push(format!("{name}: missing {}", check.missing_fields.join(", ")));
                }
                latest = Some((name.clone(), parsed.holdings));
            }
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "Portfolio file rejected");
                failures.push(format!("{name}: {e}"));
            }
        }
    }

    let Some((source, holdings)) = latest else {
        return Err(state.reject(AdvisorError::ParseFailure {
            reason: "no uploaded file could be parsed".into(),
            details: failures,
        }));
    };
    warnings.extend(failures);

    let analysis = analyze(&holdings).map_err(|e| state.reject(e))?;
    let id = session_id.map_or_else(SessionId::new, SessionId::from_string);
    let session = state
        .sessions
        .attach_portfolio(&id, holdings)
        .map_err(|e| state.reject(e))?;

    tracing::info!(
        session = %id,
        file = %source,
        holdings = analysis.holdings_count,
        total_value = %analysis.total_value,
        "Portfolio attached"
    );

    Ok(Json(UploadResponse {
        success: true,
        message: format!(
            "Loaded {} holdings from {source}. Ask me to analyze your portfolio!",
            analysis.holdings_count
        ),
        session_id: id.to_string(),
        has_portfolio: session.has_portfolio(),
        summary: UploadSummary {
            holdings: analysis.holdings_count,
            total_value: analysis.total_value,
            total_gain_loss: analysis.total_gain_loss,
            top_holdings: analysis.top_holdings.iter().take(3).cloned().collect(),
        },
        warnings,
    }))
}

// ============================================================================
// Helpers
// ============================================================================

/// Trim, drop angle brackets and enforce the length bound
fn sanitize(raw: &str, max_len: usize) -> Result<String, AdvisorError> {
    let cleaned: String = raw.trim().chars().filter(|c| !matches!(c, '<' | '>')).collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return Err(AdvisorError::InvalidInput("Message cannot be empty".into()));
    }
    if cleaned.chars().count() > max_len {
        return Err(AdvisorError::InvalidInput(format!(
            "Message too long (max {max_len} characters)"
        )));
    }
    Ok(cleaned.to_string())
}

fn is_csv(file_name: &str, content_type: Option<&str>) -> bool {
    let by_name = std::path::Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let by_type = content_type.is_some_and(|ct| {
        let ct = ct.to_ascii_lowercase();
        ct.starts_with("text/csv") || ct.starts_with("application/csv")
    });
    by_name || by_type
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_brackets_and_trims() {
        assert_eq!(
            sanitize("  <b>Bitcoin</b> price  ", 1000).unwrap(),
            "bBitcoin/b price"
        );
    }

    #[test]
    fn test_sanitize_rejects_empty_and_long() {
        assert!(matches!(
            sanitize("  <> ", 1000),
            Err(AdvisorError::InvalidInput(_))
        ));
        assert!(sanitize(&"a".repeat(11), 10).is_err());
        assert!(sanitize(&"a".repeat(10), 10).is_ok());
    }

    #[test]
    fn test_is_csv() {
        assert!(is_csv("portfolio.CSV", None));
        assert!(is_csv("export", Some("text/csv; charset=utf-8")));
        assert!(!is_csv("notes.txt", Some("text/plain")));
        assert!(!is_csv("image.png", None));
    }
}
