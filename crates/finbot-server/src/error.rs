//! HTTP Error Mapping

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use finbot_advisor::AdvisorError;

const CSV_HINT: &str = "Include a header row with at least a symbol column and a value, or shares and price columns.";

/// A failed request, ready to render
#[derive(Error, Debug)]
#[error("{source}")]
pub struct ApiError {
    #[source]
    source: AdvisorError,

    /// Include diagnostic details in the body
    expose_details: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub const fn new(source: AdvisorError, expose_details: bool) -> Self {
        Self {
            source,
            expose_details,
        }
    }

    pub const fn status(&self) -> StatusCode {
        status_for(&self.source)
    }

    pub const fn inner(&self) -> &AdvisorError {
        &self.source
    }

    fn body(&self) -> ErrorResponse {
        let details = self.expose_details.then(|| match &self.source {
            AdvisorError::ParseFailure { reason, details } if !details.is_empty() => {
                std::iter::once(reason.clone()).chain(details.iter().cloned()).collect()
            }
            other => vec![other.to_string()],
        });
        let hint = matches!(self.source, AdvisorError::ParseFailure { .. } | AdvisorError::Csv(_))
            .then_some(CSV_HINT);

        ErrorResponse {
            success: false,
            error: self.source.user_message(),
            code: self.source.code(),
            details,
            hint,
        }
    }
}

pub const fn status_for(err: &AdvisorError) -> StatusCode {
    match err {
        AdvisorError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AdvisorError::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        AdvisorError::ParseFailure { .. }
        | AdvisorError::Csv(_)
        | AdvisorError::InsufficientContext(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AdvisorError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AdvisorError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(code = self.source.code(), error = %self.source, "Request failed");
        } else {
            tracing::debug!(code = self.source.code(), error = %self.source, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}
