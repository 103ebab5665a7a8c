use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use opentelemetry::trace::TraceContextExt;
use serde_json::json;
use thiserror::Error;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing date, time or location")]
    MissingField,

    #[error("Unsupported location")]
    UnsupportedLocation,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingField | AppError::UnsupportedLocation | AppError::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn get_trace_id() -> Option<String> {
    let span = Span::current();
    let context = span.context();
    let span_ref = context.span();
    let span_context = span_ref.span_context();

    if span_context.is_valid() {
        Some(span_context.trace_id().to_string())
    } else {
        None
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                match get_trace_id() {
                    Some(trace_id) => json!({
                        "error": "Internal server error",
                        "trace_id": trace_id,
                    }),
                    None => json!({ "error": "Internal server error" }),
                }
            }
            client_error => {
                tracing::debug!(error = %client_error, "Rejected request");
                json!({ "error": client_error.to_string() })
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
