use std::time::Duration;

use axum::http::{
    HeaderMap, Request, Response,
    header::{AsHeaderName, USER_AGENT},
};
use opentelemetry::KeyValue;
use tower_http::trace::{MakeSpan, OnResponse};
use tracing::Span;

use super::X_REQUEST_ID;
use crate::telemetry::{HTTP_REQUEST_DURATION, HTTP_REQUESTS_TOTAL};

fn header_str<'a>(headers: &'a HeaderMap, name: impl AsHeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// One span per request, named `METHOD /path` for the trace backend.
#[derive(Clone)]
pub struct HttpMakeSpan;

impl<B> MakeSpan<B> for HttpMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let method = request.method().as_str();
        let uri = request.uri();
        let headers = request.headers();

        tracing::info_span!(
            "HTTP request",
            otel.name = %format!("{} {}", method, uri.path()),
            http.method = %method,
            http.route = %uri.path(),
            http.target = %uri,
            http.scheme = "http",
            http.flavor = ?request.version(),
            http.user_agent = header_str(headers, USER_AGENT),
            http.request_id = header_str(headers, &X_REQUEST_ID),
            http.response.status_code = tracing::field::Empty,
            otel.status_code = tracing::field::Empty,
        )
    }
}

/// Records status on the span and feeds the HTTP request metrics.
#[derive(Clone)]
pub struct HttpOnResponse;

impl<B> OnResponse<B> for HttpOnResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        let status = response.status();
        let code = status.as_u16();

        span.record("http.response.status_code", i64::from(code));
        span.record(
            "otel.status_code",
            if status.is_server_error() { "ERROR" } else { "OK" },
        );

        let latency_ms = latency.as_secs_f64() * 1000.0;
        let attributes = [
            KeyValue::new("http.status_code", i64::from(code)),
            KeyValue::new("http.status_class", format!("{}xx", code / 100)),
        ];

        HTTP_REQUESTS_TOTAL.add(1, &attributes);
        HTTP_REQUEST_DURATION.record(latency_ms, &attributes);

        tracing::info!(
            http.response.status_code = code,
            http.request_id = header_str(response.headers(), &X_REQUEST_ID),
            latency_ms,
            "finished processing request"
        );
    }
}
