//! W3C trace context on calls from the console to the user-management API.

use opentelemetry::trace::TraceContextExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Correlation id on requests into the console.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Headers describing the current span, empty when no exporter is recording.
pub fn trace_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    let context = Span::current().context();
    let span = context.span();
    let span_context = span.span_context();
    if !span_context.is_valid() {
        return headers;
    }

    let traceparent = format!(
        "00-{}-{}-{:02x}",
        span_context.trace_id(),
        span_context.span_id(),
        span_context.trace_flags().to_u8()
    );
    if let Ok(value) = HeaderValue::from_str(&traceparent) {
        headers.insert(TRACEPARENT_HEADER, value);
    }

    let state = span_context.trace_state().header();
    if let Ok(value) = HeaderValue::from_str(&state) {
        if !state.is_empty() {
            headers.insert(TRACESTATE_HEADER, value);
        }
    }

    headers
}

/// An API request whose trace headers are taken from the span active at send time.
pub struct TracedRequest(reqwest::RequestBuilder);

impl TracedRequest {
    pub fn bearer_auth(self, token: &str) -> Self {
        Self(self.0.bearer_auth(token))
    }

    pub fn json<T: serde::Serialize + ?Sized>(self, body: &T) -> Self {
        Self(self.0.json(body))
    }

    pub fn query<T: serde::Serialize + ?Sized>(self, query: &T) -> Self {
        Self(self.0.query(query))
    }

    pub async fn send(self) -> Result<reqwest::Response, reqwest::Error> {
        self.0.headers(trace_headers()).send().await
    }
}

pub trait TracedClientExt {
    fn traced_request(&self, method: Method, url: &str) -> TracedRequest;
}

impl TracedClientExt for reqwest::Client {
    fn traced_request(&self, method: Method, url: &str) -> TracedRequest {
        TracedRequest(self.request(method, url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_headers_outside_a_recorded_span() {
        assert!(trace_headers().is_empty());
    }

    #[tokio::test]
    async fn test_traced_request_is_sent() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let response = reqwest::Client::new()
            .traced_request(Method::GET, &format!("{}/health", server.uri()))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 204);
    }
}
