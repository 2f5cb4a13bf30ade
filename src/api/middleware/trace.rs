use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// HTTP header name for trace ID
pub const TRACE_ID_HEADER: &str = "X-Trace-Id";

tokio::task_local! {
    static CURRENT_TRACE_ID: TraceId;
}

/// Extension type for storing trace ID in request extensions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceId(pub String);

impl TraceId {
    /// Trace ID of the request being handled on this task, if any
    pub fn current() -> Option<TraceId> {
        CURRENT_TRACE_ID.try_with(|id| id.clone()).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Middleware that tags each request with a fresh UUID trace ID.
///
/// Everything logged while the request is handled runs inside an
/// `http_request` span carrying the ID. The ID is stored in the request
/// extensions, stamped on error bodies and echoed back in the `X-Trace-Id`
/// response header.
pub async fn trace_id_middleware(mut request: Request, next: Next) -> Response {
    let trace_id = TraceId(Uuid::new_v4().to_string());

    let span = info_span!(
        "http_request",
        trace_id = %trace_id.as_str(),
        method = %request.method(),
        uri = %request.uri().path(),
    );

    request.extensions_mut().insert(trace_id.clone());

    let mut response = CURRENT_TRACE_ID
        .scope(trace_id.clone(), async move {
            tracing::info!("Request started");
            let response = next.run(request).await;
            tracing::info!(status = %response.status(), "Request completed");
            response
        })
        .instrument(span)
        .await;

    response.headers_mut().insert(
        TRACE_ID_HEADER,
        HeaderValue::from_str(trace_id.as_str())
            .unwrap_or_else(|_| HeaderValue::from_static("invalid")),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{AppError, ErrorResponse};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Extension, Router,
    };
    use tower::util::ServiceExt; // For oneshot method

    fn app() -> Router {
        Router::new()
            .route("/test", get(|| async { StatusCode::OK }))
            .route(
                "/echo",
                get(|Extension(id): Extension<TraceId>| async move { id.0 }),
            )
            .route(
                "/missing",
                get(|| async { AppError::NotFound("Student not found".to_string()) }),
            )
            .layer(middleware::from_fn(trace_id_middleware))
    }

    async fn get_path(uri: &str) -> Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app().oneshot(request).await.unwrap()
    }

    fn header_trace_id(response: &Response) -> String {
        response
            .headers()
            .get(TRACE_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_trace_id_middleware_generates_id() {
        let trace_id = header_trace_id(&get_path("/test").await);
        assert!(Uuid::parse_str(&trace_id).is_ok());
    }

    #[tokio::test]
    async fn test_trace_id_unique_per_request() {
        assert_ne!(
            header_trace_id(&get_path("/test").await),
            header_trace_id(&get_path("/test").await)
        );
    }

    #[tokio::test]
    async fn test_trace_id_available_to_handlers() {
        let response = get_path("/echo").await;
        let header = header_trace_id(&response);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], header.as_bytes());
    }

    #[tokio::test]
    async fn test_error_body_carries_request_trace_id() {
        let response = get_path("/missing").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let header = header_trace_id(&response);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.trace_id, header);
        assert_eq!(parsed.message, "Student not found");
    }

    #[test]
    fn test_no_current_trace_id_outside_requests() {
        assert_eq!(TraceId::current(), None);
    }
}
