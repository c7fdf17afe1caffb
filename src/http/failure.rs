//! Request-time failures and error handlers.
//!
//! # Responsibilities
//! - Carry a failure (status, code, message) out of middleware and routes
//! - Let error handlers recover a failure or pass it through
//!
//! # Design Decisions
//! - A failure renders as a JSON response and rides along as a response
//!   extension, so outer layers can still see what went wrong
//! - Error handlers wrap everything installed before them; the last one
//!   installed is the outermost and observes every unrecovered failure

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error code carried by CSRF token validation failures.
pub const EBADCSRFTOKEN: &str = "EBADCSRFTOKEN";

/// A failure raised while handling a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {message}")]
pub struct RequestFailure {
    status: StatusCode,
    code: Option<String>,
    message: String,
}

impl RequestFailure {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code: None,
            message: message.into(),
        }
    }

    /// Attach a machine-readable error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn bad_csrf_token() -> Self {
        Self::new(StatusCode::FORBIDDEN, "invalid csrf token").with_code(EBADCSRFTOKEN)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// JSON error body; field order is part of the wire format.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub status: bool,
    pub code: u16,
    pub message: &'a str,
}

impl IntoResponse for RequestFailure {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            status: false,
            code: self.status.as_u16(),
            message: &self.message,
        });
        let mut response = (self.status, body).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Recovers a failure into a response (`Ok`) or passes it on (`Err`).
pub type ErrorHandler = Arc<dyn Fn(RequestFailure) -> Result<Response, RequestFailure> + Send + Sync>;

/// Build an [`ErrorHandler`] from a closure.
pub fn error_handler<F>(f: F) -> ErrorHandler
where
    F: Fn(RequestFailure) -> Result<Response, RequestFailure> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Catch-all handler that renders every failure as its JSON body.
pub fn render_failures() -> ErrorHandler {
    error_handler(|failure| {
        tracing::debug!(status = %failure.status(), code = ?failure.code(), "Unhandled request failure");
        let mut response = failure.clone().into_response();
        response.extensions_mut().remove::<RequestFailure>();
        Ok(response)
    })
}

/// Failure carried by a response, if it has not been recovered.
pub fn failure_of(response: &Response) -> Option<&RequestFailure> {
    response.extensions().get::<RequestFailure>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failure_renders_ordered_json() {
        let response = RequestFailure::new(StatusCode::NOT_FOUND, "Not Found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(failure_of(&response).is_some());

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"{"status":false,"code":404,"message":"Not Found"}"#);
    }

    #[test]
    fn csrf_failure_carries_code() {
        let failure = RequestFailure::bad_csrf_token();
        assert_eq!(failure.status(), StatusCode::FORBIDDEN);
        assert_eq!(failure.code(), Some(EBADCSRFTOKEN));
    }

    #[test]
    fn render_failures_recovers() {
        let handler = render_failures();
        let response = handler(RequestFailure::new(StatusCode::BAD_REQUEST, "bad")).unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(failure_of(&response).is_none());
    }
}
