//! Request body parsing.
//!
//! JSON and url-encoded bodies are buffered up to a limit, parsed, and
//! exposed as a [`ParsedBody`] extension. The raw bytes are put back so
//! handlers can still use axum's own extractors.

use axum::{
    body::Body,
    extract::Request,
    http::{header::CONTENT_TYPE, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use serde_json::{Map, Value};

use crate::http::failure::RequestFailure;
use crate::http::middleware::{middleware_fn, Middleware};

/// Parsed request body.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBody(pub Value);

impl ParsedBody {
    /// String field of an object body.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
}

fn body_kind(req: &Request) -> Option<BodyKind> {
    let content_type = req.headers().get(CONTENT_TYPE)?.to_str().ok()?;
    let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
    if mime == "application/json" || mime.ends_with("+json") {
        Some(BodyKind::Json)
    } else if mime == "application/x-www-form-urlencoded" {
        Some(BodyKind::Form)
    } else {
        None
    }
}

/// Body parser middleware buffering at most `limit` bytes.
pub fn body_parser(limit: usize) -> Middleware {
    middleware_fn(move |req: Request, next: Next| async move {
        match parse(req, limit).await {
            Ok(req) => next.run(req).await,
            Err(failure) => failure.into_response(),
        }
    })
}

async fn parse(req: Request, limit: usize) -> Result<Request, RequestFailure> {
    let Some(kind) = body_kind(&req) else {
        return Ok(req);
    };

    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, limit).await.map_err(|_| {
        RequestFailure::new(StatusCode::PAYLOAD_TOO_LARGE, "request entity too large")
            .with_code("entity.too.large")
    })?;

    let parsed = match kind {
        BodyKind::Json if bytes.is_empty() => Value::Object(Map::new()),
        BodyKind::Json => serde_json::from_slice(&bytes).map_err(|e| {
            RequestFailure::new(StatusCode::BAD_REQUEST, e.to_string()).with_code("entity.parse.failed")
        })?,
        BodyKind::Form => parse_form(&bytes),
    };

    let mut req = Request::from_parts(parts, Body::from(bytes));
    req.extensions_mut().insert(ParsedBody(parsed));
    Ok(req)
}

/// Url-encoded pairs into an object; repeated keys collect into arrays.
fn parse_form(bytes: &[u8]) -> Value {
    let mut map = Map::new();
    for (key, value) in url::form_urlencoded::parse(bytes) {
        let value = Value::String(value.into_owned());
        match map.get_mut(key.as_ref()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Router};
    use serde_json::json;
    use tower::ServiceExt;

    fn app(limit: usize) -> Router {
        let parser = body_parser(limit);
        Router::new()
            .route(
                "/",
                post(|req: Request| async move {
                    let parsed = req.extensions().get::<ParsedBody>().map(|b| b.0.clone());
                    axum::Json(parsed.unwrap_or(Value::Null))
                }),
            )
            .layer(axum::middleware::from_fn(move |req: Request, next: Next| {
                let parser = parser.clone();
                async move { parser(req, next).await }
            }))
    }

    async fn send(router: Router, content_type: &str, body: &'static str) -> (StatusCode, Value) {
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        let res = router.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn parses_json_bodies() {
        let (status, body) = send(app(1024), "application/json", r#"{"a":1}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "a": 1 }));
    }

    #[tokio::test]
    async fn parses_urlencoded_bodies() {
        let (_, body) = send(
            app(1024),
            "application/x-www-form-urlencoded",
            "name=ada&tag=x&tag=y",
        )
        .await;
        assert_eq!(body, json!({ "name": "ada", "tag": ["x", "y"] }));
    }

    #[tokio::test]
    async fn other_content_types_pass_through() {
        let (status, body) = send(app(1024), "text/plain", "hello").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn rejects_oversized_and_malformed_bodies() {
        let (status, _) = send(app(4), "application/json", r#"{"a":12345}"#).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

        let (status, body) = send(app(1024), "application/json", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], json!(false));
    }
}
