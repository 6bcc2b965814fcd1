//! Gateway proxy event and response shapes shared by every handler

use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::AppError;

/// Headers permitted on cross-origin requests
pub const CORS_ALLOW_HEADERS: &str =
    "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token";

/// Methods advertised by the gallery listing and its error responses
pub const GALLERY_ALLOW_METHODS: &str = "GET, POST, OPTIONS";
/// Methods advertised by single image responses
pub const IMAGE_ALLOW_METHODS: &str = "GET, OPTIONS";
/// Methods advertised by the upload issuer
pub const UPLOAD_ALLOW_METHODS: &str = "OPTIONS,POST";

/// Request context attached by the gateway
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    /// Public domain the request arrived on
    pub domain_name: Option<String>,
    /// Deployment stage
    pub stage: Option<String>,
}

/// Inbound HTTP-like event
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    /// HTTP method
    #[serde(default = "default_method")]
    pub http_method: String,
    /// Request path
    #[serde(default)]
    pub path: String,
    /// Raw request body
    #[serde(default)]
    pub body: Option<String>,
    /// Whether `body` is base64 encoded
    #[serde(default)]
    pub is_base64_encoded: bool,
    /// Gateway request context
    #[serde(default)]
    pub request_context: Option<RequestContext>,
    /// Remaining top-level event fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl GatewayRequest {
    /// Creates a request for the given method and path
    #[must_use]
    pub fn new(http_method: &str, path: &str) -> Self {
        Self {
            http_method: http_method.to_string(),
            path: path.to_string(),
            body: None,
            is_base64_encoded: false,
            request_context: None,
            extra: Map::new(),
        }
    }

    /// Reads a raw invocation payload as a gateway event
    ///
    /// # Errors
    ///
    /// Returns a 500 `AppError` when the payload does not have the event shape
    pub fn from_event(event: Value) -> Result<Self, AppError> {
        serde_json::from_value(event).map_err(|e| {
            tracing::error!("Malformed gateway event: {e}");
            AppError::internal("Internal server error")
        })
    }

    /// Sets a plain text body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// HTTP-shaped response returned to the gateway
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    /// HTTP status code
    pub status_code: u16,
    /// Response headers
    pub headers: BTreeMap<String, String>,
    /// Response body, base64 encoded when `is_base64_encoded` is set
    pub body: String,
    /// Whether `body` carries base64 encoded binary content
    pub is_base64_encoded: bool,
}

impl GatewayResponse {
    /// Serializes `data` into a JSON response
    ///
    /// Falls back to a 500 response when serialization fails.
    #[must_use]
    pub fn json<T: Serialize>(status: StatusCode, data: &T) -> Self {
        match serde_json::to_string(data) {
            Ok(body) => Self::text(status, mime::APPLICATION_JSON.as_ref(), body),
            Err(e) => {
                tracing::error!("Failed to serialize response body: {e}");
                Self::text(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    mime::APPLICATION_JSON.as_ref(),
                    r#"{"error":"Internal server error","statusCode":500}"#.to_string(),
                )
            }
        }
    }

    /// Builds a response with base64 encoded binary content
    #[must_use]
    pub fn binary(status: StatusCode, content_type: &str, bytes: &[u8]) -> Self {
        let mut response = Self::text(status, content_type, STANDARD.encode(bytes));
        response.is_base64_encoded = true;
        response.with_header("Content-Length", &bytes.len().to_string())
    }

    fn text(status: StatusCode, content_type: &str, body: String) -> Self {
        Self {
            status_code: status.as_u16(),
            headers: BTreeMap::from([("Content-Type".to_string(), content_type.to_string())]),
            body,
            is_base64_encoded: false,
        }
    }

    /// Adds or replaces a header
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Adds permissive CORS headers advertising `allow_methods`
    #[must_use]
    pub fn with_cors(self, allow_methods: &str) -> Self {
        self.with_header("Access-Control-Allow-Origin", "*")
            .with_header("Access-Control-Allow-Methods", allow_methods)
            .with_header("Access-Control-Allow-Headers", CORS_ALLOW_HEADERS)
    }

    /// Looks up a header by case-insensitive name
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Runs a handler future, turning a panic into a 500 response
///
/// Handlers already map every error to a response; this guard covers the
/// remaining case so the caller always receives a well-formed reply.
pub async fn guarded<F>(allow_methods: &'static str, handler: F) -> GatewayResponse
where
    F: Future<Output = GatewayResponse>,
{
    catch_panic(handler, || {
        AppError::internal("Internal server error").into_gateway_response(allow_methods)
    })
    .await
}

/// Runs a handler future, replying with `on_panic()` if it panics
pub async fn catch_panic<F, P>(handler: F, on_panic: P) -> GatewayResponse
where
    F: Future<Output = GatewayResponse>,
    P: FnOnce() -> GatewayResponse,
{
    match AssertUnwindSafe(handler).catch_unwind().await {
        Ok(response) => response,
        Err(_) => {
            tracing::error!("Handler panicked while processing request");
            on_panic()
        }
    }
}

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = if self.is_base64_encoded {
            match STANDARD.decode(self.body.as_bytes()) {
                Ok(bytes) => Body::from(bytes),
                Err(e) => {
                    tracing::error!("Handler produced invalid base64 body: {e}");
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
            }
        } else {
            Body::from(self.body)
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        for (name, value) in self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                response.headers_mut().insert(name, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let request: GatewayRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(request.http_method, "GET");
        assert_eq!(request.path, "");
        assert!(request.body.is_none());
        assert!(!request.is_base64_encoded);
    }

    #[test]
    fn test_request_keeps_unknown_fields() {
        let request: GatewayRequest = serde_json::from_value(json!({
            "path": "/upload",
            "body": null,
            "requestContext": {"domainName": "api.example.com", "stage": "prod"},
            "filename": "cat.png"
        }))
        .unwrap();

        assert!(request.body.is_none());
        assert_eq!(request.extra.get("filename"), Some(&json!("cat.png")));
        let context = request.request_context.unwrap();
        assert_eq!(context.domain_name.as_deref(), Some("api.example.com"));
        assert_eq!(context.stage.as_deref(), Some("prod"));
    }

    #[test]
    fn test_response_serializes_in_gateway_shape() {
        let response =
            GatewayResponse::json(StatusCode::OK, &json!({"ok": true})).with_cors("GET, OPTIONS");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["body"], r#"{"ok":true}"#);
        assert_eq!(value["isBase64Encoded"], false);
        assert_eq!(value["headers"]["Access-Control-Allow-Origin"], "*");
        assert_eq!(value["headers"]["Content-Type"], "application/json");
    }

    #[test]
    fn test_binary_response() {
        let response = GatewayResponse::binary(StatusCode::OK, "image/png", b"\x89PNG");
        assert!(response.is_base64_encoded);
        assert_eq!(response.body, "iVBORw==");
        assert_eq!(response.header("Content-Length"), Some("4"));
        assert_eq!(response.header("Content-Type"), Some("image/png"));
    }

    fn exploding_handler() -> GatewayResponse {
        panic!("boom")
    }

    #[tokio::test]
    async fn test_guarded_converts_panics() {
        let response = guarded(GALLERY_ALLOW_METHODS, async { exploding_handler() }).await;

        assert_eq!(response.status_code, 500);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body, json!({"error": "Internal server error", "statusCode": 500}));
    }

    #[tokio::test]
    async fn test_catch_panic_uses_fallback_response() {
        let response = catch_panic(async { exploding_handler() }, || {
            GatewayResponse::json(StatusCode::INTERNAL_SERVER_ERROR, &json!({"error": "boom"}))
        })
        .await;

        assert_eq!(response.status_code, 500);
        assert_eq!(response.body, r#"{"error":"boom"}"#);
    }

    #[test]
    fn test_from_event_rejects_malformed_events() {
        for event in [
            json!({"httpMethod": "GET", "path": null}),
            json!({"body": {"filename": "a.png"}}),
            json!(["not", "an", "object"]),
        ] {
            let err = GatewayRequest::from_event(event.clone()).unwrap_err();
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR, "{event}");
            assert_eq!(err.message(), "Internal server error");
        }

        let request = GatewayRequest::from_event(json!({"path": "/images"})).unwrap();
        assert_eq!(request.path, "/images");
    }
}
