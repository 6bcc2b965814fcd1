//! Local HTTP routes mirroring the gateway integration

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};

use crate::{
    gallery,
    state::AppState,
    types::{GatewayRequest, RequestContext},
    upload,
};

/// Creates the router: `POST /upload` issues upload URLs, every other request is the gallery
pub fn handler() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_url))
        .method_not_allowed_fallback(gallery_request)
        .fallback(gallery_request)
}

async fn upload_url(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = gateway_request(&method, &uri, &headers, &body);
    upload::handle(&state, request).await.into_response()
}

async fn gallery_request(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = gateway_request(&method, &uri, &headers, &body);
    gallery::handle(&state, request).await.into_response()
}

/// Builds the gateway event an HTTP request would have produced
fn gateway_request(method: &Method, uri: &Uri, headers: &HeaderMap, body: &Bytes) -> GatewayRequest {
    let mut request = GatewayRequest::new(method.as_str(), uri.path());
    if !body.is_empty() {
        request = request.with_body(String::from_utf8_lossy(body));
    }
    request.request_context = headers
        .get(header::HOST)
        .and_then(|host| host.to_str().ok())
        .map(|host| RequestContext {
            domain_name: Some(host.to_string()),
            stage: None,
        });
    request
}
