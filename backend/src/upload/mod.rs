//! Presigned upload URL issuing

mod error;
pub mod filename;

use std::collections::BTreeMap;

use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

pub use error::UploadError;

use crate::{
    media_storage::{ObjectStore, PresignedPut},
    state::AppState,
    types::{guarded, AppConfig, AppError, GatewayRequest, GatewayResponse, UPLOAD_ALLOW_METHODS},
};

/// Content types accepted for uploads
pub const ALLOWED_UPLOAD_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Requested upload, every field optional
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    /// Desired filename; a name is generated when absent
    pub filename: Option<String>,
    /// Content type of the upload, `image/jpeg` when absent
    pub content_type: Option<String>,
}

/// Upload credential returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Presigned PUT URL
    pub upload_url: String,
    /// Key the object will be stored under
    pub filename: String,
    /// Filename as supplied (or generated)
    pub original_filename: String,
}

/// Handles a raw invocation payload
///
/// Payloads without the gateway event shape produce a 500 error response.
pub async fn handle_event(state: &AppState, event: Value) -> GatewayResponse {
    match GatewayRequest::from_event(event) {
        Ok(request) => handle(state, request).await,
        Err(err) => err.into_gateway_response(UPLOAD_ALLOW_METHODS),
    }
}

/// Handles one upload URL request
///
/// Always produces a response; failures and panics become JSON error bodies.
pub async fn handle(state: &AppState, request: GatewayRequest) -> GatewayResponse {
    guarded(UPLOAD_ALLOW_METHODS, dispatch(state, &request)).await
}

#[instrument(skip_all, fields(method = %request.http_method))]
async fn dispatch(state: &AppState, request: &GatewayRequest) -> GatewayResponse {
    let result = match parse_request(request) {
        Ok(upload) => issue_upload_url(state.store.as_ref(), &state.config, upload).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(response) => {
            GatewayResponse::json(StatusCode::OK, &response).with_cors(UPLOAD_ALLOW_METHODS)
        }
        Err(err) => AppError::from(err).into_gateway_response(UPLOAD_ALLOW_METHODS),
    }
}

/// Reads the upload request from the body, or from the event itself when there is no body
///
/// # Errors
///
/// Returns `UploadError::InvalidBody` if the body is not a JSON upload request
pub fn parse_request(request: &GatewayRequest) -> Result<UploadRequest, UploadError> {
    let Some(body) = request.body.as_deref().filter(|body| !body.is_empty()) else {
        return serde_json::from_value(Value::Object(request.extra.clone()))
            .map_err(|e| UploadError::InvalidBody(e.to_string()));
    };

    let body = if request.is_base64_encoded {
        let bytes = STANDARD
            .decode(body)
            .map_err(|e| UploadError::InvalidBody(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| UploadError::InvalidBody(e.to_string()))?
    } else {
        body.to_string()
    };

    serde_json::from_str(&body).map_err(|e| UploadError::InvalidBody(e.to_string()))
}

/// Validates the request and asks the store for a presigned PUT URL
///
/// The stored filename is the sanitized original with a fresh 8 character
/// token, so repeated uploads of the same name never collide.
///
/// # Errors
///
/// Returns `UploadError::UnsupportedContentType` for non-image content types
/// and `UploadError::Storage` if presigning fails
#[instrument(skip_all, fields(bucket = %config.upload_bucket))]
pub async fn issue_upload_url(
    store: &dyn ObjectStore,
    config: &AppConfig,
    upload: UploadRequest,
) -> Result<UploadResponse, UploadError> {
    let original_filename = upload
        .filename
        .unwrap_or_else(filename::generated_filename);
    let content_type = upload
        .content_type
        .unwrap_or_else(|| mime::IMAGE_JPEG.to_string());
    let final_filename = filename::storage_filename(&original_filename);

    info!("Original: {original_filename}, Safe: {final_filename}, Content-Type: {content_type}");

    if !ALLOWED_UPLOAD_TYPES.contains(&content_type.as_str()) {
        return Err(UploadError::UnsupportedContentType(content_type));
    }

    // upload-timestamp carries a random token, not a wall-clock time
    let metadata = BTreeMap::from([
        ("original-filename".to_string(), original_filename.clone()),
        ("upload-timestamp".to_string(), Uuid::new_v4().to_string()),
    ]);

    let presigned_url = store
        .presign_put(&PresignedPut {
            bucket: config.upload_bucket.clone(),
            key: final_filename.clone(),
            content_type,
            metadata,
            expires_in: config.presigned_url_expiry,
        })
        .await?;

    info!("Generated presigned URL for: {final_filename}");

    Ok(UploadResponse {
        upload_url: presigned_url.url,
        filename: final_filename,
        original_filename,
    })
}
