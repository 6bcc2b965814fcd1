//! Gallery listing and single image retrieval
//!
//! Requests are routed on their path:
//! - a path equal to or ending in `/images` lists the thumbnails,
//! - a path starting with `/image/` returns one image as a base64 body,
//! - anything else falls back to the listing.

mod error;

use axum::http::StatusCode;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

pub use error::GalleryError;

use crate::{
    media_storage::ObjectStore,
    state::AppState,
    types::{
        guarded, AppConfig, AppError, GatewayRequest, GatewayResponse, GALLERY_ALLOW_METHODS,
        IMAGE_ALLOW_METHODS,
    },
};

/// Prefix shared by every gallery-displayable object
pub const THUMBNAIL_PREFIX: &str = "thumb-";

const IMAGE_PATH_MARKER: &str = "/image/";
const IMAGE_CACHE_CONTROL: &str = "public, max-age=86400";
const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];
const DEFAULT_API_BASE_URL: &str = "https://phz0r20w4l.execute-api.eu-west-1.amazonaws.com/prod";

/// One thumbnail in the gallery listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSummary {
    /// Object key, always starting with `thumb-`
    pub key: String,
    /// Public object URL
    pub url: String,
    /// RFC 3339 last modification time
    pub last_modified: String,
    /// Size in bytes
    pub size: i64,
}

/// Gallery listing, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryResponse {
    /// Thumbnails sorted by last modification time, descending
    pub images: Vec<ImageSummary>,
    /// Number of entries in `images`
    pub count: usize,
}

/// Raw image bytes ready to be sent to the client
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// Validated content type
    pub content_type: String,
    /// Raw object bytes
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    fn into_gateway_response(self) -> GatewayResponse {
        GatewayResponse::binary(StatusCode::OK, &self.content_type, &self.bytes)
            .with_header("Cache-Control", IMAGE_CACHE_CONTROL)
            .with_cors(IMAGE_ALLOW_METHODS)
    }
}

/// Operation selected by the request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// List every thumbnail
    ListImages,
    /// Fetch a single image
    GetImage,
}

impl Route {
    /// Selects the operation for a path; unknown paths list images
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        if path.ends_with("/images") {
            Self::ListImages
        } else if path.starts_with(IMAGE_PATH_MARKER) {
            Self::GetImage
        } else {
            Self::ListImages
        }
    }
}

/// Handles a raw invocation payload
///
/// Payloads without the gateway event shape produce a 500 error response.
pub async fn handle_event(state: &AppState, event: Value) -> GatewayResponse {
    match GatewayRequest::from_event(event) {
        Ok(request) => handle(state, request).await,
        Err(err) => err.into_gateway_response(GALLERY_ALLOW_METHODS),
    }
}

/// Handles one gallery request
///
/// Always produces a response; failures and panics become JSON error bodies.
pub async fn handle(state: &AppState, request: GatewayRequest) -> GatewayResponse {
    guarded(GALLERY_ALLOW_METHODS, dispatch(state, &request)).await
}

#[instrument(skip_all, fields(method = %request.http_method, path = %request.path))]
async fn dispatch(state: &AppState, request: &GatewayRequest) -> GatewayResponse {
    info!("Processing gallery request");
    debug!(
        api_base_url = %api_base_url(&state.config, request),
        "Resolved public API base URL"
    );

    match Route::from_path(&request.path) {
        Route::ListImages => match list_images(state.store.as_ref(), &state.config).await {
            Ok(gallery) => {
                GatewayResponse::json(StatusCode::OK, &gallery).with_cors(GALLERY_ALLOW_METHODS)
            }
            Err(err) => AppError::from(err).into_gateway_response(GALLERY_ALLOW_METHODS),
        },
        Route::GetImage => {
            match fetch_image(state.store.as_ref(), &state.config, &request.path).await {
                Ok(image) => image.into_gateway_response(),
                Err(err) => AppError::from(err).into_gateway_response(GALLERY_ALLOW_METHODS),
            }
        }
    }
}

/// Lists the thumbnails in the configured bucket, newest first
///
/// Objects without the `thumb-` prefix are dropped. Entries with equal
/// modification times keep the order the store returned them in.
///
/// # Errors
///
/// Returns `GalleryError::List` if the store listing fails
#[instrument(skip_all, fields(bucket = %config.thumbnail_bucket))]
pub async fn list_images(
    store: &dyn ObjectStore,
    config: &AppConfig,
) -> Result<GalleryResponse, GalleryError> {
    let mut objects = store
        .list_objects(&config.thumbnail_bucket)
        .await
        .map_err(GalleryError::List)?;

    objects.retain(|object| object.key.starts_with(THUMBNAIL_PREFIX));
    objects.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));

    let images: Vec<ImageSummary> = objects
        .into_iter()
        .map(|object| ImageSummary {
            url: config.public_object_url(&object.key),
            last_modified: object.last_modified.to_rfc3339(),
            size: object.size,
            key: object.key,
        })
        .collect();

    info!("Found {} images", images.len());

    Ok(GalleryResponse {
        count: images.len(),
        images,
    })
}

/// Fetches the image named by an `/image/{key}` path
///
/// Content types outside the image allow-list are served as `image/jpeg`.
///
/// # Errors
///
/// Returns `GalleryError::MissingImageKey` or `GalleryError::InvalidImagePath`
/// for malformed paths, and `GalleryError::Fetch` if the store read fails
#[instrument(skip_all, fields(bucket = %config.thumbnail_bucket))]
pub async fn fetch_image(
    store: &dyn ObjectStore,
    config: &AppConfig,
    path: &str,
) -> Result<ImagePayload, GalleryError> {
    let key = image_key_from_path(path)?;
    info!("Fetching image: {key}");

    let object = store
        .get_object(&config.thumbnail_bucket, &key)
        .await
        .map_err(|source| GalleryError::Fetch {
            key: key.clone(),
            source,
        })?;

    let content_type = object
        .content_type
        .unwrap_or_else(|| mime::IMAGE_JPEG.to_string());
    let content_type = if ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
        content_type
    } else {
        warn!("Invalid content type: {content_type} for key: {key}");
        mime::IMAGE_JPEG.to_string()
    };

    Ok(ImagePayload {
        content_type,
        bytes: object.body,
    })
}

/// Extracts and percent-decodes the object key following the last `/image/`
///
/// # Errors
///
/// Returns `GalleryError::InvalidImagePath` when the path has no `/image/`
/// segment and `GalleryError::MissingImageKey` when nothing follows it
pub fn image_key_from_path(path: &str) -> Result<String, GalleryError> {
    let (_, raw_key) = path
        .rsplit_once(IMAGE_PATH_MARKER)
        .ok_or_else(|| GalleryError::InvalidImagePath(path.to_string()))?;

    if raw_key.is_empty() {
        return Err(GalleryError::MissingImageKey);
    }

    Ok(percent_decode_str(raw_key).decode_utf8_lossy().into_owned())
}

/// Public base URL for absolute links
///
/// Prefers the configured URL, then the request's domain and stage, then a
/// fixed default.
#[must_use]
pub fn api_base_url(config: &AppConfig, request: &GatewayRequest) -> String {
    if let Some(url) = &config.api_gateway_url {
        return url.trim_end_matches('/').to_string();
    }

    request
        .request_context
        .as_ref()
        .and_then(|context| match (&context.domain_name, &context.stage) {
            (Some(domain), Some(stage)) if !domain.is_empty() && !stage.is_empty() => {
                Some(format!("https://{domain}/{stage}"))
            }
            _ => None,
        })
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
}
