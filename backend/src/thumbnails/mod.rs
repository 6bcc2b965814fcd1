//! Thumbnail generation for newly uploaded originals
//!
//! Consumes object-created notifications for the upload bucket and writes a
//! `thumb-` prefixed JPEG into the thumbnail bucket for each new image.

pub mod resize;

use std::collections::BTreeMap;
use std::path::Path;

use axum::http::StatusCode;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::{
    gallery::THUMBNAIL_PREFIX,
    media_storage::{NewObject, ObjectStore, StorageError},
    state::AppState,
    types::{catch_panic, AppConfig, GatewayResponse},
};

const RESIZED_PREFIX: &str = "resized-";
const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff"];
const THUMBNAIL_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Object-created notification
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObjectCreatedEvent {
    /// Notification records, processed in order
    #[serde(rename = "Records")]
    pub records: Vec<EventRecord>,
}

/// One notification record
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventRecord {
    /// Storage details of the created object
    pub s3: S3Entity,
}

/// Bucket and object named by a record
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct S3Entity {
    /// Bucket the object was written to
    pub bucket: S3Bucket,
    /// The created object
    pub object: S3Object,
}

/// Bucket reference
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct S3Bucket {
    /// Bucket name
    pub name: String,
}

/// Object reference
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct S3Object {
    /// Form-URL-encoded object key
    pub key: String,
}

/// Errors that can occur while generating thumbnails
#[derive(Error, Debug)]
pub enum ThumbnailError {
    /// The notification payload could not be parsed
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// An object store call failed
    #[error("Storage error for {key}: {source}")]
    Storage {
        /// Object key being processed
        key: String,
        /// Underlying store error
        #[source]
        source: StorageError,
    },

    /// The original could not be turned into a thumbnail
    #[error("Error creating thumbnail for {key}: {source}")]
    Image {
        /// Object key being processed
        key: String,
        /// Underlying image error
        #[source]
        source: image::ImageError,
    },

    /// The rendering task did not complete
    #[error("Thumbnail worker failed for {key}: {reason}")]
    Worker {
        /// Object key being processed
        key: String,
        /// Why the task failed
        reason: String,
    },
}

/// What happened to a single record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A thumbnail was written under the given key
    Created(String),
    /// The object is itself a derived image
    SkippedDerived,
    /// The object does not have an image extension
    SkippedNotImage,
    /// A thumbnail already exists
    SkippedExisting,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessedReport {
    message: &'static str,
    processed_records: usize,
}

#[derive(Debug, Serialize)]
struct FailureReport {
    error: String,
    message: &'static str,
}

/// Handles one object-created notification
///
/// Returns 200 with the number of records when every record was handled and
/// 500 with the first error otherwise.
pub async fn handle(state: &AppState, event: Value) -> GatewayResponse {
    catch_panic(dispatch(state, event), || {
        failure_response("Internal server error".to_string())
    })
    .await
}

async fn dispatch(state: &AppState, event: Value) -> GatewayResponse {
    let result = match serde_json::from_value::<ObjectCreatedEvent>(event) {
        Ok(event) => process_event(state.store.as_ref(), &state.config, &event).await,
        Err(e) => Err(ThumbnailError::InvalidEvent(e.to_string())),
    };

    match result {
        Ok(outcomes) => GatewayResponse::json(
            StatusCode::OK,
            &ProcessedReport {
                message: "All thumbnails processed successfully",
                processed_records: outcomes.len(),
            },
        ),
        Err(err) => {
            error!("Thumbnail function error: {err}");
            failure_response(err.to_string())
        }
    }
}

fn failure_response(error: String) -> GatewayResponse {
    GatewayResponse::json(
        StatusCode::INTERNAL_SERVER_ERROR,
        &FailureReport {
            error,
            message: "Failed to process image",
        },
    )
}

/// Processes every record in order, stopping at the first failure
///
/// # Errors
///
/// Returns the first `ThumbnailError` raised by a record
pub async fn process_event(
    store: &dyn ObjectStore,
    config: &AppConfig,
    event: &ObjectCreatedEvent,
) -> Result<Vec<RecordOutcome>, ThumbnailError> {
    let mut outcomes = Vec::with_capacity(event.records.len());
    for record in &event.records {
        outcomes.push(process_record(store, config, record).await?);
    }
    Ok(outcomes)
}

/// Generates the thumbnail for one record
///
/// # Errors
///
/// Returns `ThumbnailError` if the store calls or rendering fail
#[instrument(skip_all, fields(bucket = %record.s3.bucket.name))]
pub async fn process_record(
    store: &dyn ObjectStore,
    config: &AppConfig,
    record: &EventRecord,
) -> Result<RecordOutcome, ThumbnailError> {
    let bucket = &record.s3.bucket.name;
    let key = decode_event_key(&record.s3.object.key);
    info!("Processing image: {key} from bucket: {bucket}");

    if key.starts_with(THUMBNAIL_PREFIX) || key.starts_with(RESIZED_PREFIX) {
        info!("Skipping thumbnail file: {key}");
        return Ok(RecordOutcome::SkippedDerived);
    }

    if !is_image_file(&key) {
        info!("Skipping non-image file: {key}");
        return Ok(RecordOutcome::SkippedNotImage);
    }

    let thumbnail_key = format!("{THUMBNAIL_PREFIX}{key}");
    let storage_error = |source: StorageError| ThumbnailError::Storage {
        key: key.clone(),
        source,
    };

    if store
        .object_exists(&config.thumbnail_bucket, &thumbnail_key)
        .await
        .map_err(storage_error)?
    {
        info!("Thumbnail already exists: {thumbnail_key}");
        return Ok(RecordOutcome::SkippedExisting);
    }

    let original = store
        .get_object(bucket, &key)
        .await
        .map_err(storage_error)?;

    let thumbnail = tokio::task::spawn_blocking(move || resize::create_thumbnail(&original.body))
        .await
        .map_err(|e| ThumbnailError::Worker {
            key: key.clone(),
            reason: e.to_string(),
        })?
        .map_err(|source| ThumbnailError::Image {
            key: key.clone(),
            source,
        })?;
    info!("Thumbnail created - Size: {} bytes", thumbnail.len());

    let metadata = BTreeMap::from([
        ("original-key".to_string(), key.clone()),
        ("original-bucket".to_string(), bucket.clone()),
        ("thumbnail-created".to_string(), "true".to_string()),
    ]);

    store
        .put_object(
            &config.thumbnail_bucket,
            &thumbnail_key,
            NewObject {
                body: thumbnail,
                content_type: mime::IMAGE_JPEG.to_string(),
                cache_control: Some(THUMBNAIL_CACHE_CONTROL.to_string()),
                metadata,
            },
        )
        .await
        .map_err(storage_error)?;

    info!("Successfully processed: {key} -> {thumbnail_key}");
    Ok(RecordOutcome::Created(thumbnail_key))
}

/// Decodes a notification key, where `+` encodes a space
#[must_use]
pub fn decode_event_key(raw_key: &str) -> String {
    percent_decode_str(&raw_key.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

/// Whether the key has one of the supported image extensions
#[must_use]
pub fn is_image_file(key: &str) -> bool {
    Path::new(&key.to_lowercase())
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext))
}
