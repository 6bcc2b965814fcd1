//! Error types for gallery operations

use thiserror::Error;

use crate::{media_storage::StorageError, types::AppError};

/// Errors that can occur while serving the gallery
#[derive(Error, Debug)]
pub enum GalleryError {
    /// Path does not contain `/image/`
    #[error("Invalid image path: {0}")]
    InvalidImagePath(String),

    /// Nothing follows `/image/`
    #[error("Image key is missing")]
    MissingImageKey,

    /// Listing the thumbnail bucket failed
    #[error("Failed to list thumbnails: {0}")]
    List(#[source] StorageError),

    /// Fetching a single image failed
    #[error("Failed to fetch image {key}: {source}")]
    Fetch {
        /// Decoded object key
        key: String,
        /// Underlying store error
        #[source]
        source: StorageError,
    },
}

impl From<GalleryError> for AppError {
    fn from(err: GalleryError) -> Self {
        match err {
            GalleryError::InvalidImagePath(_) => Self::bad_request("Invalid image path format"),
            GalleryError::MissingImageKey => Self::bad_request("Image key is required"),
            GalleryError::List(source) => match source {
                StorageError::NoSuchBucket(_) => Self::not_found("Thumbnail bucket not found"),
                StorageError::AccessDenied(_) => {
                    Self::forbidden("Access denied to thumbnail bucket")
                }
                other if other.is_service_error() => Self::internal("Failed to list images"),
                _ => Self::internal("Failed to retrieve gallery"),
            },
            GalleryError::Fetch { source, .. } => match source {
                StorageError::NoSuchKey(_) => Self::not_found("Image not found"),
                StorageError::NoSuchBucket(_) => Self::not_found("Thumbnail bucket not found"),
                StorageError::AccessDenied(_) => Self::forbidden("Access denied to image"),
                other if other.is_service_error() => Self::internal("Failed to fetch image"),
                _ => Self::internal("Failed to retrieve image"),
            },
        }
    }
}
