//! Error types for upload URL issuing

use thiserror::Error;

use crate::{media_storage::StorageError, types::AppError};

/// Errors that can occur while issuing an upload URL
#[derive(Error, Debug)]
pub enum UploadError {
    /// The request body could not be read as an upload request
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// The requested content type is not an accepted image type
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// The object store rejected the presign request
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match &err {
            UploadError::InvalidBody(_) | UploadError::UnsupportedContentType(_) => {
                Self::bad_request(format!("Validation error: {err}"))
            }
            UploadError::Storage(source) if source.is_service_error() => {
                Self::internal(format!("AWS service error: {source}"))
            }
            UploadError::Storage(source) => {
                Self::internal(format!("Internal server error: {source}"))
            }
        }
    }
}
