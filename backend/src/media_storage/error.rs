//! Error types for object store operations

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// Result type for object store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during object store operations
///
/// Service errors are discriminated by the error code the store reports, the
/// remaining variants cover failures that never reached the service or
/// happened after it answered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The bucket does not exist
    #[error("NoSuchBucket: {0}")]
    NoSuchBucket(String),

    /// The object key does not exist
    #[error("NoSuchKey: {0}")]
    NoSuchKey(String),

    /// The caller is not allowed to access the resource
    #[error("AccessDenied: {0}")]
    AccessDenied(String),

    /// Any other error code reported by the store
    #[error("{code}: {message}")]
    Service {
        /// Error code reported by the store
        code: String,
        /// Error message reported by the store
        message: String,
    },

    /// The request failed before a service response was received
    #[error("Transport error: {0}")]
    Transport(String),

    /// Reading the object body failed
    #[error("Failed to read object body: {0}")]
    Body(String),

    /// Presigning configuration could not be built
    #[error("Presigning error: {0}")]
    Presign(String),
}

impl StorageError {
    /// Builds an error from a store error code and message
    #[must_use]
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            "NoSuchBucket" => Self::NoSuchBucket(message),
            "NoSuchKey" => Self::NoSuchKey(message),
            "AccessDenied" => Self::AccessDenied(message),
            _ => Self::Service {
                code: code.to_string(),
                message,
            },
        }
    }

    /// Error code reported by the store, if the error came from the service
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::NoSuchBucket(_) => Some("NoSuchBucket"),
            Self::NoSuchKey(_) => Some("NoSuchKey"),
            Self::AccessDenied(_) => Some("AccessDenied"),
            Self::Service { code, .. } => Some(code),
            Self::Transport(_) | Self::Body(_) | Self::Presign(_) => None,
        }
    }

    /// Whether the store answered with an error response
    #[must_use]
    pub fn is_service_error(&self) -> bool {
        self.code().is_some()
    }
}

impl<E, R> From<SdkError<E, R>> for StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    fn from(error: SdkError<E, R>) -> Self {
        let detail = DisplayErrorContext(&error).to_string();
        match error.code() {
            Some(code) => Self::from_code(code, detail),
            None => Self::Transport(detail),
        }
    }
}
