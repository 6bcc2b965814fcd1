//! Object store operations for original images and thumbnails
mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
mod s3;

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

pub use error::{StorageError, StorageResult};
pub use s3::S3ObjectStore;

/// Listing entry for a stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Object key
    pub key: String,
    /// Last modification time reported by the store
    pub last_modified: DateTime<Utc>,
    /// Object size in bytes
    pub size: i64,
}

/// Object contents together with the metadata the handlers need
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Raw object bytes
    pub body: Vec<u8>,
    /// Content type recorded on the object, if any
    pub content_type: Option<String>,
}

/// A new object to be written to the store
#[derive(Debug, Clone)]
pub struct NewObject {
    /// Raw object bytes
    pub body: Vec<u8>,
    /// Content type to record on the object
    pub content_type: String,
    /// Optional `Cache-Control` value served with the object
    pub cache_control: Option<String>,
    /// User metadata stored alongside the object
    pub metadata: BTreeMap<String, String>,
}

/// Parameters baked into a presigned PUT request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedPut {
    /// Target bucket
    pub bucket: String,
    /// Target object key
    pub key: String,
    /// Content type the uploader must send
    pub content_type: String,
    /// User metadata the uploader must send
    pub metadata: BTreeMap<String, String>,
    /// How long the URL stays valid
    pub expires_in: Duration,
}

/// Presigned URL with expiration information
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL for PUT operations
    pub url: String,
    /// ISO-8601 UTC timestamp when the URL expires
    pub expires_at: DateTime<Utc>,
}

/// Object store capability used by every handler
///
/// Each call is a single round trip; retries and timeouts are configured on
/// the underlying client.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists every object in the bucket in store order
    async fn list_objects(&self, bucket: &str) -> StorageResult<Vec<ObjectSummary>>;

    /// Fetches an object's bytes and content type
    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<StoredObject>;

    /// Checks whether an object exists
    ///
    /// * `Ok(true)` if object exists
    /// * `Ok(false)` if object does not exist
    /// * `Err(StorageError)` if the store operation fails
    async fn object_exists(&self, bucket: &str, key: &str) -> StorageResult<bool>;

    /// Writes an object, replacing any existing one
    async fn put_object(&self, bucket: &str, key: &str, object: NewObject) -> StorageResult<()>;

    /// Generates a presigned URL for a single PUT operation
    async fn presign_put(&self, request: &PresignedPut) -> StorageResult<PresignedUrl>;
}
