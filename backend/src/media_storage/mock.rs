//! In-memory object store for tests

use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::{
    NewObject, ObjectStore, ObjectSummary, PresignedPut, PresignedUrl, StorageError,
    StorageResult, StoredObject,
};

/// Object held by the mock store
#[derive(Debug, Clone)]
pub struct MockObject {
    /// Bucket the object lives in
    pub bucket: String,
    /// Object key
    pub key: String,
    /// Raw bytes
    pub body: Vec<u8>,
    /// Content type, if any
    pub content_type: Option<String>,
    /// Last modification time
    pub last_modified: DateTime<Utc>,
    /// `Cache-Control` recorded on write
    pub cache_control: Option<String>,
    /// User metadata recorded on write
    pub metadata: Vec<(String, String)>,
}

/// Object store that keeps objects in insertion order and can be told to fail
#[derive(Default)]
pub struct MockObjectStore {
    objects: Mutex<Vec<MockObject>>,
    failure: Mutex<Option<StorageError>>,
    presigned: Mutex<Vec<PresignedPut>>,
}

impl MockObjectStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object, keeping insertion order for listings
    pub fn insert(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        last_modified: DateTime<Utc>,
    ) {
        self.lock_objects().push(MockObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body,
            content_type: content_type.map(ToString::to_string),
            last_modified,
            cache_control: None,
            metadata: Vec::new(),
        });
    }

    /// Makes every subsequent call fail with the given error
    pub fn fail_with(&self, error: StorageError) {
        *self.failure.lock().expect("mock failure lock poisoned") = Some(error);
    }

    /// Returns a stored object
    #[must_use]
    pub fn object(&self, bucket: &str, key: &str) -> Option<MockObject> {
        self.lock_objects()
            .iter()
            .find(|o| o.bucket == bucket && o.key == key)
            .cloned()
    }

    /// Number of objects in a bucket
    #[must_use]
    pub fn object_count(&self, bucket: &str) -> usize {
        self.lock_objects()
            .iter()
            .filter(|o| o.bucket == bucket)
            .count()
    }

    /// Presign requests received so far
    #[must_use]
    pub fn presigned_requests(&self) -> Vec<PresignedPut> {
        self.presigned
            .lock()
            .expect("mock presign lock poisoned")
            .clone()
    }

    fn lock_objects(&self) -> std::sync::MutexGuard<'_, Vec<MockObject>> {
        self.objects.lock().expect("mock objects lock poisoned")
    }

    fn check_failure(&self) -> StorageResult<()> {
        match self
            .failure
            .lock()
            .expect("mock failure lock poisoned")
            .clone()
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for MockObjectStore {
    async fn list_objects(&self, bucket: &str) -> StorageResult<Vec<ObjectSummary>> {
        self.check_failure()?;
        Ok(self
            .lock_objects()
            .iter()
            .filter(|o| o.bucket == bucket)
            .map(|o| ObjectSummary {
                key: o.key.clone(),
                last_modified: o.last_modified,
                size: i64::try_from(o.body.len()).unwrap_or(i64::MAX),
            })
            .collect())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<StoredObject> {
        self.check_failure()?;
        self.object(bucket, key)
            .map(|o| StoredObject {
                body: o.body,
                content_type: o.content_type,
            })
            .ok_or_else(|| StorageError::NoSuchKey(format!("{bucket}/{key}")))
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        self.check_failure()?;
        Ok(self.object(bucket, key).is_some())
    }

    async fn put_object(&self, bucket: &str, key: &str, object: NewObject) -> StorageResult<()> {
        self.check_failure()?;
        let mut objects = self.lock_objects();
        objects.retain(|o| !(o.bucket == bucket && o.key == key));
        objects.push(MockObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body: object.body,
            content_type: Some(object.content_type),
            last_modified: Utc::now(),
            cache_control: object.cache_control,
            metadata: object.metadata.into_iter().collect(),
        });
        Ok(())
    }

    async fn presign_put(&self, request: &PresignedPut) -> StorageResult<PresignedUrl> {
        self.check_failure()?;
        self.presigned
            .lock()
            .expect("mock presign lock poisoned")
            .push(request.clone());

        Ok(PresignedUrl {
            url: format!(
                "https://{}.s3.localhost/{}?X-Amz-Expires={}",
                request.bucket,
                request.key,
                request.expires_in.as_secs()
            ),
            expires_at: Utc::now() + request.expires_in,
        })
    }
}
