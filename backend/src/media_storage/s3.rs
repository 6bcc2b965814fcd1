//! S3 implementation of the object store

use std::sync::Arc;

use aws_sdk_s3::{
    error::SdkError, operation::head_object::HeadObjectError, presigning::PresigningConfig,
    primitives::ByteStream, types::Object, Client as S3Client,
};
use chrono::{DateTime, Utc};
use tracing::{debug, error};

use super::{
    NewObject, ObjectStore, ObjectSummary, PresignedPut, PresignedUrl, StorageError,
    StorageResult, StoredObject,
};

/// Object store backed by an S3 client
pub struct S3ObjectStore {
    s3_client: Arc<S3Client>,
}

impl S3ObjectStore {
    /// Creates a new S3 object store
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client, shared for the lifetime of the process
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>) -> Self {
        Self { s3_client }
    }

    fn summarize(object: &Object) -> Option<ObjectSummary> {
        let key = object.key()?.to_string();
        let last_modified = object
            .last_modified()
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts.secs(), ts.subsec_nanos()))
            .unwrap_or_default();

        Some(ObjectSummary {
            key,
            last_modified,
            size: object.size().unwrap_or_default(),
        })
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_objects(&self, bucket: &str) -> StorageResult<Vec<ObjectSummary>> {
        let mut pages = self
            .s3_client
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(StorageError::from)?;
            objects.extend(page.contents().iter().filter_map(Self::summarize));
        }

        debug!("Listed {} objects from bucket: {}", objects.len(), bucket);
        Ok(objects)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<StoredObject> {
        let output = self
            .s3_client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await?;

        let content_type = output.content_type().map(ToString::to_string);
        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Body(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(StoredObject { body, content_type })
    }

    #[allow(clippy::cognitive_complexity)]
    async fn object_exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        let result = self
            .s3_client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(service_err))
                if matches!(service_err.err(), HeadObjectError::NotFound(_)) =>
            {
                Ok(false)
            }
            Err(e) => {
                error!("Failed to check object existence for {}: {}", key, e);
                Err(StorageError::from(e))
            }
        }
    }

    async fn put_object(&self, bucket: &str, key: &str, object: NewObject) -> StorageResult<()> {
        let request = self
            .s3_client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(object.body))
            .content_type(object.content_type)
            .set_cache_control(object.cache_control);

        object
            .metadata
            .into_iter()
            .fold(request, |request, (name, value)| request.metadata(name, value))
            .send()
            .await?;

        Ok(())
    }

    async fn presign_put(&self, request: &PresignedPut) -> StorageResult<PresignedUrl> {
        let presigned_config = PresigningConfig::expires_in(request.expires_in).map_err(|e| {
            StorageError::Presign(format!("Failed to create presigning config: {e}"))
        })?;

        let put_request = self
            .s3_client
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .content_type(&request.content_type);

        let presigned_url = request
            .metadata
            .iter()
            .fold(put_request, |put_request, (name, value)| {
                put_request.metadata(name, value)
            })
            .presigned(presigned_config)
            .await?;

        let expires_at: DateTime<Utc> = Utc::now() + request.expires_in;

        debug!(
            "Generated presigned URL for object: {} expires at: {}",
            request.key, expires_at
        );

        Ok(PresignedUrl {
            url: presigned_url.uri().to_string(),
            expires_at,
        })
    }
}
