//! Handler configuration resolved once at startup

use std::env;
use std::time::Duration;

use thiserror::Error;

use super::Environment;

/// Compatibility default for the thumbnail bucket, development only
const DEV_THUMBNAIL_BUCKET: &str = "photo-share-buck-resized";
/// Compatibility default for the upload bucket, development only
const DEV_UPLOAD_BUCKET: &str = "photo-share-buck";
/// Region used in public object URLs
const DEFAULT_PUBLIC_BUCKET_REGION: &str = "eu-west-1";

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `APP_ENV` holds an unknown value
    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),

    /// A required variable is missing
    #[error("{0} environment variable is not set")]
    MissingVar(&'static str),
}

/// Settings shared by all handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Bucket holding `thumb-` prefixed gallery images
    pub thumbnail_bucket: String,
    /// Bucket receiving original uploads
    pub upload_bucket: String,
    /// Region used to build public object URLs
    pub public_bucket_region: String,
    /// Public API base URL, if configured
    pub api_gateway_url: Option<String>,
    /// Lifetime of presigned upload URLs
    pub presigned_url_expiry: Duration,
}

impl AppConfig {
    /// Reads the configuration from the process environment
    ///
    /// Bucket names fall back to compatibility defaults in development only;
    /// deployed environments must set them explicitly.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingVar` if a bucket variable is missing outside development
    pub fn from_env(environment: &Environment) -> Result<Self, ConfigError> {
        Ok(Self {
            thumbnail_bucket: bucket_var(environment, "THUMBNAIL_BUCKET", DEV_THUMBNAIL_BUCKET)?,
            upload_bucket: bucket_var(environment, "UPLOAD_BUCKET", DEV_UPLOAD_BUCKET)?,
            public_bucket_region: non_empty_var("PUBLIC_BUCKET_REGION")
                .unwrap_or_else(|| DEFAULT_PUBLIC_BUCKET_REGION.to_string()),
            api_gateway_url: non_empty_var("API_GATEWAY_URL"),
            presigned_url_expiry: environment.presigned_url_expiry(),
        })
    }

    /// Public URL of an object in the thumbnail bucket
    #[must_use]
    pub fn public_object_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.thumbnail_bucket, self.public_bucket_region, key
        )
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

fn bucket_var(
    environment: &Environment,
    name: &'static str,
    dev_default: &str,
) -> Result<String, ConfigError> {
    match non_empty_var(name) {
        Some(bucket) => Ok(bucket),
        None if environment.is_deployed() => Err(ConfigError::MissingVar(name)),
        None => {
            tracing::warn!("{name} not set, using development default: {dev_default}");
            Ok(dev_default.to_string())
        }
    }
}
