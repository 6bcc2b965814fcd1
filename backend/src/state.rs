//! Application state management

use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;

use crate::{
    media_storage::{ObjectStore, S3ObjectStore},
    types::{AppConfig, ConfigError, Environment},
};

/// Dependencies shared across handler invocations
#[derive(Clone)]
pub struct AppState {
    /// Object store client for image operations
    pub store: Arc<dyn ObjectStore>,
    /// Handler configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Creates the state from an object store and configuration
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Builds the state used by the deployed functions: configuration from the
    /// environment and an S3-backed store
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing
    pub async fn from_environment(environment: &Environment) -> Result<Self, ConfigError> {
        let config = AppConfig::from_env(environment)?;
        let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
        Ok(Self::new(Arc::new(S3ObjectStore::new(s3_client)), config))
    }
}
