//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};
use tracing::Level;
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

use super::config::ConfigError;

/// Default lifetime of presigned upload URLs
const DEFAULT_PRESIGNED_URL_EXPIRY_SECS: u64 = 60 * 60;

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development {
        /// Optional override for presigned URL expiry in seconds
        presign_expiry_override: Option<u64>,
    },
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// Defaults to development when `APP_ENV` is unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvironment` if `APP_ENV` holds an unknown value
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_or("development")
    }

    /// Creates an Environment for a deployed function
    ///
    /// Defaults to production when `APP_ENV` is unset, so a function never
    /// falls back to `LocalStack` and the development buckets.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvironment` if `APP_ENV` holds an unknown value
    pub fn from_lambda_env() -> Result<Self, ConfigError> {
        Self::from_env_or("production")
    }

    fn from_env_or(default: &str) -> Result<Self, ConfigError> {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| default.to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => {
                let presign_expiry_override = env::var("PRESIGNED_URL_EXPIRY_SECS")
                    .ok()
                    .and_then(|val| val.parse::<u64>().ok());

                Ok(Self::Development {
                    presign_expiry_override,
                })
            }
            _ => Err(ConfigError::InvalidEnvironment(env)),
        }
    }

    /// Whether this is a deployed (production or staging) environment
    #[must_use]
    pub const fn is_deployed(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub const fn override_aws_endpoint_url(&self) -> Option<&str> {
        match self {
            // Regular AWS endpoints for production and staging
            Self::Production | Self::Staging => None,
            // LocalStack endpoint for development
            Self::Development { .. } => Some("http://localhost:4566"),
        }
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let mut config_builder = aws_config::load_defaults(BehaviorVersion::latest())
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        config_builder.build()
    }

    /// AWS S3 service configuration
    pub async fn s3_client_config(&self) -> aws_sdk_s3::Config {
        let aws_config = self.aws_config().await;
        let s3_config: aws_sdk_s3::Config = (&aws_config).into();
        let mut builder = s3_config.to_builder();

        // Override "force path style" to true for compatibility with LocalStack
        // https://github.com/awslabs/aws-sdk-rust/discussions/874
        if matches!(self, Self::Development { .. }) {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }

    /// Presigned URL expiry time
    #[must_use]
    pub fn presigned_url_expiry(&self) -> Duration {
        let secs = match self {
            Self::Production | Self::Staging => DEFAULT_PRESIGNED_URL_EXPIRY_SECS,
            Self::Development {
                presign_expiry_override,
            } => presign_expiry_override.unwrap_or(DEFAULT_PRESIGNED_URL_EXPIRY_SECS),
        };
        Duration::from_secs(secs)
    }

    /// Default log level when `RUST_LOG` is not set
    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production | Self::Staging => Level::INFO,
                Self::Development { .. } => Level::DEBUG,
            })
    }

    /// Installs the global tracing subscriber
    ///
    /// Uses JSON output for staging/production and the regular format for development.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.tracing_level()).into())
            .from_env_lossy();

        if self.is_deployed() {
            fmt().json().with_env_filter(filter).init();
        } else {
            fmt().with_env_filter(filter).init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_environment_from_env() {
        // Test development (default)
        env::remove_var("APP_ENV");
        env::remove_var("PRESIGNED_URL_EXPIRY_SECS");
        assert_eq!(
            Environment::from_env().unwrap(),
            Environment::Development {
                presign_expiry_override: None
            }
        );

        env::set_var("APP_ENV", " Staging ");
        assert_eq!(Environment::from_env().unwrap(), Environment::Staging);

        env::set_var("APP_ENV", "production");
        assert_eq!(Environment::from_env().unwrap(), Environment::Production);

        env::remove_var("APP_ENV");
    }

    #[test]
    #[serial]
    fn test_lambda_environment_defaults_to_production() {
        env::remove_var("APP_ENV");
        let environment = Environment::from_lambda_env().unwrap();
        assert_eq!(environment, Environment::Production);
        assert_eq!(environment.override_aws_endpoint_url(), None);

        env::set_var("APP_ENV", "development");
        assert_eq!(
            Environment::from_lambda_env().unwrap(),
            Environment::Development {
                presign_expiry_override: None
            }
        );

        env::set_var("APP_ENV", "staging");
        assert_eq!(Environment::from_lambda_env().unwrap(), Environment::Staging);

        env::remove_var("APP_ENV");
    }

    #[test]
    #[serial]
    fn test_invalid_environment() {
        env::set_var("APP_ENV", "invalid");
        let err = Environment::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvironment(ref v) if v == "invalid"));
        env::remove_var("APP_ENV");
    }

    #[test]
    fn test_presigned_url_expiry() {
        let env = Environment::Development {
            presign_expiry_override: None,
        };
        assert_eq!(env.presigned_url_expiry(), Duration::from_secs(3600));

        let env = Environment::Development {
            presign_expiry_override: Some(30),
        };
        assert_eq!(env.presigned_url_expiry(), Duration::from_secs(30));

        assert_eq!(
            Environment::Production.presigned_url_expiry(),
            Duration::from_secs(3600)
        );
    }

    #[test]
    #[serial]
    fn test_development_with_invalid_override_falls_back() {
        env::set_var("APP_ENV", "development");
        env::set_var("PRESIGNED_URL_EXPIRY_SECS", "soon");

        let env = Environment::from_env().unwrap();
        assert_eq!(env.presigned_url_expiry(), Duration::from_secs(3600));

        env::remove_var("PRESIGNED_URL_EXPIRY_SECS");
        env::remove_var("APP_ENV");
    }

    #[test]
    fn test_only_development_targets_localstack() {
        assert_eq!(Environment::Production.override_aws_endpoint_url(), None);
        assert_eq!(
            Environment::Development {
                presign_expiry_override: None
            }
            .override_aws_endpoint_url(),
            Some("http://localhost:4566")
        );
    }
}
