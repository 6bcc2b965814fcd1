mod config;
mod environment;
mod error;
mod gateway;

pub use config::{AppConfig, ConfigError};
pub use environment::Environment;
pub use error::{AppError, ErrorResponse};
pub use gateway::{
    catch_panic, guarded, GatewayRequest, GatewayResponse, RequestContext, CORS_ALLOW_HEADERS,
    GALLERY_ALLOW_METHODS, IMAGE_ALLOW_METHODS, UPLOAD_ALLOW_METHODS,
};
