//! Photo share backend: gallery reader, upload URL issuer and thumbnail generator

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Thumbnail gallery listing and single image retrieval
pub mod gallery;

/// Object store abstraction and its S3 implementation
pub mod media_storage;

/// HTTP routes for running the handlers locally
pub mod routes;

/// Local HTTP server
pub mod server;

/// Application state
pub mod state;

/// Thumbnail generation for new uploads
pub mod thumbnails;

/// Shared types: configuration, environment, gateway shapes and errors
pub mod types;

/// Presigned upload URL issuing
pub mod upload;
