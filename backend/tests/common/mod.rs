// Not every helper is used in every test, so we allow dead code
#![allow(unused_imports, dead_code)]

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, response::Response, Router};
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use photo_share_backend::{
    media_storage::mock::MockObjectStore, routes, state::AppState, types::AppConfig,
};
use tower::ServiceExt;

pub const THUMBNAIL_BUCKET: &str = "photo-share-buck-resized";
pub const UPLOAD_BUCKET: &str = "photo-share-buck";

/// Setup test environment variables and tracing
pub fn setup_test_env() {
    dotenvy::from_path(".env.example").ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Handler configuration pointing at the mock buckets
pub fn test_config() -> AppConfig {
    AppConfig {
        thumbnail_bucket: THUMBNAIL_BUCKET.to_string(),
        upload_bucket: UPLOAD_BUCKET.to_string(),
        public_bucket_region: "eu-west-1".to_string(),
        api_gateway_url: None,
        presigned_url_expiry: Duration::from_secs(3600),
    }
}

/// Router and state backed by an in-memory store
pub struct TestSetup {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MockObjectStore>,
}

impl TestSetup {
    pub fn new() -> Self {
        setup_test_env();

        let store = Arc::new(MockObjectStore::new());
        let state = AppState::new(store.clone(), test_config());
        let router = routes::handler().with_state(state.clone());

        Self {
            router,
            state,
            store,
        }
    }

    /// Adds a thumbnail modified `minute` minutes past a fixed hour
    pub fn insert_thumbnail(&self, key: &str, minute: u32, content_type: Option<&str>) {
        self.store.insert(
            THUMBNAIL_BUCKET,
            key,
            vec![0xFF, 0xD8, 0xFF],
            content_type,
            at_minute(minute),
        );
    }

    pub async fn send_post_request(
        &self,
        route: &str,
        payload: serde_json::Value,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("POST")
            .header("Content-Type", "application/json")
            .body(Body::from(payload.to_string()))?;

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_raw_post_request(
        &self,
        route: &str,
        body: &'static str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("POST")
            .body(Body::from(body))?;

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_get_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }
}

pub fn at_minute(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()
}

/// Parse response body to JSON
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = response_bytes(response).await;
    serde_json::from_slice(&body).unwrap()
}

/// Collect the raw response body
pub async fn response_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Encode a solid colour image in the given format
pub fn generate_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 40, 90])));
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}
