mod common;

use common::*;
use http::StatusCode;
use photo_share_backend::{
    media_storage::StorageError,
    types::{GatewayRequest, UPLOAD_ALLOW_METHODS},
    upload,
};
use pretty_assertions::assert_eq;
use regex::Regex;
use serde_json::json;

pub fn create_upload_request(filename: &str, content_type: &str) -> serde_json::Value {
    json!({
        "filename": filename,
        "contentType": content_type
    })
}

// Happy path tests

#[tokio::test]
async fn test_upload_url_happy_path() {
    let setup = TestSetup::new();

    let response = setup
        .send_post_request("/upload", create_upload_request("a.png", "image/png"))
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["Access-Control-Allow-Methods"],
        UPLOAD_ALLOW_METHODS
    );

    let body = parse_response_body(response).await;
    let filename = body["filename"].as_str().unwrap();
    assert!(Regex::new(r"^a_[0-9a-f]{8}\.png$").unwrap().is_match(filename));
    assert_eq!(body["originalFilename"], "a.png");
    assert!(body["uploadUrl"]
        .as_str()
        .unwrap()
        .starts_with(&format!("https://{UPLOAD_BUCKET}.s3.localhost/{filename}")));

    let signed = setup.store.presigned_requests();
    assert_eq!(signed.len(), 1);
    assert_eq!(signed[0].bucket, UPLOAD_BUCKET);
    assert_eq!(signed[0].content_type, "image/png");
    assert_eq!(signed[0].metadata["original-filename"], "a.png");
    assert!(signed[0].metadata.contains_key("upload-timestamp"));
}

#[tokio::test]
async fn test_upload_url_sanitizes_filename() {
    let setup = TestSetup::new();

    let response = setup
        .send_post_request(
            "/upload",
            create_upload_request("weird name!.png", "image/png"),
        )
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    let filename = body["filename"].as_str().unwrap();
    assert!(
        Regex::new(r"^weird_name__[0-9a-f]{8}\.png$")
            .unwrap()
            .is_match(filename),
        "{filename}"
    );
    assert_eq!(body["originalFilename"], "weird name!.png");
}

#[tokio::test]
async fn test_upload_url_defaults() {
    let setup = TestSetup::new();

    let response = setup
        .send_post_request("/upload", json!({}))
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    let original = body["originalFilename"].as_str().unwrap();
    assert!(Regex::new(r"^image-[0-9a-f-]{36}\.jpg$").unwrap().is_match(original));
    assert_eq!(setup.store.presigned_requests()[0].content_type, "image/jpeg");
}

#[tokio::test]
async fn test_same_filename_gets_distinct_keys() {
    let setup = TestSetup::new();
    let mut filenames = Vec::new();

    for _ in 0..2 {
        let response = setup
            .send_post_request("/upload", create_upload_request("a.png", "image/png"))
            .await
            .expect("Failed to send request");
        let body = parse_response_body(response).await;
        filenames.push(body["filename"].as_str().unwrap().to_string());
    }

    assert_ne!(filenames[0], filenames[1]);
}

#[tokio::test]
async fn test_upload_url_accepts_every_image_type() {
    let setup = TestSetup::new();

    for content_type in upload::ALLOWED_UPLOAD_TYPES {
        let response = setup
            .send_post_request("/upload", create_upload_request("a.img", content_type))
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::OK, "{content_type}");
    }
}

// Validation tests

#[tokio::test]
async fn test_upload_url_rejects_non_image_type() {
    let setup = TestSetup::new();

    let response = setup
        .send_post_request("/upload", create_upload_request("page.html", "text/html"))
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()["Access-Control-Allow-Methods"],
        UPLOAD_ALLOW_METHODS
    );
    let body = parse_response_body(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Validation error: "));
    assert!(error.contains("text/html"));
    assert_eq!(body["statusCode"], 400);
    assert!(setup.store.presigned_requests().is_empty());
}

#[tokio::test]
async fn test_upload_url_rejects_malformed_body() {
    let setup = TestSetup::new();

    let response = setup
        .send_raw_post_request("/upload", "{not json")
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Validation error: "));
}

// Store failures

#[tokio::test]
async fn test_upload_url_store_errors() {
    let setup = TestSetup::new();
    setup
        .store
        .fail_with(StorageError::from_code("AccessDenied", "signing refused"));

    let response = setup
        .send_post_request("/upload", create_upload_request("a.png", "image/png"))
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "AWS service error: AccessDenied: signing refused");

    let setup = TestSetup::new();
    setup
        .store
        .fail_with(StorageError::Presign("expiry out of range".to_string()));

    let response = setup
        .send_post_request("/upload", create_upload_request("a.png", "image/png"))
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = parse_response_body(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Internal server error: "));
}

// Direct handler invocation, as the deployed function receives it

#[tokio::test]
async fn test_handle_raw_event_without_body() {
    let setup = TestSetup::new();
    let request: GatewayRequest = serde_json::from_value(json!({
        "filename": "direct.webp",
        "contentType": "image/webp"
    }))
    .unwrap();

    let response = upload::handle(&setup.state, request).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["originalFilename"], "direct.webp");
    assert_eq!(setup.store.presigned_requests()[0].content_type, "image/webp");
}

#[tokio::test]
async fn test_handle_malformed_event_returns_error_body() {
    let setup = TestSetup::new();

    for event in [
        json!({"httpMethod": "POST", "path": null}),
        json!({"httpMethod": "POST", "body": {"filename": "a.png"}}),
    ] {
        let response = upload::handle_event(&setup.state, event.clone()).await;

        assert_eq!(response.status_code, 500, "{event}");
        assert_eq!(
            response.header("Access-Control-Allow-Methods"),
            Some(UPLOAD_ALLOW_METHODS)
        );
        let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(
            body,
            json!({"error": "Internal server error", "statusCode": 500})
        );
    }
    assert!(setup.store.presigned_requests().is_empty());
}

#[tokio::test]
async fn test_handle_event_issues_url() {
    let setup = TestSetup::new();

    let response = upload::handle_event(
        &setup.state,
        json!({"httpMethod": "POST", "body": r#"{"filename":"a.png","contentType":"image/png"}"#}),
    )
    .await;

    assert_eq!(response.status_code, 200);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["originalFilename"], "a.png");
}
