//! Upload endpoint limits and forwarding, against the in-memory storage.

mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn uploads_forward_each_file_and_report_metadata() {
    let (router, storage) = common::upload_app(5, 1024);

    let (status, _, body) = common::send(
        router,
        common::multipart_request(
            "/api/upload",
            &[
                ("avatar.png", "image/png", b"fake png bytes"),
                ("resume.pdf", "application/pdf", b"fake pdf bytes"),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let files = body["data"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["fileName"], json!("avatar.png"));
    assert_eq!(files[0]["contentType"], json!("image/png"));
    assert_eq!(files[0]["size"], json!(14));
    assert!(files[0]["url"].as_str().unwrap().starts_with("memory://"));

    assert_eq!(storage.stored().len(), 2);
}

#[tokio::test]
async fn more_files_than_the_limit_is_rejected() {
    let (router, _) = common::upload_app(2, 1024);

    let (status, _, body) = common::send(
        router,
        common::multipart_request(
            "/api/upload",
            &[
                ("a.png", "image/png", b"a"),
                ("b.png", "image/png", b"b"),
                ("c.png", "image/png", b"c"),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("too many files"));
}

#[tokio::test]
async fn oversized_files_are_rejected() {
    let (router, storage) = common::upload_app(5, 8);

    let (status, _, body) = common::send(
        router,
        common::multipart_request(
            "/api/upload",
            &[("big.png", "image/png", b"way more than eight bytes")],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("exceeds"));
    assert!(storage.stored().is_empty());
}

#[tokio::test]
async fn non_image_non_pdf_types_are_rejected() {
    let (router, storage) = common::upload_app(5, 1024);

    let (status, _, body) = common::send(
        router,
        common::multipart_request(
            "/api/upload",
            &[("page.html", "text/html", b"<html></html>")],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("images and PDF only"));
    assert!(storage.stored().is_empty());
}

#[tokio::test]
async fn empty_uploads_are_rejected() {
    let (router, _) = common::upload_app(5, 1024);

    let (status, _, body) =
        common::send(router, common::multipart_request("/api/upload", &[])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("no files"));
}
